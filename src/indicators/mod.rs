pub mod ema;
pub mod rsi;
pub mod macd;
pub mod bollinger;
pub mod atr;
pub mod volume;
pub mod stochastic;
pub mod directional;

pub use ema::*;
pub use rsi::*;
pub use macd::*;
pub use bollinger::*;
pub use atr::*;
pub use volume::*;
pub use stochastic::*;
pub use directional::*;

use std::collections::VecDeque;

/// A per-bar indicator output; `None` while the indicator is warming up.
pub type Series = Vec<Option<f64>>;

/// Fixed-length window over the most recent values.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    period: usize,
    values: VecDeque<f64>,
}

impl RollingWindow {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            values: VecDeque::with_capacity(period + 1),
        }
    }

    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
        if self.values.len() > self.period {
            self.values.pop_front();
        }
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.period
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn mean(&self) -> Option<f64> {
        if !self.is_full() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.period as f64)
    }

    /// Sample standard deviation (n - 1 denominator).
    pub fn std(&self) -> Option<f64> {
        if !self.is_full() || self.period < 2 {
            return None;
        }
        let mean = self.mean()?;
        let sum_sq: f64 = self.values.iter().map(|v| (v - mean).powi(2)).sum();
        Some((sum_sq / (self.period - 1) as f64).sqrt())
    }

    pub fn min(&self) -> Option<f64> {
        if !self.is_full() {
            return None;
        }
        self.values.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        if !self.is_full() {
            return None;
        }
        self.values.iter().copied().reduce(f64::max)
    }
}

/// `values[i] - values[i - period]`.
pub fn diff(values: &[f64], period: usize) -> Series {
    (0..values.len())
        .map(|i| (i >= period).then(|| values[i] - values[i - period]))
        .collect()
}

/// Value from `period` bars back.
pub fn shift(values: &[f64], period: usize) -> Series {
    (0..values.len())
        .map(|i| (i >= period).then(|| values[i - period]))
        .collect()
}

/// One-bar percent change as a fraction.
pub fn pct_change(values: &[f64]) -> Series {
    (0..values.len())
        .map(|i| {
            if i == 0 || values[i - 1] == 0.0 {
                None
            } else {
                Some(values[i] / values[i - 1] - 1.0)
            }
        })
        .collect()
}

/// Rolling mean over a series that may contain gaps; a window touching a
/// gap is undefined.
pub fn rolling_mean(values: &[Option<f64>], period: usize) -> Series {
    let mut window = RollingWindow::new(period);
    values
        .iter()
        .map(|v| match v {
            Some(x) => {
                window.push(*x);
                window.mean()
            }
            None => {
                window.clear();
                None
            }
        })
        .collect()
}

pub fn rolling_std(values: &[f64], period: usize) -> Series {
    let mut window = RollingWindow::new(period);
    values
        .iter()
        .map(|v| {
            window.push(*v);
            window.std()
        })
        .collect()
}

pub fn sma(values: &[f64], period: usize) -> Series {
    let wrapped: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    rolling_mean(&wrapped, period)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_window_stats() {
        let mut w = RollingWindow::new(3);
        w.push(1.0);
        w.push(2.0);
        assert_eq!(w.mean(), None);
        w.push(3.0);
        assert_eq!(w.mean(), Some(2.0));
        assert_eq!(w.std(), Some(1.0));
        w.push(7.0);
        assert_eq!(w.min(), Some(2.0));
        assert_eq!(w.max(), Some(7.0));
        assert_eq!(w.mean(), Some(4.0));
    }

    #[test]
    fn test_diff_shift_pct_change() {
        let v = [10.0, 11.0, 13.0, 12.0];
        assert_eq!(diff(&v, 1), vec![None, Some(1.0), Some(2.0), Some(-1.0)]);
        assert_eq!(diff(&v, 2), vec![None, None, Some(3.0), Some(1.0)]);
        assert_eq!(shift(&v, 1), vec![None, Some(10.0), Some(11.0), Some(13.0)]);
        let pct = pct_change(&v);
        assert_eq!(pct[0], None);
        assert!((pct[1].unwrap() - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_rolling_mean_restarts_after_gap() {
        let v = [Some(1.0), Some(2.0), None, Some(4.0), Some(6.0)];
        assert_eq!(rolling_mean(&v, 2), vec![None, Some(1.5), None, None, Some(5.0)]);
    }

    #[test]
    fn test_sma() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(sma(&v, 2), vec![None, Some(1.5), Some(2.5), Some(3.5)]);
    }
}
