use super::RollingWindow;

/// Stochastic oscillator: %K over `k_period` bars, %D as the `d_period`
/// mean of %K. A flat high/low range reads as 50.
#[derive(Debug, Clone)]
pub struct Stochastic {
    highs: RollingWindow,
    lows: RollingWindow,
    k_values: RollingWindow,
}

impl Stochastic {
    pub fn new(k_period: usize, d_period: usize) -> Self {
        Self {
            highs: RollingWindow::new(k_period),
            lows: RollingWindow::new(k_period),
            k_values: RollingWindow::new(d_period),
        }
    }

    pub fn default_params() -> Self {
        Self::new(14, 3)
    }

    /// Returns `(k, d)`; `d` stays `None` until enough %K values exist.
    pub fn update(&mut self, high: f64, low: f64, close: f64) -> (Option<f64>, Option<f64>) {
        self.highs.push(high);
        self.lows.push(low);

        let (highest, lowest) = match (self.highs.max(), self.lows.min()) {
            (Some(h), Some(l)) => (h, l),
            _ => return (None, None),
        };

        let range = highest - lowest;
        let k = if range == 0.0 {
            50.0
        } else {
            100.0 * (close - lowest) / range
        };

        self.k_values.push(k);
        (Some(k), self.k_values.mean())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stochastic_warmup_and_range() {
        let mut stoch = Stochastic::default_params();
        for i in 0..13 {
            assert_eq!(stoch.update(101.0 + i as f64, 99.0, 100.0), (None, None));
        }
        let (k, d) = stoch.update(120.0, 99.0, 120.0);
        assert_eq!(k, Some(100.0));
        assert_eq!(d, None);
        stoch.update(120.0, 99.0, 99.0);
        let (k, d) = stoch.update(120.0, 99.0, 109.5);
        assert_eq!(k, Some(50.0));
        assert_eq!(d, Some(50.0));
    }

    #[test]
    fn test_flat_range_is_midpoint() {
        let mut stoch = Stochastic::new(3, 1);
        stoch.update(10.0, 10.0, 10.0);
        stoch.update(10.0, 10.0, 10.0);
        assert_eq!(stoch.update(10.0, 10.0, 10.0), (Some(50.0), Some(50.0)));
    }
}
