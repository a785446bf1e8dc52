use super::ema::EMA;

#[derive(Debug, Clone)]
pub struct MACD {
    fast_ema: EMA,
    slow_ema: EMA,
    signal_ema: EMA,
}

impl MACD {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        Self {
            fast_ema: EMA::new(fast_period),
            slow_ema: EMA::new(slow_period),
            signal_ema: EMA::new(signal_period),
        }
    }

    pub fn default_params() -> Self {
        Self::new(12, 26, 9)
    }

    pub fn update(&mut self, price: f64) -> MACDOutput {
        let macd_line = self.fast_ema.update(price) - self.slow_ema.update(price);
        let signal_line = self.signal_ema.update(macd_line);
        MACDOutput {
            macd_line,
            signal_line,
            histogram: macd_line - signal_line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MACDOutput {
    pub macd_line: f64,
    pub signal_line: f64,
    pub histogram: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macd_flat_prices() {
        let mut macd = MACD::default_params();
        let mut last = None;
        for _ in 0..40 {
            last = Some(macd.update(100.0));
        }
        let out = last.unwrap();
        assert!(out.macd_line.abs() < 1e-9);
        assert!(out.histogram.abs() < 1e-9);
    }

    #[test]
    fn test_macd_histogram_identity() {
        let mut macd = MACD::default_params();
        for i in 0..60 {
            let out = macd.update(100.0 + (i as f64 / 4.0).sin() * 5.0);
            assert!((out.histogram - (out.macd_line - out.signal_line)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_macd_uptrend_is_positive() {
        let mut macd = MACD::default_params();
        let mut out = None;
        for i in 0..60 {
            out = Some(macd.update(100.0 + i as f64));
        }
        assert!(out.unwrap().macd_line > 0.0);
    }
}
