/// Adjusted exponential mean: every observation so far is weighted by
/// `(1 - alpha)^age` and the weights are renormalized, so the value is
/// defined from the first price on.
#[derive(Debug, Clone)]
pub struct EMA {
    decay: f64,
    weighted_sum: f64,
    weight_total: f64,
}

impl EMA {
    pub fn new(period: usize) -> Self {
        let alpha = 2.0 / (period as f64 + 1.0);
        Self {
            decay: 1.0 - alpha,
            weighted_sum: 0.0,
            weight_total: 0.0,
        }
    }

    pub fn update(&mut self, price: f64) -> f64 {
        self.weighted_sum = price + self.decay * self.weighted_sum;
        self.weight_total = 1.0 + self.decay * self.weight_total;
        self.weighted_sum / self.weight_total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ema_series(prices: &[f64], period: usize) -> Vec<f64> {
        let mut ema = EMA::new(period);
        prices.iter().map(|p| ema.update(*p)).collect()
    }

    #[test]
    fn test_ema_first_value_is_price() {
        let mut ema = EMA::new(14);
        assert_eq!(ema.update(42.0), 42.0);
    }

    #[test]
    fn test_ema_adjusted_weights() {
        // span 3 => alpha 0.5; second value = (2 + 0.5 * 1) / (1 + 0.5)
        let series = ema_series(&[1.0, 2.0, 3.0], 3);
        assert!((series[1] - 2.5 / 1.5).abs() < 1e-12);
        // third = (3 + 0.5*2 + 0.25*1) / (1 + 0.5 + 0.25)
        assert!((series[2] - 4.25 / 1.75).abs() < 1e-12);
    }

    #[test]
    fn test_ema_constant_series() {
        let series = ema_series(&[5.0; 30], 14);
        assert!(series.iter().all(|v| (v - 5.0).abs() < 1e-12));
    }
}
