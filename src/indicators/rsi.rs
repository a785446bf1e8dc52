use serde::Serialize;

use super::RollingWindow;

/// RSI from simple rolling means of gains and losses.
///
/// The first bar has no prior close and counts as a zero change. When the
/// average loss over the window is zero the RSI is 100.
#[derive(Debug, Clone)]
pub struct RSI {
    gains: RollingWindow,
    losses: RollingWindow,
    prev_price: Option<f64>,
}

impl RSI {
    pub fn new(period: usize) -> Self {
        Self {
            gains: RollingWindow::new(period),
            losses: RollingWindow::new(period),
            prev_price: None,
        }
    }

    pub fn update(&mut self, price: f64) -> Option<f64> {
        let change = self.prev_price.map(|prev| price - prev).unwrap_or(0.0);
        self.gains.push(change.max(0.0));
        self.losses.push((-change).max(0.0));
        self.prev_price = Some(price);

        match (self.gains.mean(), self.losses.mean()) {
            (Some(avg_gain), Some(avg_loss)) => Some(calculate_rsi(avg_gain, avg_loss)),
            _ => None,
        }
    }
}

fn calculate_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RSIZone {
    Oversold,
    BearishNeutral,
    BullishNeutral,
    Overbought,
}

impl RSIZone {
    pub fn from_value(v: f64) -> Self {
        if v < 30.0 {
            RSIZone::Oversold
        } else if v > 70.0 {
            RSIZone::Overbought
        } else if v < 50.0 {
            RSIZone::BearishNeutral
        } else {
            RSIZone::BullishNeutral
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calculate_rsi_series(prices: &[f64], period: usize) -> Vec<Option<f64>> {
        let mut rsi = RSI::new(period);
        prices.iter().map(|p| rsi.update(*p)).collect()
    }

    #[test]
    fn test_rsi_warmup() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + (i % 3) as f64).collect();
        let series = calculate_rsi_series(&prices, 14);
        assert!(series[..13].iter().all(Option::is_none));
        assert!(series[13..].iter().all(Option::is_some));
    }

    #[test]
    fn test_rsi_all_gains_is_100() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi_series(&prices, 14);
        assert_eq!(series[19], Some(100.0));
    }

    #[test]
    fn test_rsi_flat_prices_is_100() {
        let series = calculate_rsi_series(&[50.0; 20], 14);
        assert_eq!(series[19], Some(100.0));
    }

    #[test]
    fn test_rsi_bounds() {
        let prices: Vec<f64> = (0..200)
            .map(|i| 100.0 + 15.0 * ((i as f64) / 5.0).sin() - 0.05 * i as f64)
            .collect();
        for v in calculate_rsi_series(&prices, 14).into_iter().flatten() {
            assert!((0.0..=100.0).contains(&v), "rsi out of range: {}", v);
        }
    }

    #[test]
    fn test_rsi_zone() {
        assert_eq!(RSIZone::from_value(25.0), RSIZone::Oversold);
        assert_eq!(RSIZone::from_value(80.0), RSIZone::Overbought);
        assert_eq!(RSIZone::from_value(45.0), RSIZone::BearishNeutral);
        assert_eq!(RSIZone::from_value(50.0), RSIZone::BullishNeutral);
        assert_eq!(RSIZone::from_value(70.0), RSIZone::BullishNeutral);
    }
}
