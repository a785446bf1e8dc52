use super::RollingWindow;

/// Cheap stand-in for the ADX family: the bar's high-low range relative to
/// its close, raw day-over-day high/low moves, and a rolling mean of the
/// range ratio.
#[derive(Debug, Clone)]
pub struct DirectionalProxy {
    ratios: RollingWindow,
    prev_high: Option<f64>,
    prev_low: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalOutput {
    pub range_ratio: f64,
    pub plus_move: Option<f64>,
    pub minus_move: Option<f64>,
    pub range_ratio_avg: Option<f64>,
}

impl DirectionalProxy {
    pub fn new(period: usize) -> Self {
        Self {
            ratios: RollingWindow::new(period),
            prev_high: None,
            prev_low: None,
        }
    }

    pub fn update(&mut self, high: f64, low: f64, close: f64) -> DirectionalOutput {
        let range_ratio = (high - low) / close;
        let plus_move = self.prev_high.map(|prev| high - prev);
        let minus_move = self.prev_low.map(|prev| prev - low);

        self.prev_high = Some(high);
        self.prev_low = Some(low);
        self.ratios.push(range_ratio);

        DirectionalOutput {
            range_ratio,
            plus_move,
            minus_move,
            range_ratio_avg: self.ratios.mean(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directional_moves() {
        let mut dm = DirectionalProxy::new(2);
        let first = dm.update(11.0, 9.0, 10.0);
        assert_eq!(first.range_ratio, 0.2);
        assert_eq!(first.plus_move, None);
        assert_eq!(first.range_ratio_avg, None);

        let second = dm.update(12.0, 10.0, 10.0);
        assert_eq!(second.plus_move, Some(1.0));
        assert_eq!(second.minus_move, Some(-1.0));
        assert_eq!(second.range_ratio_avg, Some(0.2));
    }
}
