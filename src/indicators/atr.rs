use super::RollingWindow;

/// Average true range as a simple rolling mean of the true range.
#[derive(Debug, Clone)]
pub struct ATR {
    prev_close: Option<f64>,
    true_ranges: RollingWindow,
}

impl ATR {
    pub fn new(period: usize) -> Self {
        Self {
            prev_close: None,
            true_ranges: RollingWindow::new(period),
        }
    }

    pub fn update(&mut self, high: f64, low: f64, close: f64) -> Option<f64> {
        let tr = self.calculate_true_range(high, low);
        self.prev_close = Some(close);
        self.true_ranges.push(tr);
        self.true_ranges.mean()
    }

    fn calculate_true_range(&self, high: f64, low: f64) -> f64 {
        let hl = high - low;

        match self.prev_close {
            Some(prev_close) => {
                let hc = (high - prev_close).abs();
                let lc = (low - prev_close).abs();
                hl.max(hc).max(lc)
            }
            None => hl,
        }
    }
}
