use super::RollingWindow;

#[derive(Debug, Clone)]
pub struct BollingerBands {
    std_dev_multiplier: f64,
    window: RollingWindow,
}

impl BollingerBands {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Self {
        Self {
            std_dev_multiplier,
            window: RollingWindow::new(period),
        }
    }

    pub fn default_params() -> Self {
        Self::new(20, 2.0)
    }

    pub fn update(&mut self, price: f64) -> Option<BollingerOutput> {
        self.window.push(price);

        let (middle, std_dev) = match (self.window.mean(), self.window.std()) {
            (Some(m), Some(s)) => (m, s),
            _ => return None,
        };

        let deviation = std_dev * self.std_dev_multiplier;
        Some(BollingerOutput {
            upper: middle + deviation,
            middle,
            lower: middle - deviation,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerOutput {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}
