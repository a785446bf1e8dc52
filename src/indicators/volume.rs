/// On-balance volume. The first bar and unchanged closes add nothing.
#[derive(Debug, Clone)]
pub struct OBV {
    value: f64,
    prev_close: Option<f64>,
}

impl OBV {
    pub fn new() -> Self {
        Self {
            value: 0.0,
            prev_close: None,
        }
    }

    pub fn update(&mut self, close: f64, volume: f64) -> f64 {
        if let Some(prev) = self.prev_close {
            if close > prev {
                self.value += volume;
            } else if close < prev {
                self.value -= volume;
            }
        }
        self.prev_close = Some(close);
        self.value
    }
}

impl Default for OBV {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obv_direction() {
        let mut obv = OBV::new();
        assert_eq!(obv.update(10.0, 100.0), 0.0);
        assert_eq!(obv.update(11.0, 50.0), 50.0);
        assert_eq!(obv.update(11.0, 70.0), 50.0);
        assert_eq!(obv.update(9.0, 20.0), 30.0);
    }
}
