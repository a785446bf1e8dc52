use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily OHLCV bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar {
    pub fn is_complete(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Daily bars for one ticker, ascending by date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceHistory {
    pub ticker: String,
    pub bars: Vec<PriceBar>,
}

impl PriceHistory {
    pub fn new(ticker: impl Into<String>, bars: Vec<PriceBar>) -> Self {
        Self {
            ticker: ticker.into(),
            bars,
        }
    }

    pub fn empty(ticker: impl Into<String>) -> Self {
        Self::new(ticker, Vec::new())
    }

    /// Sorts by date, drops incomplete bars and keeps the first bar of any
    /// repeated date.
    pub fn normalize(mut self) -> Self {
        self.bars.retain(PriceBar::is_complete);
        self.bars.sort_by_key(|b| b.date);
        self.bars.dedup_by_key(|b| b.date);
        self
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}

/// Deterministic wavy price series used across the test modules.
#[cfg(test)]
pub(crate) fn synthetic_history(ticker: &str, n: usize) -> PriceHistory {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
    let bars = (0..n)
        .map(|i| {
            let t = i as f64;
            let close = 100.0 + 10.0 * (t / 7.0).sin() + 0.15 * t + 1.5 * (t / 2.3).cos();
            let open = close - 0.8 * (t / 3.0).sin();
            let high = close.max(open) + 1.0 + 0.3 * (t / 5.0).cos().abs();
            let low = close.min(open) - 1.0 - 0.2 * (t / 4.0).sin().abs();
            PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open,
                high,
                low,
                close,
                volume: 1_000_000.0 + 25_000.0 * (i % 13) as f64,
            }
        })
        .collect();
    PriceHistory::new(ticker, bars)
}
