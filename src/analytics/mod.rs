pub mod advisor;

pub use advisor::*;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ForecastError;
use crate::features::FeatureColumn;
use crate::forecast::ForecastEngine;

/// Rounds to `decimals` places for presentation.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Percentage change from `from` to `to`.
pub fn percent_change(from: f64, to: f64) -> f64 {
    (to / from - 1.0) * 100.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSeries {
    pub ticker: String,
    pub dates: Vec<NaiveDate>,
    pub prices: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketMover {
    pub ticker: String,
    pub price: f64,
    /// Day-over-day change in percent.
    pub change: f64,
    pub trend: Trend,
}

/// Closing prices of the most recent `days` feature rows.
pub async fn price_history(
    engine: &ForecastEngine,
    ticker: &str,
    days: usize,
) -> Result<PriceSeries, ForecastError> {
    let table = engine.features(ticker).await?.tail(days);
    Ok(PriceSeries {
        ticker: ticker.to_string(),
        dates: table.dates().to_vec(),
        prices: table.column(FeatureColumn::Close).to_vec(),
    })
}

/// Last close and daily change for each ticker. Tickers that cannot be
/// loaded, or have fewer than two rows, are left out.
pub async fn market_summary<S: AsRef<str>>(
    engine: &ForecastEngine,
    tickers: &[S],
) -> Vec<MarketMover> {
    let mut movers = Vec::with_capacity(tickers.len());

    for ticker in tickers {
        let ticker = ticker.as_ref();
        let table = match engine.features(ticker).await {
            Ok(table) => table,
            Err(e) => {
                warn!("Skipping {} in market summary: {}", ticker, e);
                continue;
            }
        };
        if table.len() < 2 {
            debug!("Skipping {}: only {} rows", ticker, table.len());
            continue;
        }

        let closes = table.column(FeatureColumn::Close);
        let last = closes[closes.len() - 1];
        let prev = closes[closes.len() - 2];
        let change = percent_change(prev, last);

        movers.push(MarketMover {
            ticker: ticker.to_string(),
            price: round_to(last, 2),
            change: round_to(change, 2),
            trend: if change > 0.0 { Trend::Up } else { Trend::Down },
        });
    }

    movers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForecastSettings;
    use crate::market_data::{MarketDataError, MockMarketDataSource};
    use crate::types::synthetic_history;
    use std::sync::Arc;

    fn engine() -> ForecastEngine {
        let mut source = MockMarketDataSource::new();
        source.expect_fetch_daily().returning(|t, _, _| match t {
            "DOWN" => Err(MarketDataError::Malformed("no quote block".to_string())),
            "TINY" => Ok(synthetic_history(t, 50)),
            _ => Ok(synthetic_history(t, 120)),
        });
        ForecastEngine::new(Arc::new(source), ForecastSettings::default())
    }

    #[test]
    fn test_rounding_helpers() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(0.0125, 3), 0.013);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert!((percent_change(100.0, 103.0) - 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_price_history_returns_last_days() {
        let engine = engine();
        let series = price_history(&engine, "AAPL", 30).await.unwrap();
        let table = engine.features("AAPL").await.unwrap();

        assert_eq!(series.dates.len(), 30);
        assert_eq!(series.prices.len(), 30);
        assert_eq!(series.dates.last(), table.last_date().as_ref());
        assert_eq!(
            series.prices.last().copied(),
            table.last_value(FeatureColumn::Close)
        );
    }

    #[tokio::test]
    async fn test_market_summary_skips_failures() {
        let engine = engine();
        let movers = market_summary(&engine, &["AAPL", "DOWN", "TINY", "MSFT"]).await;
        let tickers: Vec<&str> = movers.iter().map(|m| m.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["AAPL", "MSFT"]);

        let table = engine.features("AAPL").await.unwrap();
        let closes = table.column(FeatureColumn::Close);
        let n = closes.len();
        let change = percent_change(closes[n - 2], closes[n - 1]);
        assert_eq!(movers[0].change, round_to(change, 2));
        assert_eq!(movers[0].trend == Trend::Up, change > 0.0);
    }
}
