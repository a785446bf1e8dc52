pub mod column;
pub mod registry;
pub mod table;

pub use column::*;
pub use registry::*;
pub use table::*;

use chrono::{NaiveDate, Utc};
use tracing::{info, warn};

use crate::error::ForecastError;
use crate::market_data::MarketDataSource;

/// Fetches daily bars from `start_date` through today and turns them into a
/// feature table.
pub async fn build_features(
    source: &dyn MarketDataSource,
    ticker: &str,
    start_date: NaiveDate,
) -> Result<FeatureTable, ForecastError> {
    let today = Utc::now().date_naive();
    let history = source.fetch_daily(ticker, start_date, today).await?.normalize();

    if history.is_empty() {
        warn!("No price history for {} since {}", ticker, start_date);
        return Err(ForecastError::DataUnavailable(ticker.to_string()));
    }

    match FeatureTable::from_history(&history) {
        Some(table) => {
            info!(
                "Built {} feature rows for {} through {:?} ({} bars fetched)",
                table.len(),
                ticker,
                table.last_date(),
                history.len()
            );
            Ok(table)
        }
        None => {
            warn!(
                "{} bars for {} (last {:?}) do not cover the {}-bar indicator warm-up",
                history.len(),
                ticker,
                history.last().map(|b| b.date),
                WARMUP_BARS
            );
            Err(ForecastError::DataUnavailable(ticker.to_string()))
        }
    }
}
