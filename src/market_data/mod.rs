pub mod yahoo;

pub use yahoo::*;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::types::PriceHistory;

#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected status {status} for {ticker}")]
    Status { ticker: String, status: u16 },

    #[error("malformed payload: {0}")]
    Malformed(String),

    #[error("invalid base URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Upstream source of daily bars.
///
/// An unknown or delisted ticker is an empty history, not an error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_daily(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceHistory, MarketDataError>;
}
