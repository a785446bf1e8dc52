//! Stock price forecasting core: technical indicator features built from daily
//! bars, and per-request regressors that project the closing price forward.

pub mod analytics;
pub mod config;
pub mod error;
pub mod features;
pub mod forecast;
pub mod indicators;
pub mod market_data;
pub mod ml;
pub mod types;

pub use error::{FailureKind, ForecastError};
pub use forecast::{BacktestRecord, ForecastEngine, ForecastResult};
