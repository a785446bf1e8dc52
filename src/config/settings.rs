use ::config::{Config, Environment, File};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::market_data::YAHOO_CHART_API;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("invalid configuration: {}", .0.join(", "))]
    Invalid(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub market_data: MarketDataSettings,
    pub forecast: ForecastSettings,
    /// Tickers shown by the market summary.
    pub watchlist: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            market_data: MarketDataSettings::default(),
            forecast: ForecastSettings::default(),
            watchlist: [
                "AAPL", "GOOG", "MSFT", "AMZN", "TSLA", "AMD", "CSCO", "ADBE", "PYPL", "NVDA",
                "NFLX", "INTC", "ORCL", "IBM", "CRM", "QCOM", "TXN", "AVGO", "MU", "LRCX",
                "NOW", "ZM", "DOCU", "SNOW", "UBER", "LYFT", "SPOT", "SQ", "SHOP", "ETSY",
            ]
            .iter()
            .map(|t| t.to_string())
            .collect(),
        }
    }
}

impl Settings {
    /// Layers built-in defaults, an optional TOML file and `FINTAP__*`
    /// environment variables, in that order.
    pub fn load(path: Option<&str>) -> Result<Self, SettingsError> {
        let defaults = Config::try_from(&Settings::default())?;

        let cfg = Config::builder()
            .add_source(defaults)
            .add_source(File::with_name(path.unwrap_or("fintap")).required(path.is_some()))
            .add_source(
                Environment::with_prefix("FINTAP")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("watchlist")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = cfg.try_deserialize()?;
        settings.validate().map_err(SettingsError::Invalid)?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.market_data.base_url.trim().is_empty() {
            errors.push("market_data.base_url must not be empty".to_string());
        }
        if self.market_data.requests_per_second == 0 {
            errors.push("market_data.requests_per_second must be > 0".to_string());
        }

        if self.forecast.horizon_days == 0 {
            errors.push("forecast.horizon_days must be > 0".to_string());
        }
        if !(self.forecast.holdout_fraction > 0.0 && self.forecast.holdout_fraction < 1.0) {
            errors.push("forecast.holdout_fraction must be between 0 and 1".to_string());
        }
        if !self.forecast.noise_std_dev.is_finite() || self.forecast.noise_std_dev < 0.0 {
            errors.push("forecast.noise_std_dev must be a finite value >= 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketDataSettings {
    pub base_url: String,
    pub requests_per_second: u32,
    pub user_agent: String,
    /// Scale OHLC by the split/dividend adjusted close.
    pub adjusted: bool,
}

impl Default for MarketDataSettings {
    fn default() -> Self {
        Self {
            base_url: YAHOO_CHART_API.to_string(),
            requests_per_second: 2,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) fin-tap/0.1".to_string(),
            adjusted: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastSettings {
    pub start_date: NaiveDate,
    pub horizon_days: usize,
    pub holdout_fraction: f64,
    pub noise_std_dev: f64,
    /// Fixes every random draw (bootstraps, network init, projection noise).
    pub seed: Option<u64>,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default(),
            horizon_days: 14,
            holdout_fraction: 0.05,
            noise_std_dev: 0.002,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.forecast.horizon_days, 14);
        assert_eq!(settings.forecast.holdout_fraction, 0.05);
        assert_eq!(settings.forecast.noise_std_dev, 0.002);
        assert_eq!(settings.forecast.start_date.to_string(), "2020-01-01");
        assert_eq!(settings.watchlist.len(), 30);
    }

    #[test]
    fn test_validate_collects_all_errors() {
        let mut settings = Settings::default();
        settings.market_data.requests_per_second = 0;
        settings.forecast.horizon_days = 0;
        settings.forecast.holdout_fraction = 1.5;
        settings.forecast.noise_std_dev = -1.0;

        let errors = settings.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.contains("holdout_fraction")));
    }

    #[test]
    fn test_invalid_error_message() {
        let err = SettingsError::Invalid(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "invalid configuration: a, b");
    }
}
