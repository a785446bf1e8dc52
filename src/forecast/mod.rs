pub mod dataset;
pub mod projection;

pub use dataset::*;
pub use projection::*;

use std::sync::Arc;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::ForecastSettings;
use crate::error::ForecastError;
use crate::features::{build_features, resolve_columns, FeatureTable};
use crate::market_data::MarketDataSource;
use crate::ml::{create_regressor, ModelCapabilities, ModelFamily};

/// Held-out tail of the labeled rows: the day each prediction is made, the
/// next close that actually followed, and what the model said.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestRecord {
    pub dates: Vec<NaiveDate>,
    pub actual_prices: Vec<f64>,
    pub predicted_prices: Vec<f64>,
}

impl BacktestRecord {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn mean_absolute_error(&self) -> Option<f64> {
        if self.is_empty() {
            return None;
        }
        let total: f64 = self
            .actual_prices
            .iter()
            .zip(&self.predicted_prices)
            .map(|(a, p)| (a - p).abs())
            .sum();
        Some(total / self.len() as f64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResult {
    pub ticker: String,
    pub model: ModelFamily,
    /// One value per future trading day, nearest first.
    pub future_prediction: Vec<f64>,
    pub validation_data: BacktestRecord,
    /// Last backtest date and its actual (next-day) close.
    pub last_known_date: NaiveDate,
    pub last_known_price: f64,
}

impl ForecastResult {
    /// The prediction for the final day of the horizon.
    pub fn final_prediction(&self) -> Option<f64> {
        self.future_prediction.last().copied()
    }
}

/// Trains a fresh model per request and projects the closing price forward.
pub struct ForecastEngine {
    source: Arc<dyn MarketDataSource>,
    settings: ForecastSettings,
    capabilities: ModelCapabilities,
}

impl ForecastEngine {
    pub fn new(source: Arc<dyn MarketDataSource>, settings: ForecastSettings) -> Self {
        Self {
            source,
            settings,
            capabilities: ModelCapabilities::detect(),
        }
    }

    pub fn settings(&self) -> &ForecastSettings {
        &self.settings
    }

    pub fn capabilities(&self) -> ModelCapabilities {
        self.capabilities
    }

    /// Feature table for `ticker` from the configured start date to today.
    pub async fn features(&self, ticker: &str) -> Result<FeatureTable, ForecastError> {
        build_features(self.source.as_ref(), ticker, self.settings.start_date).await
    }

    /// Runs a forecast, logging any failure and returning `None` in its place.
    pub async fn forecast<S: AsRef<str>>(
        &self,
        ticker: &str,
        model: &str,
        feature_groups: &[S],
    ) -> Option<ForecastResult> {
        match self.try_forecast(ticker, model, feature_groups).await {
            Ok(result) => Some(result),
            Err(e) => {
                error!("Forecast {} / {} failed [{}]: {}", ticker, model, e.kind(), e);
                None
            }
        }
    }

    pub async fn try_forecast<S: AsRef<str>>(
        &self,
        ticker: &str,
        model: &str,
        feature_groups: &[S],
    ) -> Result<ForecastResult, ForecastError> {
        let family: ModelFamily = model.parse()?;
        if !self.capabilities.is_available(family) {
            return Err(ForecastError::ModelUnavailable(family));
        }
        let table = self.features(ticker).await?;
        self.forecast_table(&table, family, feature_groups)
    }

    /// The synchronous pipeline over an already built feature table.
    pub fn forecast_table<S: AsRef<str>>(
        &self,
        table: &FeatureTable,
        family: ModelFamily,
        feature_groups: &[S],
    ) -> Result<ForecastResult, ForecastError> {
        let columns = resolve_columns(feature_groups);
        let set = TrainingSet::prepare(table, &columns, self.settings.holdout_fraction)?;
        debug!(
            "{}: {} columns, {} training rows, {} held out",
            table.ticker,
            columns.len(),
            set.split_index(),
            set.labeled_rows() - set.split_index()
        );

        let mut rng = match self.settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut model = create_regressor(family, rng.gen())?;
        model.fit(set.train_x(), set.train_y())?;

        let future_prediction = project(
            model.as_ref(),
            set.seed_row(),
            self.settings.horizon_days,
            self.settings.noise_std_dev,
            &mut rng,
        )?;

        let predicted = model.predict(set.test_x())?;
        let validation_data = BacktestRecord {
            dates: set.test_dates().to_vec(),
            actual_prices: set.test_y().to_vec(),
            predicted_prices: predicted.to_vec(),
        };

        let (last_known_date, last_known_price) = validation_data
            .dates
            .last()
            .copied()
            .zip(validation_data.actual_prices.last().copied())
            .ok_or_else(|| ForecastError::Predict("empty backtest".to_string()))?;

        info!(
            "{} {} forecast: day {} at {:.2}, backtest MAE {:.3} over {} days",
            table.ticker,
            family,
            future_prediction.len(),
            future_prediction.last().copied().unwrap_or(f64::NAN),
            validation_data.mean_absolute_error().unwrap_or(f64::NAN),
            validation_data.len()
        );

        Ok(ForecastResult {
            ticker: table.ticker.clone(),
            model: family,
            future_prediction,
            validation_data,
            last_known_date,
            last_known_price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::MockMarketDataSource;
    use crate::types::{synthetic_history, PriceHistory};

    fn settings() -> ForecastSettings {
        ForecastSettings {
            seed: Some(7),
            ..ForecastSettings::default()
        }
    }

    fn engine_with(bars: usize) -> ForecastEngine {
        let mut source = MockMarketDataSource::new();
        source
            .expect_fetch_daily()
            .returning(move |t, _, _| Ok(synthetic_history(t, bars)));
        ForecastEngine::new(Arc::new(source), settings())
    }

    fn table(bars: usize) -> FeatureTable {
        FeatureTable::from_history(&synthetic_history("AAPL", bars)).unwrap()
    }

    #[tokio::test]
    async fn test_forecast_shape() {
        let engine = engine_with(300);
        let result = engine
            .forecast("AAPL", "LINEAR", &["RSI", "MACD"])
            .await
            .unwrap();

        assert_eq!(result.ticker, "AAPL");
        assert_eq!(result.model, ModelFamily::Linear);
        assert_eq!(result.future_prediction.len(), 14);
        assert!(result.future_prediction.iter().all(|v| v.is_finite()));

        let record = &result.validation_data;
        assert_eq!(record.dates.len(), record.actual_prices.len());
        assert_eq!(record.dates.len(), record.predicted_prices.len());
        assert!(record.dates.windows(2).all(|w| w[0] < w[1]));

        let table = engine.features("AAPL").await.unwrap();
        assert_eq!(result.last_known_date, table.dates()[table.len() - 2]);
        assert_eq!(
            result.last_known_price,
            table.last_value(crate::features::FeatureColumn::Close).unwrap()
        );
    }

    #[test]
    fn test_linear_backtest_is_repeatable() {
        let engine = ForecastEngine::new(
            Arc::new(MockMarketDataSource::new()),
            ForecastSettings::default(),
        );
        let table = table(250);
        let groups = ["RSI", "Bollinger", "Volatility", "MACD"];
        let a = engine.forecast_table(&table, ModelFamily::Linear, &groups).unwrap();
        let b = engine.forecast_table(&table, ModelFamily::Linear, &groups).unwrap();
        assert_eq!(a.validation_data, b.validation_data);
    }

    #[test]
    fn test_every_available_family_forecasts() {
        let engine = ForecastEngine::new(Arc::new(MockMarketDataSource::new()), settings());
        let table = table(220);
        for family in engine.capabilities().available_families() {
            let result = engine
                .forecast_table(&table, family, &["RSI", "Lag"])
                .unwrap_or_else(|e| panic!("{} failed: {}", family, e));
            assert_eq!(result.future_prediction.len(), 14);
            assert!(result.validation_data.predicted_prices.iter().all(|v| v.is_finite()));
        }
    }

    #[test]
    fn test_seeded_forecasts_repeat() {
        let engine = ForecastEngine::new(Arc::new(MockMarketDataSource::new()), settings());
        let table = table(200);
        let a = engine.forecast_table(&table, ModelFamily::RandomForest, &["SMA"]).unwrap();
        let b = engine.forecast_table(&table, ModelFamily::RandomForest, &["SMA"]).unwrap();
        assert_eq!(a.future_prediction, b.future_prediction);
        assert_eq!(a.validation_data, b.validation_data);
    }

    #[test]
    fn test_unknown_groups_are_ignored() {
        let engine = ForecastEngine::new(Arc::new(MockMarketDataSource::new()), settings());
        let table = table(150);
        let plain = engine.forecast_table::<&str>(&table, ModelFamily::Linear, &[]).unwrap();
        let noisy = engine
            .forecast_table(&table, ModelFamily::Linear, &["", "Fibonacci"])
            .unwrap();
        assert_eq!(plain.validation_data, noisy.validation_data);
    }

    #[tokio::test]
    async fn test_unknown_model_yields_none() {
        let mut source = MockMarketDataSource::new();
        source.expect_fetch_daily().never();
        let engine = ForecastEngine::new(Arc::new(source), settings());
        assert!(engine.forecast("AAPL", "SVM", &["RSI"]).await.is_none());

        let err = engine.try_forecast("AAPL", "SVM", &["RSI"]).await.unwrap_err();
        assert_eq!(err.kind(), crate::error::FailureKind::UnsupportedModel);
    }

    #[tokio::test]
    async fn test_empty_history_yields_none() {
        let mut source = MockMarketDataSource::new();
        source
            .expect_fetch_daily()
            .returning(|t, _, _| Ok(PriceHistory::empty(t)));
        let engine = ForecastEngine::new(Arc::new(source), settings());
        assert!(engine.forecast("ZZZZ", "LINEAR", &["RSI"]).await.is_none());
    }

    #[test]
    fn test_result_json_shape() {
        let engine = ForecastEngine::new(Arc::new(MockMarketDataSource::new()), settings());
        let result = engine
            .forecast_table(&table(120), ModelFamily::Linear, &["RSI"])
            .unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["model"], "LINEAR");
        assert_eq!(json["future_prediction"].as_array().unwrap().len(), 14);
        assert!(json["validation_data"]["dates"][0].is_string());
        assert!(json["last_known_date"].as_str().unwrap().starts_with("2020-"));
    }
}
