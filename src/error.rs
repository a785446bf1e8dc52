use thiserror::Error;

use crate::market_data::MarketDataError;
use crate::ml::ModelFamily;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("no price history available for {0}")]
    DataUnavailable(String),

    #[error("market data request failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("unknown model family: {0}")]
    UnknownModel(String),

    #[error("{0} support is not compiled into this build")]
    ModelUnavailable(ModelFamily),

    #[error("not enough rows to train: {rows} labeled, need at least {required}")]
    InsufficientData { rows: usize, required: usize },

    #[error("model fit failed: {0}")]
    Fit(String),

    #[error("model prediction failed: {0}")]
    Predict(String),
}

/// Coarse failure classes reported in logs when a forecast is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    DataUnavailable,
    UnsupportedModel,
    FitOrPredictFailure,
}

impl ForecastError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::DataUnavailable(_) | Self::MarketData(_) => FailureKind::DataUnavailable,
            Self::UnknownModel(_) | Self::ModelUnavailable(_) => FailureKind::UnsupportedModel,
            Self::InsufficientData { .. } | Self::Fit(_) | Self::Predict(_) => {
                FailureKind::FitOrPredictFailure
            }
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::DataUnavailable => "data_unavailable",
            Self::UnsupportedModel => "unsupported_model",
            Self::FitOrPredictFailure => "fit_or_predict_failure",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ForecastError::DataUnavailable("ZZZZ".into()).kind(),
            FailureKind::DataUnavailable
        );
        assert_eq!(
            ForecastError::UnknownModel("SVM".into()).kind(),
            FailureKind::UnsupportedModel
        );
        assert_eq!(
            ForecastError::InsufficientData { rows: 1, required: 2 }.kind(),
            FailureKind::FitOrPredictFailure
        );
        assert_eq!(FailureKind::UnsupportedModel.to_string(), "unsupported_model");
    }
}
