pub mod scaler;
pub mod linear;
pub mod tree;
pub mod forest;
#[cfg(feature = "boosting")]
pub mod boosting;
#[cfg(feature = "recurrent")]
pub mod lstm;

pub use scaler::MinMaxScaler;
pub use linear::LinearRegression;
pub use forest::{ForestConfig, RandomForest};
#[cfg(feature = "boosting")]
pub use boosting::{BoostingParams, GradientBoosting};
#[cfg(feature = "recurrent")]
pub use lstm::{LstmConfig, LstmRegressor};

use std::fmt;
use std::str::FromStr;

use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::error::ForecastError;

/// Uniform fit/predict contract shared by every model family.
pub trait Regressor: Send {
    fn name(&self) -> &'static str;

    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<(), ForecastError>;

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ForecastError>;
}

/// Model family identifier, selected by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelFamily {
    Linear,
    RandomForest,
    #[serde(rename = "XGBOOST")]
    XgBoost,
    #[serde(rename = "LIGHTGBM")]
    LightGbm,
    Lstm,
}

impl ModelFamily {
    pub const ALL: [ModelFamily; 5] = [
        ModelFamily::Linear,
        ModelFamily::RandomForest,
        ModelFamily::XgBoost,
        ModelFamily::LightGbm,
        ModelFamily::Lstm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::Linear => "LINEAR",
            ModelFamily::RandomForest => "RANDOM_FOREST",
            ModelFamily::XgBoost => "XGBOOST",
            ModelFamily::LightGbm => "LIGHTGBM",
            ModelFamily::Lstm => "LSTM",
        }
    }
}

impl FromStr for ModelFamily {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .iter()
            .find(|f| f.as_str() == key)
            .copied()
            .ok_or_else(|| ForecastError::UnknownModel(s.to_string()))
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which optional model families this build carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelCapabilities {
    pub boosting: bool,
    pub recurrent: bool,
}

impl ModelCapabilities {
    pub fn detect() -> Self {
        Self {
            boosting: cfg!(feature = "boosting"),
            recurrent: cfg!(feature = "recurrent"),
        }
    }

    pub fn is_available(&self, family: ModelFamily) -> bool {
        match family {
            ModelFamily::Linear | ModelFamily::RandomForest => true,
            ModelFamily::XgBoost | ModelFamily::LightGbm => self.boosting,
            ModelFamily::Lstm => self.recurrent,
        }
    }

    pub fn available_families(&self) -> Vec<ModelFamily> {
        ModelFamily::ALL
            .iter()
            .copied()
            .filter(|f| self.is_available(*f))
            .collect()
    }
}

/// Builds an unfitted regressor. `seed` feeds the randomized families.
pub fn create_regressor(
    family: ModelFamily,
    seed: u64,
) -> Result<Box<dyn Regressor>, ForecastError> {
    match family {
        ModelFamily::Linear => Ok(Box::new(LinearRegression::new())),
        ModelFamily::RandomForest => Ok(Box::new(RandomForest::new(ForestConfig::default(), seed))),
        #[cfg(feature = "boosting")]
        ModelFamily::XgBoost => Ok(Box::new(GradientBoosting::new(BoostingParams::xgboost()))),
        #[cfg(feature = "boosting")]
        ModelFamily::LightGbm => Ok(Box::new(GradientBoosting::new(BoostingParams::lightgbm()))),
        #[cfg(feature = "recurrent")]
        ModelFamily::Lstm => Ok(Box::new(LstmRegressor::new(LstmConfig::default(), seed))),
        #[allow(unreachable_patterns)]
        other => Err(ForecastError::ModelUnavailable(other)),
    }
}

/// Shape and finiteness checks shared by the `fit` implementations.
pub(crate) fn check_training_data(
    x: &ArrayView2<'_, f64>,
    y: &ArrayView1<'_, f64>,
) -> Result<(), ForecastError> {
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(ForecastError::Fit("empty training matrix".to_string()));
    }
    if x.nrows() != y.len() {
        return Err(ForecastError::Fit(format!(
            "{} rows but {} labels",
            x.nrows(),
            y.len()
        )));
    }
    if !x.iter().chain(y.iter()).all(|v| v.is_finite()) {
        return Err(ForecastError::Fit("training data contains non-finite values".to_string()));
    }
    Ok(())
}

/// Rejects predictions that are not finite numbers.
pub(crate) fn check_predictions(values: Array1<f64>) -> Result<Array1<f64>, ForecastError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(values)
    } else {
        Err(ForecastError::Predict("model produced non-finite values".to_string()))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_model_family_from_str() {
        assert_eq!("LINEAR".parse::<ModelFamily>().unwrap(), ModelFamily::Linear);
        assert_eq!("random_forest".parse::<ModelFamily>().unwrap(), ModelFamily::RandomForest);
        assert_eq!("lightgbm".parse::<ModelFamily>().unwrap(), ModelFamily::LightGbm);
        assert_eq!("Random-Forest".parse::<ModelFamily>().unwrap(), ModelFamily::RandomForest);
        let err = "SVM".parse::<ModelFamily>().unwrap_err();
        assert!(matches!(err, ForecastError::UnknownModel(ref s) if s == "SVM"));
    }

    #[test]
    fn test_capabilities_match_build() {
        let caps = ModelCapabilities::detect();
        assert!(caps.is_available(ModelFamily::Linear));
        assert!(caps.is_available(ModelFamily::RandomForest));
        assert_eq!(caps.is_available(ModelFamily::XgBoost), cfg!(feature = "boosting"));
        assert_eq!(caps.is_available(ModelFamily::Lstm), cfg!(feature = "recurrent"));
    }

    #[test]
    fn test_create_regressor_respects_capabilities() {
        let caps = ModelCapabilities::detect();
        for family in ModelFamily::ALL {
            let created = create_regressor(family, 7);
            if caps.is_available(family) {
                assert!(created.is_ok(), "{} should be available", family);
            } else {
                assert!(matches!(created, Err(ForecastError::ModelUnavailable(f)) if f == family));
            }
        }
    }

    #[test]
    fn test_check_training_data() {
        let x = array![[1.0, 2.0], [3.0, 4.0]];
        assert!(check_training_data(&x.view(), &array![1.0, 2.0].view()).is_ok());
        assert!(check_training_data(&x.view(), &array![1.0].view()).is_err());
        assert!(check_training_data(&x.view(), &array![1.0, f64::NAN].view()).is_err());
        assert!(check_predictions(array![1.0, f64::INFINITY]).is_err());
    }
}
