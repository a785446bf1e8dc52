use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::error::ForecastError;

/// Per-column min-max scaling to [0, 1]. Constant columns map to 0.
#[derive(Debug, Clone)]
pub struct MinMaxScaler {
    min: Array1<f64>,
    scale: Array1<f64>,
}

impl MinMaxScaler {
    pub fn fit(x: ArrayView2<'_, f64>) -> Result<Self, ForecastError> {
        if x.nrows() == 0 || x.ncols() == 0 {
            return Err(ForecastError::Fit("cannot scale an empty matrix".to_string()));
        }

        let min = x.fold_axis(Axis(0), f64::INFINITY, |acc, &v| acc.min(v));
        let max = x.fold_axis(Axis(0), f64::NEG_INFINITY, |acc, &v| acc.max(v));
        if !min.iter().chain(max.iter()).all(|v| v.is_finite()) {
            return Err(ForecastError::Fit("cannot scale non-finite values".to_string()));
        }

        let scale = (&max - &min).mapv(|range| if range > 0.0 { 1.0 / range } else { 0.0 });
        Ok(Self { min, scale })
    }

    pub fn transform(&self, x: ArrayView2<'_, f64>) -> Result<Array2<f64>, ForecastError> {
        if x.ncols() != self.min.len() {
            return Err(ForecastError::Predict(format!(
                "scaler fitted on {} columns, got {}",
                self.min.len(),
                x.ncols()
            )));
        }
        Ok((&x - &self.min) * &self.scale)
    }

    pub fn fit_transform(x: ArrayView2<'_, f64>) -> Result<(Self, Array2<f64>), ForecastError> {
        let scaler = Self::fit(x)?;
        let scaled = scaler.transform(x)?;
        Ok((scaler, scaled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_columns_scaled_to_unit_range() {
        let x = array![[1.0, 10.0, 5.0], [3.0, 30.0, 5.0], [2.0, 20.0, 5.0]];
        let (_, scaled) = MinMaxScaler::fit_transform(x.view()).unwrap();
        let expected = array![[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.5, 0.5, 0.0]];
        for (a, b) in scaled.iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_transform_checks_width() {
        let scaler = MinMaxScaler::fit(array![[1.0, 2.0]].view()).unwrap();
        assert!(scaler.transform(array![[1.0]].view()).is_err());
        assert!(MinMaxScaler::fit(Array2::<f64>::zeros((0, 3)).view()).is_err());
    }
}
