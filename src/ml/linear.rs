use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use tracing::debug;

use super::{check_predictions, check_training_data, Regressor};
use crate::error::ForecastError;

const JACOBI_MAX_SWEEPS: usize = 100;
const EIGEN_CUTOFF: f64 = 1e-12;

/// Ordinary least squares with an intercept.
///
/// Solved through the pseudo-inverse of the centered normal equations, so
/// collinear feature sets (the Bollinger bands, MACD and its histogram) still
/// give the deterministic minimum-norm solution.
#[derive(Debug, Clone, Default)]
pub struct LinearRegression {
    coefficients: Option<Array1<f64>>,
    intercept: f64,
}

impl LinearRegression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coefficients(&self) -> Option<&Array1<f64>> {
        self.coefficients.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

impl Regressor for LinearRegression {
    fn name(&self) -> &'static str {
        "LINEAR"
    }

    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<(), ForecastError> {
        check_training_data(&x, &y)?;

        let x_mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| ForecastError::Fit("empty training matrix".to_string()))?;
        let y_mean = y
            .mean()
            .ok_or_else(|| ForecastError::Fit("empty label vector".to_string()))?;

        let xc = &x - &x_mean;
        let yc = y.mapv(|v| v - y_mean);
        let gram = xc.t().dot(&xc);
        let moment = xc.t().dot(&yc);

        let (eigenvalues, eigenvectors) = symmetric_eigen(gram);
        let largest = eigenvalues.iter().cloned().fold(0.0_f64, f64::max);
        let cutoff = largest * EIGEN_CUTOFF;

        let mut coefficients = Array1::<f64>::zeros(x.ncols());
        let mut rank = 0;
        for (k, &lambda) in eigenvalues.iter().enumerate() {
            if lambda <= cutoff || lambda <= 0.0 {
                continue;
            }
            rank += 1;
            let v = eigenvectors.column(k);
            let weight = v.dot(&moment) / lambda;
            coefficients.scaled_add(weight, &v);
        }

        self.intercept = y_mean - x_mean.dot(&coefficients);
        debug!(
            "Linear fit on {}x{} (rank {}), intercept {:.4}",
            x.nrows(),
            x.ncols(),
            rank,
            self.intercept
        );
        self.coefficients = Some(coefficients);
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ForecastError> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or_else(|| ForecastError::Predict("linear model is not fitted".to_string()))?;
        if x.ncols() != coefficients.len() {
            return Err(ForecastError::Predict(format!(
                "expected {} features, got {}",
                coefficients.len(),
                x.ncols()
            )));
        }
        check_predictions(x.dot(coefficients) + self.intercept)
    }
}

/// Eigen-decomposition of a symmetric matrix by cyclic Jacobi rotations.
/// Returns the eigenvalues and the matching eigenvectors as columns.
fn symmetric_eigen(mut a: Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut v = Array2::<f64>::eye(n);
    let scale: f64 = a.iter().map(|x| x * x).sum::<f64>().max(f64::MIN_POSITIVE);

    for _ in 0..JACOBI_MAX_SWEEPS {
        let mut off = 0.0;
        for p in 0..n {
            for q in (p + 1)..n {
                off += a[[p, q]] * a[[p, q]];
            }
        }
        if off <= scale * 1e-30 {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq.abs() <= f64::MIN_POSITIVE {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let sign = if theta >= 0.0 { 1.0 } else { -1.0 };
                let t = sign / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[[p, k]];
                    let aqk = a[[q, k]];
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    (a.diag().to_owned(), v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::testing::{linear_dataset, mse};
    use ndarray::{array, concatenate};

    #[test]
    fn test_recovers_exact_relationship() {
        let (x, y) = linear_dataset(200);
        let mut model = LinearRegression::new();
        model.fit(x.view(), y.view()).unwrap();

        let coef = model.coefficients().unwrap();
        assert!((coef[0] - 3.0).abs() < 1e-6);
        assert!((coef[1] + 2.0).abs() < 1e-6);
        assert!((coef[2] - 0.5).abs() < 1e-6);
        assert!((model.intercept() - 10.0).abs() < 1e-6);

        let pred = model.predict(x.view()).unwrap();
        assert!(mse(&pred, &y) < 1e-10);
    }

    #[test]
    fn test_collinear_columns_stay_finite() {
        let (x, y) = linear_dataset(150);
        let dup = x.column(0).to_owned().insert_axis(Axis(1));
        let x = concatenate(Axis(1), &[x.view(), dup.view()]).unwrap();

        let mut model = LinearRegression::new();
        model.fit(x.view(), y.view()).unwrap();
        let coef = model.coefficients().unwrap();
        // min-norm splits the shared weight evenly
        assert!((coef[0] - coef[3]).abs() < 1e-6);
        assert!((coef[0] + coef[3] - 3.0).abs() < 1e-6);
        assert!(mse(&model.predict(x.view()).unwrap(), &y) < 1e-10);
    }

    #[test]
    fn test_constant_feature_is_ignored() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![3.0, 5.0, 7.0, 9.0];
        let mut model = LinearRegression::new();
        model.fit(x.view(), y.view()).unwrap();
        let pred = model.predict(array![[5.0, 0.0]].view()).unwrap();
        assert!((pred[0] - 11.0).abs() < 1e-9);
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let model = LinearRegression::new();
        assert!(matches!(
            model.predict(array![[1.0]].view()),
            Err(ForecastError::Predict(_))
        ));
    }

    #[test]
    fn test_eigen_decomposition_of_known_matrix() {
        let (values, vectors) = symmetric_eigen(array![[2.0, 1.0], [1.0, 2.0]]);
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        assert!((sorted[0] - 1.0).abs() < 1e-12);
        assert!((sorted[1] - 3.0).abs() < 1e-12);
        let orth = vectors.t().dot(&vectors);
        assert!((orth[[0, 0]] - 1.0).abs() < 1e-12);
        assert!(orth[[0, 1]].abs() < 1e-12);
    }
}
