use ndarray::{ArrayView1, Axis};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::error::ForecastError;
use crate::ml::Regressor;

/// Recursive multi-step projection from a single scaled feature row.
///
/// After each prediction the whole input row is multiplied by `1 + eps`, with
/// one `eps ~ Normal(0, noise_std_dev)` draw per step shared by every feature.
/// The predicted price is never fed back into the row.
pub fn project<R: Rng + ?Sized>(
    model: &dyn Regressor,
    seed_row: ArrayView1<'_, f64>,
    horizon: usize,
    noise_std_dev: f64,
    rng: &mut R,
) -> Result<Vec<f64>, ForecastError> {
    let noise = Normal::new(0.0, noise_std_dev)
        .map_err(|e| ForecastError::Predict(format!("invalid projection noise: {}", e)))?;

    let mut current = seed_row.to_owned();
    let mut path = Vec::with_capacity(horizon);

    for _ in 0..horizon {
        let input = current.view().insert_axis(Axis(0));
        let prediction = model
            .predict(input)?
            .first()
            .copied()
            .ok_or_else(|| ForecastError::Predict("empty prediction".to_string()))?;
        path.push(prediction);

        let eps: f64 = noise.sample(rng);
        current *= 1.0 + eps;
    }

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::LinearRegression;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fitted() -> LinearRegression {
        let x = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let y = array![1.0, 3.0, 2.0, 4.0];
        let mut model = LinearRegression::new();
        model.fit(x.view(), y.view()).unwrap();
        model
    }

    #[test]
    fn test_horizon_length() {
        let model = fitted();
        let mut rng = StdRng::seed_from_u64(1);
        let path = project(&model, array![0.5, 0.5].view(), 14, 0.002, &mut rng).unwrap();
        assert_eq!(path.len(), 14);
        assert!(path.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_zero_noise_repeats_first_prediction() {
        let model = fitted();
        let mut rng = StdRng::seed_from_u64(1);
        let path = project(&model, array![1.0, 1.0].view(), 5, 0.0, &mut rng).unwrap();
        for v in path {
            assert!((v - 4.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_seeded_projection_is_reproducible() {
        let model = fitted();
        let row = array![0.2, 0.9];
        let a = project(&model, row.view(), 14, 0.002, &mut StdRng::seed_from_u64(3)).unwrap();
        let b = project(&model, row.view(), 14, 0.002, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(a, b);
    }
}
