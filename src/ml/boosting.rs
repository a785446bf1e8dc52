use ndarray::{Array1, ArrayView1, ArrayView2};
use tracing::debug;

use super::tree::{Growth, RegressionTree, TreeParams};
use super::{check_predictions, check_training_data, Regressor};
use crate::error::ForecastError;

/// Hyper-parameters for a squared-error gradient boosting run.
#[derive(Debug, Clone)]
pub struct BoostingParams {
    pub name: &'static str,
    pub n_rounds: usize,
    pub learning_rate: f64,
    pub tree: TreeParams,
}

impl BoostingParams {
    /// Level-wise trees, depth 6, eta 0.3, L2 1.0, min child weight 1.
    pub fn xgboost() -> Self {
        Self {
            name: "XGBOOST",
            n_rounds: 200,
            learning_rate: 0.3,
            tree: TreeParams {
                growth: Growth::DepthWise,
                max_depth: Some(6),
                max_leaves: None,
                min_samples_split: 2,
                min_samples_leaf: 1,
                min_child_weight: 1.0,
                lambda: 1.0,
            },
        }
    }

    /// Leaf-wise trees with 31 leaves, learning rate 0.1, 20 rows per leaf.
    pub fn lightgbm() -> Self {
        Self {
            name: "LIGHTGBM",
            n_rounds: 200,
            learning_rate: 0.1,
            tree: TreeParams {
                growth: Growth::LeafWise,
                max_depth: None,
                max_leaves: Some(31),
                min_samples_split: 40,
                min_samples_leaf: 20,
                min_child_weight: 1e-3,
                lambda: 0.0,
            },
        }
    }
}

/// Additive ensemble of regression trees, each one fitted to the residual
/// gradients of the ensemble before it.
#[derive(Debug, Clone)]
pub struct GradientBoosting {
    params: BoostingParams,
    base_score: f64,
    trees: Vec<RegressionTree>,
}

impl GradientBoosting {
    pub fn new(params: BoostingParams) -> Self {
        Self {
            params,
            base_score: 0.0,
            trees: Vec::new(),
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for GradientBoosting {
    fn name(&self) -> &'static str {
        self.params.name
    }

    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<(), ForecastError> {
        check_training_data(&x, &y)?;

        let n = x.nrows();
        self.base_score = y.mean().unwrap_or(0.0);
        self.trees.clear();

        let mut current = vec![self.base_score; n];
        let hess = vec![1.0; n];
        let mut grad = vec![0.0; n];

        for round in 0..self.params.n_rounds {
            for i in 0..n {
                grad[i] = current[i] - y[i];
            }
            let tree = RegressionTree::fit(x, &grad, &hess, (0..n).collect(), &self.params.tree);
            if tree.n_leaves() == 1 && round > 0 {
                debug!("{} converged after {} rounds", self.params.name, round);
                break;
            }
            for (i, row) in x.rows().into_iter().enumerate() {
                current[i] += self.params.learning_rate * tree.predict_row(row);
            }
            self.trees.push(tree);
        }

        let train_mse = current
            .iter()
            .zip(y.iter())
            .map(|(p, t)| (p - t) * (p - t))
            .sum::<f64>()
            / n as f64;
        debug!(
            "{}: {} trees, training mse {:.6}",
            self.params.name,
            self.trees.len(),
            train_mse
        );
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ForecastError> {
        if self.trees.is_empty() {
            return Err(ForecastError::Predict(format!("{} is not fitted", self.params.name)));
        }
        let lr = self.params.learning_rate;
        let out = x
            .rows()
            .into_iter()
            .map(|row| {
                self.base_score + lr * self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>()
            })
            .collect();
        check_predictions(out)
    }
}
