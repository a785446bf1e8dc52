use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::tree::{RegressionTree, TreeParams};
use super::{check_predictions, check_training_data, Regressor};
use crate::error::ForecastError;

#[derive(Debug, Clone)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 50,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// Bagged ensemble of fully grown regression trees. Each tree sees a
/// bootstrap sample of the rows and every feature; predictions are averaged.
#[derive(Debug, Clone)]
pub struct RandomForest {
    config: ForestConfig,
    seed: u64,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    pub fn new(config: ForestConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            trees: Vec::new(),
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Regressor for RandomForest {
    fn name(&self) -> &'static str {
        "RANDOM_FOREST"
    }

    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<(), ForecastError> {
        check_training_data(&x, &y)?;
        if self.config.n_trees == 0 {
            return Err(ForecastError::Fit("forest needs at least one tree".to_string()));
        }

        let n = x.nrows();
        let grad: Vec<f64> = y.iter().map(|v| -v).collect();
        let hess = vec![1.0; n];
        let params = TreeParams {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            min_samples_leaf: self.config.min_samples_leaf,
            ..TreeParams::default()
        };

        let mut rng = StdRng::seed_from_u64(self.seed);
        self.trees = (0..self.config.n_trees)
            .map(|_| {
                let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
                RegressionTree::fit(x, &grad, &hess, bootstrap, &params)
            })
            .collect();

        debug!(
            "Random forest: {} trees on {} rows, mean depth {:.1}",
            self.trees.len(),
            n,
            self.trees.iter().map(|t| t.depth() as f64).sum::<f64>() / self.trees.len() as f64
        );
        Ok(())
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ForecastError> {
        if self.trees.is_empty() {
            return Err(ForecastError::Predict("random forest is not fitted".to_string()));
        }
        let count = self.trees.len() as f64;
        let out = x
            .rows()
            .into_iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / count)
            .collect();
        check_predictions(out)
    }
}
