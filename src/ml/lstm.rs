use ndarray::{
    s, Array, Array1, Array2, Array3, ArrayView1, ArrayView2, ArrayView3, Axis, Dimension, Zip,
};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use super::{check_predictions, check_training_data, Regressor};
use crate::error::ForecastError;

#[derive(Debug, Clone)]
pub struct LstmConfig {
    pub hidden_units: usize,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    pub beta1: f64,
    pub beta2: f64,
    pub epsilon: f64,
}

impl Default for LstmConfig {
    fn default() -> Self {
        Self {
            hidden_units: 50,
            epochs: 5,
            batch_size: 32,
            learning_rate: 0.001,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
        }
    }
}

/// Single LSTM layer followed by a dense output unit.
///
/// Feature rows are fed as length-1 sequences of shape `(rows, 1, features)`;
/// the cell itself handles any sequence length. Gate blocks are stacked in
/// input, forget, cell, output order.
pub struct LstmRegressor {
    config: LstmConfig,
    seed: u64,
    params: Option<LstmParams>,
}

impl LstmRegressor {
    pub fn new(config: LstmConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            params: None,
        }
    }

    /// Trains on `(samples, timesteps, features)` sequences.
    pub fn fit_sequences(
        &mut self,
        x: ArrayView3<'_, f64>,
        y: ArrayView1<'_, f64>,
    ) -> Result<(), ForecastError> {
        let (n, _, features) = x.dim();
        if n == 0 || features == 0 || n != y.len() {
            return Err(ForecastError::Fit(format!(
                "bad sequence batch: {} samples, {} features, {} labels",
                n,
                features,
                y.len()
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut params = LstmParams::init(features, self.config.hidden_units, &mut rng);
        let mut adam = Adam::new(&params, &self.config);
        let mut order: Vec<usize> = (0..n).collect();
        let batch_size = self.config.batch_size.max(1);

        for epoch in 0..self.config.epochs {
            order.shuffle(&mut rng);
            let mut epoch_loss = 0.0;
            for batch in order.chunks(batch_size) {
                let (loss, grads) = params.batch_gradients(x, y, batch);
                epoch_loss += loss * batch.len() as f64;
                adam.step(&mut params, &grads);
            }
            debug!(
                "LSTM epoch {}/{}: loss {:.6}",
                epoch + 1,
                self.config.epochs,
                epoch_loss / n as f64
            );
        }

        self.params = Some(params);
        Ok(())
    }

    pub fn predict_sequences(&self, x: ArrayView3<'_, f64>) -> Result<Array1<f64>, ForecastError> {
        let params = self
            .params
            .as_ref()
            .ok_or_else(|| ForecastError::Predict("LSTM is not fitted".to_string()))?;
        if x.dim().2 != params.features() {
            return Err(ForecastError::Predict(format!(
                "expected {} features, got {}",
                params.features(),
                x.dim().2
            )));
        }
        let out = x
            .outer_iter()
            .map(|seq| params.forward(seq).0)
            .collect();
        check_predictions(out)
    }
}

impl Regressor for LstmRegressor {
    fn name(&self) -> &'static str {
        "LSTM"
    }

    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<(), ForecastError> {
        check_training_data(&x, &y)?;
        let sequences = as_sequences(x).map_err(ForecastError::Fit)?;
        self.fit_sequences(sequences.view(), y)
    }

    fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Array1<f64>, ForecastError> {
        let sequences = as_sequences(x).map_err(ForecastError::Predict)?;
        self.predict_sequences(sequences.view())
    }
}

/// Reshapes `(rows, features)` into `(rows, 1, features)`.
fn as_sequences(x: ArrayView2<'_, f64>) -> Result<Array3<f64>, String> {
    let (rows, features) = x.dim();
    x.to_owned()
        .into_shape_with_order((rows, 1, features))
        .map_err(|e| e.to_string())
}

fn sigmoid(v: f64) -> f64 {
    1.0 / (1.0 + (-v).exp())
}

fn glorot(
    rows: usize,
    cols: usize,
    fan_in: usize,
    fan_out: usize,
    rng: &mut StdRng,
) -> Array2<f64> {
    let limit = (6.0 / (fan_in + fan_out) as f64).sqrt();
    let dist = Uniform::new_inclusive(-limit, limit);
    Array2::from_shape_fn((rows, cols), |_| dist.sample(rng))
}

#[derive(Debug, Clone)]
struct LstmParams {
    /// Input kernel, `(4H, F)`.
    w: Array2<f64>,
    /// Recurrent kernel, `(4H, H)`.
    u: Array2<f64>,
    b: Array1<f64>,
    dense: Array1<f64>,
    dense_bias: Array1<f64>,
}

struct StepCache {
    x: Array1<f64>,
    h_prev: Array1<f64>,
    c_prev: Array1<f64>,
    i: Array1<f64>,
    f: Array1<f64>,
    g: Array1<f64>,
    o: Array1<f64>,
    tanh_c: Array1<f64>,
}

impl LstmParams {
    fn init(features: usize, hidden: usize, rng: &mut StdRng) -> Self {
        let gates = 4 * hidden;
        let w = glorot(gates, features, features, gates, rng);
        let u = glorot(gates, hidden, hidden, gates, rng);
        let mut b = Array1::zeros(gates);
        b.slice_mut(s![hidden..2 * hidden]).fill(1.0);
        let dense = glorot(1, hidden, hidden, 1, rng).index_axis_move(Axis(0), 0);
        Self {
            w,
            u,
            b,
            dense,
            dense_bias: Array1::zeros(1),
        }
    }

    fn zeros_like(&self) -> Self {
        Self {
            w: Array2::zeros(self.w.raw_dim()),
            u: Array2::zeros(self.u.raw_dim()),
            b: Array1::zeros(self.b.raw_dim()),
            dense: Array1::zeros(self.dense.raw_dim()),
            dense_bias: Array1::zeros(1),
        }
    }

    fn hidden(&self) -> usize {
        self.dense.len()
    }

    fn features(&self) -> usize {
        self.w.ncols()
    }

    fn forward(&self, seq: ArrayView2<'_, f64>) -> (f64, Vec<StepCache>, Array1<f64>) {
        let h = self.hidden();
        let mut h_t = Array1::<f64>::zeros(h);
        let mut c_t = Array1::<f64>::zeros(h);
        let mut caches = Vec::with_capacity(seq.nrows());

        for x in seq.rows() {
            let z = self.w.dot(&x) + self.u.dot(&h_t) + &self.b;
            let i = z.slice(s![0..h]).mapv(sigmoid);
            let f = z.slice(s![h..2 * h]).mapv(sigmoid);
            let g = z.slice(s![2 * h..3 * h]).mapv(f64::tanh);
            let o = z.slice(s![3 * h..4 * h]).mapv(sigmoid);

            let c_next = &f * &c_t + &i * &g;
            let tanh_c = c_next.mapv(f64::tanh);
            let h_next = &o * &tanh_c;

            caches.push(StepCache {
                x: x.to_owned(),
                h_prev: h_t,
                c_prev: c_t,
                i,
                f,
                g,
                o,
                tanh_c,
            });
            h_t = h_next;
            c_t = c_next;
        }

        let y = self.dense.dot(&h_t) + self.dense_bias[0];
        (y, caches, h_t)
    }

    /// Backpropagation through time for one sequence, accumulating into `grads`.
    fn backward(
        &self,
        caches: &[StepCache],
        h_last: &Array1<f64>,
        dy: f64,
        grads: &mut LstmParams,
    ) {
        let h = self.hidden();
        grads.dense.scaled_add(dy, h_last);
        grads.dense_bias[0] += dy;

        let mut dh = &self.dense * dy;
        let mut dc = Array1::<f64>::zeros(h);
        let mut dz = Array1::<f64>::zeros(4 * h);

        for step in caches.iter().rev() {
            let d_o = &dh * &step.tanh_c;
            let dc_total = &dc + &(&dh * &step.o * step.tanh_c.mapv(|t| 1.0 - t * t));

            dz.slice_mut(s![0..h])
                .assign(&(&dc_total * &step.g * step.i.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![h..2 * h])
                .assign(&(&dc_total * &step.c_prev * step.f.mapv(|v| v * (1.0 - v))));
            dz.slice_mut(s![2 * h..3 * h])
                .assign(&(&dc_total * &step.i * step.g.mapv(|v| 1.0 - v * v)));
            dz.slice_mut(s![3 * h..4 * h])
                .assign(&(d_o * step.o.mapv(|v| v * (1.0 - v))));

            Zip::from(grads.w.rows_mut())
                .and(&dz)
                .for_each(|mut row, &d| row.scaled_add(d, &step.x));
            Zip::from(grads.u.rows_mut())
                .and(&dz)
                .for_each(|mut row, &d| row.scaled_add(d, &step.h_prev));
            grads.b += &dz;

            dc = &dc_total * &step.f;
            dh = self.u.t().dot(&dz);
        }
    }

    /// Mean squared error over `batch` and its gradient.
    fn batch_gradients(
        &self,
        x: ArrayView3<'_, f64>,
        y: ArrayView1<'_, f64>,
        batch: &[usize],
    ) -> (f64, LstmParams) {
        let mut grads = self.zeros_like();
        let scale = 1.0 / batch.len() as f64;
        let mut loss = 0.0;
        for &sample in batch {
            let (pred, caches, h_last) = self.forward(x.index_axis(Axis(0), sample));
            let err = pred - y[sample];
            loss += err * err * scale;
            self.backward(&caches, &h_last, 2.0 * err * scale, &mut grads);
        }
        (loss, grads)
    }
}

struct Adam {
    m: LstmParams,
    v: LstmParams,
    t: i32,
    learning_rate: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
}

impl Adam {
    fn new(params: &LstmParams, config: &LstmConfig) -> Self {
        Self {
            m: params.zeros_like(),
            v: params.zeros_like(),
            t: 0,
            learning_rate: config.learning_rate,
            beta1: config.beta1,
            beta2: config.beta2,
            epsilon: config.epsilon,
        }
    }

    fn step(&mut self, params: &mut LstmParams, grads: &LstmParams) {
        self.t += 1;
        let lr_t = self.learning_rate * (1.0 - self.beta2.powi(self.t)).sqrt()
            / (1.0 - self.beta1.powi(self.t));
        let (b1, b2, eps) = (self.beta1, self.beta2, self.epsilon);

        adam_update(&mut params.w, &grads.w, &mut self.m.w, &mut self.v.w, lr_t, b1, b2, eps);
        adam_update(&mut params.u, &grads.u, &mut self.m.u, &mut self.v.u, lr_t, b1, b2, eps);
        adam_update(&mut params.b, &grads.b, &mut self.m.b, &mut self.v.b, lr_t, b1, b2, eps);
        adam_update(
            &mut params.dense,
            &grads.dense,
            &mut self.m.dense,
            &mut self.v.dense,
            lr_t,
            b1,
            b2,
            eps,
        );
        adam_update(
            &mut params.dense_bias,
            &grads.dense_bias,
            &mut self.m.dense_bias,
            &mut self.v.dense_bias,
            lr_t,
            b1,
            b2,
            eps,
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn adam_update<D: Dimension>(
    param: &mut Array<f64, D>,
    grad: &Array<f64, D>,
    m: &mut Array<f64, D>,
    v: &mut Array<f64, D>,
    lr_t: f64,
    beta1: f64,
    beta2: f64,
    epsilon: f64,
) {
    Zip::from(param)
        .and(grad)
        .and(m)
        .and(v)
        .for_each(|p, &g, m, v| {
            *m = beta1 * *m + (1.0 - beta1) * g;
            *v = beta2 * *v + (1.0 - beta2) * g * g;
            *p -= lr_t * *m / (v.sqrt() + epsilon);
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::testing::{linear_dataset, mse};

    fn small_problem() -> (Array2<f64>, Array1<f64>) {
        let (x, _) = linear_dataset(64);
        let y = x.column(0).mapv(|v| 0.1 * v + 0.5);
        (x, y)
    }

    #[test]
    fn test_default_fit_produces_finite_predictions() {
        let (x, y) = linear_dataset(100);
        let mut model = LstmRegressor::new(LstmConfig::default(), 3);
        model.fit(x.view(), y.view()).unwrap();
        let pred = model.predict(x.view()).unwrap();
        assert_eq!(pred.len(), 100);
        assert!(pred.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_training_reduces_error() {
        let (x, y) = small_problem();
        let config = LstmConfig {
            hidden_units: 8,
            epochs: 50,
            learning_rate: 0.01,
            ..LstmConfig::default()
        };
        let mut untrained = LstmRegressor::new(LstmConfig { epochs: 0, ..config.clone() }, 11);
        let mut trained = LstmRegressor::new(config, 11);
        untrained.fit(x.view(), y.view()).unwrap();
        trained.fit(x.view(), y.view()).unwrap();

        let before = mse(&untrained.predict(x.view()).unwrap(), &y);
        let after = mse(&trained.predict(x.view()).unwrap(), &y);
        assert!(after < 0.5 * before, "before {} after {}", before, after);
    }

    #[test]
    fn test_same_seed_same_model() {
        let (x, y) = small_problem();
        let mut a = LstmRegressor::new(LstmConfig::default(), 5);
        let mut b = LstmRegressor::new(LstmConfig::default(), 5);
        a.fit(x.view(), y.view()).unwrap();
        b.fit(x.view(), y.view()).unwrap();
        assert_eq!(a.predict(x.view()).unwrap(), b.predict(x.view()).unwrap());
    }

    #[test]
    fn test_gradients_match_finite_differences() {
        let mut rng = StdRng::seed_from_u64(17);
        let params = LstmParams::init(2, 3, &mut rng);
        let x = Array3::from_shape_fn((4, 2, 2), |(n, t, f)| {
            ((n + 2 * t + 3 * f) as f64 * 0.37).sin()
        });
        let y = Array1::from_vec(vec![0.2, -0.1, 0.4, 0.0]);
        let batch = [0, 1, 2, 3];
        let (_, grads) = params.batch_gradients(x.view(), y.view(), &batch);

        let eps = 1e-6;
        let loss_with = |p: &LstmParams| p.batch_gradients(x.view(), y.view(), &batch).0;
        let check = |analytic: f64, plus: LstmParams, minus: LstmParams| {
            let numeric = (loss_with(&plus) - loss_with(&minus)) / (2.0 * eps);
            assert!(
                (numeric - analytic).abs() < 1e-6 + 1e-4 * analytic.abs(),
                "numeric {} analytic {}",
                numeric,
                analytic
            );
        };

        let (mut plus, mut minus) = (params.clone(), params.clone());
        plus.w[[5, 1]] += eps;
        minus.w[[5, 1]] -= eps;
        check(grads.w[[5, 1]], plus, minus);

        let (mut plus, mut minus) = (params.clone(), params.clone());
        plus.u[[7, 2]] += eps;
        minus.u[[7, 2]] -= eps;
        check(grads.u[[7, 2]], plus, minus);

        let (mut plus, mut minus) = (params.clone(), params.clone());
        plus.b[10] += eps;
        minus.b[10] -= eps;
        check(grads.b[10], plus, minus);

        let (mut plus, mut minus) = (params.clone(), params.clone());
        plus.dense[1] += eps;
        minus.dense[1] -= eps;
        check(grads.dense[1], plus, minus);
    }

    #[test]
    fn test_predict_rejects_wrong_width() {
        let (x, y) = small_problem();
        let mut model = LstmRegressor::new(LstmConfig { epochs: 1, ..LstmConfig::default() }, 0);
        model.fit(x.view(), y.view()).unwrap();
        assert!(model.predict(Array2::zeros((2, 5)).view()).is_err());
    }
}
