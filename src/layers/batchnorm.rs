use ndarray::{Array1, Array2, Axis};

use super::Mode;

pub const DEFAULT_MOMENTUM: f64 = 0.9;
pub const DEFAULT_EPS: f64 = 1e-5;

/// Per-layer running statistics for batch normalization.
///
/// Updated by every train-mode forward pass as an exponential moving average
/// `r = momentum·r + (1 − momentum)·batch`; read, never written, in test mode.
#[derive(Debug, Clone)]
pub struct BatchNormState {
    pub running_mean: Array1<f64>,
    pub running_var: Array1<f64>,
    pub momentum: f64,
    pub eps: f64,
}

impl BatchNormState {
    pub fn new(dim: usize) -> BatchNormState {
        BatchNormState {
            running_mean: Array1::zeros(dim),
            running_var: Array1::zeros(dim),
            momentum: DEFAULT_MOMENTUM,
            eps: DEFAULT_EPS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchNormCache {
    x_hat: Array2<f64>,
    inv_std: Array1<f64>,
    gamma: Array1<f64>,
    mode: Mode,
}

/// Normalizes each feature column, then applies `gamma · x̂ + beta`.
///
/// In `Mode::Train` the batch mean and (biased) variance are used and folded
/// into `state`. In `Mode::Test` the running statistics are used as is.
/// `x` must have at least one row.
pub fn batchnorm_forward(
    x: &Array2<f64>,
    gamma: &Array1<f64>,
    beta: &Array1<f64>,
    state: &mut BatchNormState,
    mode: Mode,
) -> (Array2<f64>, BatchNormCache) {
    let (mean, var) = match mode {
        Mode::Train => {
            let mean = x
                .mean_axis(Axis(0))
                .unwrap_or_else(|| Array1::zeros(x.ncols()));
            let var = x.var_axis(Axis(0), 0.0);
            let m = state.momentum;
            state.running_mean = &state.running_mean * m + &mean * (1.0 - m);
            state.running_var = &state.running_var * m + &var * (1.0 - m);
            (mean, var)
        }
        Mode::Test => (state.running_mean.clone(), state.running_var.clone()),
    };

    let inv_std = var.mapv(|v| 1.0 / (v + state.eps).sqrt());
    let x_hat = (x - &mean) * &inv_std;
    let out = &x_hat * gamma + beta;

    let cache = BatchNormCache {
        x_hat,
        inv_std,
        gamma: gamma.clone(),
        mode,
    };
    (out, cache)
}

/// Returns `(dx, dgamma, dbeta)`.
///
/// A train-mode cache differentiates through the batch statistics; a
/// test-mode cache treats the running statistics as constants.
pub fn batchnorm_backward(
    dout: &Array2<f64>,
    cache: &BatchNormCache,
) -> (Array2<f64>, Array1<f64>, Array1<f64>) {
    let dbeta = dout.sum_axis(Axis(0));
    let dgamma = (dout * &cache.x_hat).sum_axis(Axis(0));
    let dx_hat = dout * &cache.gamma;

    let dx = match cache.mode {
        Mode::Train => {
            let n = dout.nrows() as f64;
            let sum_dx_hat = dx_hat.sum_axis(Axis(0));
            let sum_dx_hat_x_hat = (&dx_hat * &cache.x_hat).sum_axis(Axis(0));
            (dx_hat * n - &sum_dx_hat - &cache.x_hat * &sum_dx_hat_x_hat) * &cache.inv_std / n
        }
        Mode::Test => dx_hat * &cache.inv_std,
    };
    (dx, dgamma, dbeta)
}
