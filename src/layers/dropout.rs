use ndarray::Array2;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

use super::Mode;
use crate::math::matrix::make_rng;

/// Inverted dropout settings shared by every dropout step of a network.
///
/// `p` is the probability of dropping a unit. With a `seed`, every forward
/// call draws the same mask for the same input shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropoutConfig {
    pub p: f64,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct DropoutCache {
    /// `None` in test mode, where dropout is the identity.
    mask: Option<Array2<f64>>,
}

/// Train mode keeps each unit with probability `1 − p` and scales survivors
/// by `1 / (1 − p)`, so test mode can pass activations through unchanged.
pub fn dropout_forward(
    x: &Array2<f64>,
    config: &DropoutConfig,
    mode: Mode,
) -> (Array2<f64>, DropoutCache) {
    match mode {
        Mode::Train => {
            let mut rng = make_rng(config.seed);
            let keep = 1.0 - config.p;
            let mask = Array2::random_using(x.raw_dim(), Uniform::new(0.0, 1.0), &mut rng)
                .mapv_into(|u| if u >= config.p { 1.0 / keep } else { 0.0 });
            let out = x * &mask;
            (out, DropoutCache { mask: Some(mask) })
        }
        Mode::Test => (x.clone(), DropoutCache { mask: None }),
    }
}

pub fn dropout_backward(dout: &Array2<f64>, cache: &DropoutCache) -> Array2<f64> {
    match &cache.mask {
        Some(mask) => dout * mask,
        None => dout.clone(),
    }
}
