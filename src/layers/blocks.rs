//! Fused hidden-layer blocks: affine → ReLU and affine → batchnorm → ReLU.

use ndarray::{Array1, Array2};

use super::affine::{affine_backward, affine_forward, AffineCache};
use super::batchnorm::{batchnorm_backward, batchnorm_forward, BatchNormCache, BatchNormState};
use super::Mode;
use crate::activation::relu::{relu_backward, relu_forward, ReluCache};

#[derive(Debug, Clone)]
pub struct AffineReluCache {
    affine: AffineCache,
    relu: ReluCache,
}

pub fn affine_relu_forward(
    x: &Array2<f64>,
    weight: &Array2<f64>,
    bias: &Array1<f64>,
) -> (Array2<f64>, AffineReluCache) {
    let (z, affine) = affine_forward(x, weight, bias);
    let (out, relu) = relu_forward(&z);
    (out, AffineReluCache { affine, relu })
}

pub fn affine_relu_backward(
    dout: &Array2<f64>,
    cache: &AffineReluCache,
) -> (Array2<f64>, Array2<f64>, Array1<f64>) {
    let dz = relu_backward(dout, &cache.relu);
    affine_backward(&dz, &cache.affine)
}

#[derive(Debug, Clone)]
pub struct AffineBnReluCache {
    affine: AffineCache,
    norm: BatchNormCache,
    relu: ReluCache,
}

/// Gradients of an affine → batchnorm → ReLU block.
#[derive(Debug, Clone)]
pub struct AffineBnReluGrads {
    pub dx: Array2<f64>,
    pub dweight: Array2<f64>,
    pub dbias: Array1<f64>,
    pub dgamma: Array1<f64>,
    pub dbeta: Array1<f64>,
}

pub fn affine_bn_relu_forward(
    x: &Array2<f64>,
    weight: &Array2<f64>,
    bias: &Array1<f64>,
    gamma: &Array1<f64>,
    beta: &Array1<f64>,
    state: &mut BatchNormState,
    mode: Mode,
) -> (Array2<f64>, AffineBnReluCache) {
    let (z, affine) = affine_forward(x, weight, bias);
    let (zn, norm) = batchnorm_forward(&z, gamma, beta, state, mode);
    let (out, relu) = relu_forward(&zn);
    (out, AffineBnReluCache { affine, norm, relu })
}

pub fn affine_bn_relu_backward(dout: &Array2<f64>, cache: &AffineBnReluCache) -> AffineBnReluGrads {
    let dzn = relu_backward(dout, &cache.relu);
    let (dz, dgamma, dbeta) = batchnorm_backward(&dzn, &cache.norm);
    let (dx, dweight, dbias) = affine_backward(&dz, &cache.affine);
    AffineBnReluGrads {
        dx,
        dweight,
        dbias,
        dgamma,
        dbeta,
    }
}
