pub mod affine;
pub mod batchnorm;
pub mod blocks;
pub mod dropout;

pub use affine::{affine_backward, affine_forward, AffineCache};
pub use batchnorm::{batchnorm_backward, batchnorm_forward, BatchNormCache, BatchNormState};
pub use blocks::{
    affine_bn_relu_backward, affine_bn_relu_forward, affine_relu_backward, affine_relu_forward,
    AffineBnReluCache, AffineBnReluGrads, AffineReluCache,
};
pub use dropout::{dropout_backward, dropout_forward, DropoutCache, DropoutConfig};

/// Whether a pass is training (batch statistics, stochastic dropout) or
/// inference (running statistics, dropout disabled).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    Test,
}
