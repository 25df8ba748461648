use std::fmt;

use ndarray::{Array1, Array2, ArrayViewD, ArrayViewMutD};

use crate::error::{NetError, Result};
use crate::math::matrix::sum_squares;

/// Batch-norm scale and shift of one hidden layer.
#[derive(Debug, Clone, PartialEq)]
pub struct NormParams {
    pub gamma: Array1<f64>,
    pub beta: Array1<f64>,
}

/// Learnable parameters of one affine layer (plus its batch norm, if any).
#[derive(Debug, Clone, PartialEq)]
pub struct LayerParams {
    /// `(fan_in, fan_out)`
    pub weight: Array2<f64>,
    pub bias: Array1<f64>,
    pub norm: Option<NormParams>,
}

/// All parameters of a network, ordered input → output.
///
/// `layers[0]` is layer 1. The same type carries gradients: a backward pass
/// returns a `Params` with the same layers, fields and shapes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Params {
    pub layers: Vec<LayerParams>,
}

/// Stable name of a single parameter array. Layer numbers are 1-based and
/// display as `W1`, `b1`, `gamma1`, `beta1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParamName {
    Weight(usize),
    Bias(usize),
    Gamma(usize),
    Beta(usize),
}

impl ParamName {
    pub fn layer(self) -> usize {
        match self {
            ParamName::Weight(l) | ParamName::Bias(l) | ParamName::Gamma(l) | ParamName::Beta(l) => l,
        }
    }
}

impl fmt::Display for ParamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamName::Weight(l) => write!(f, "W{l}"),
            ParamName::Bias(l) => write!(f, "b{l}"),
            ParamName::Gamma(l) => write!(f, "gamma{l}"),
            ParamName::Beta(l) => write!(f, "beta{l}"),
        }
    }
}

/// Name and shape of every parameter, in a fixed order.
pub type Layout = Vec<(ParamName, Vec<usize>)>;

impl Params {
    pub fn names(&self) -> Vec<ParamName> {
        self.layout().into_iter().map(|(name, _)| name).collect()
    }

    pub fn layout(&self) -> Layout {
        let mut out = Vec::new();
        for (i, layer) in self.layers.iter().enumerate() {
            let l = i + 1;
            out.push((ParamName::Weight(l), layer.weight.shape().to_vec()));
            out.push((ParamName::Bias(l), layer.bias.shape().to_vec()));
            if let Some(norm) = &layer.norm {
                out.push((ParamName::Gamma(l), norm.gamma.shape().to_vec()));
                out.push((ParamName::Beta(l), norm.beta.shape().to_vec()));
            }
        }
        out
    }

    /// Fails if any array was added, removed or reshaped relative to `expected`.
    pub fn check_layout(&self, expected: &Layout) -> Result<()> {
        let actual = self.layout();
        if actual.len() != expected.len() {
            return Err(NetError::shape("parameter count", expected.len(), actual.len()));
        }
        for ((name, shape), (want_name, want_shape)) in actual.iter().zip(expected) {
            if name != want_name || shape != want_shape {
                return Err(NetError::ShapeMismatch {
                    context: "parameters",
                    expected: format!("{want_name} {want_shape:?}"),
                    found: format!("{name} {shape:?}"),
                });
            }
        }
        Ok(())
    }

    pub fn get(&self, name: ParamName) -> Option<ArrayViewD<'_, f64>> {
        let layer = self.layers.get(name.layer().checked_sub(1)?)?;
        match name {
            ParamName::Weight(_) => Some(layer.weight.view().into_dyn()),
            ParamName::Bias(_) => Some(layer.bias.view().into_dyn()),
            ParamName::Gamma(_) => layer.norm.as_ref().map(|n| n.gamma.view().into_dyn()),
            ParamName::Beta(_) => layer.norm.as_ref().map(|n| n.beta.view().into_dyn()),
        }
    }

    pub fn get_mut(&mut self, name: ParamName) -> Option<ArrayViewMutD<'_, f64>> {
        let layer = self.layers.get_mut(name.layer().checked_sub(1)?)?;
        match name {
            ParamName::Weight(_) => Some(layer.weight.view_mut().into_dyn()),
            ParamName::Bias(_) => Some(layer.bias.view_mut().into_dyn()),
            ParamName::Gamma(_) => layer.norm.as_mut().map(|n| n.gamma.view_mut().into_dyn()),
            ParamName::Beta(_) => layer.norm.as_mut().map(|n| n.beta.view_mut().into_dyn()),
        }
    }

    /// Σ‖W_i‖² over every weight matrix. Biases and batch-norm parameters
    /// are excluded.
    pub fn weight_squares(&self) -> f64 {
        self.layers.iter().map(|l| sum_squares(&l.weight)).sum()
    }

    pub fn num_parameters(&self) -> usize {
        self.layout()
            .iter()
            .map(|(_, shape)| shape.iter().product::<usize>())
            .sum()
    }
}
