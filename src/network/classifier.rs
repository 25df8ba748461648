use ndarray::{Array2, ArrayView, ArrayViewD, AsArray, Axis, Dimension};

use crate::error::{NetError, Result};
use crate::math::{flatten_batch, Precision};
use crate::network::params::Params;

/// Result of one pass through a classifier.
#[derive(Debug, Clone)]
pub enum Evaluation {
    /// Inference: class scores of shape `(N, num_classes)`.
    Scores(Array2<f64>),
    /// Training: data loss plus regularization, and a gradient for every
    /// parameter.
    Loss { loss: f64, grads: Params },
}

impl Evaluation {
    pub fn into_scores(self) -> Option<Array2<f64>> {
        match self {
            Evaluation::Scores(s) => Some(s),
            Evaluation::Loss { .. } => None,
        }
    }

    pub fn into_loss(self) -> Option<(f64, Params)> {
        match self {
            Evaluation::Loss { loss, grads } => Some((loss, grads)),
            Evaluation::Scores(_) => None,
        }
    }
}

/// A model the solver can train.
///
/// The solver calls [`compute`](Classifier::compute) with labels, updates
/// [`params_mut`](Classifier::params_mut) from the returned gradients, and
/// repeats. Without labels the call is a pure inference pass.
pub trait Classifier {
    /// Runs a forward pass, and a backward pass when `y` is given.
    fn evaluate(&mut self, x: ArrayViewD<'_, f64>, y: Option<&[usize]>) -> Result<Evaluation>;

    fn params(&self) -> &Params;

    fn params_mut(&mut self) -> &mut Params;

    /// Accepts any batch shape `(N, d1, ..., dk)` whose trailing size is the
    /// configured input dimension.
    fn compute<'a, V, D>(&mut self, x: V, y: Option<&[usize]>) -> Result<Evaluation>
    where
        V: AsArray<'a, f64, D>,
        D: Dimension + 'a,
        Self: Sized,
    {
        let view: ArrayView<'a, f64, D> = x.into();
        self.evaluate(view.into_dyn(), y)
    }

    fn scores<'a, V, D>(&mut self, x: V) -> Result<Array2<f64>>
    where
        V: AsArray<'a, f64, D>,
        D: Dimension + 'a,
        Self: Sized,
    {
        let view: ArrayView<'a, f64, D> = x.into();
        match self.evaluate(view.into_dyn(), None)? {
            Evaluation::Scores(scores) => Ok(scores),
            Evaluation::Loss { .. } => Err(NetError::UnexpectedEvaluation {
                pass: "inference",
                returned: "a loss",
            }),
        }
    }

    fn loss<'a, V, D>(&mut self, x: V, y: &[usize]) -> Result<(f64, Params)>
    where
        V: AsArray<'a, f64, D>,
        D: Dimension + 'a,
        Self: Sized,
    {
        let view: ArrayView<'a, f64, D> = x.into();
        match self.evaluate(view.into_dyn(), Some(y))? {
            Evaluation::Loss { loss, grads } => Ok((loss, grads)),
            Evaluation::Scores(_) => Err(NetError::UnexpectedEvaluation {
                pass: "training",
                returned: "scores",
            }),
        }
    }

    /// Highest-scoring class for every example.
    fn predict<'a, V, D>(&mut self, x: V) -> Result<Vec<usize>>
    where
        V: AsArray<'a, f64, D>,
        D: Dimension + 'a,
        Self: Sized,
    {
        let scores = self.scores(x)?;
        Ok(scores.axis_iter(Axis(0)).map(|row| argmax(row.iter())).collect())
    }
}

/// Flattens `x` to `(N, input_dim)` and rounds it to `precision`.
pub(crate) fn prepare_batch(
    x: ArrayViewD<'_, f64>,
    input_dim: usize,
    precision: Precision,
) -> Result<Array2<f64>> {
    let flat = flatten_batch(x)?;
    if flat.nrows() == 0 {
        return Err(NetError::shape("input batch", "N > 0", flat.dim()));
    }
    if flat.ncols() != input_dim {
        return Err(NetError::shape("input features", input_dim, flat.ncols()));
    }
    Ok(precision.round(flat))
}

/// Index of the first maximum; NaN scores never win.
fn argmax<'a>(values: impl Iterator<Item = &'a f64>) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (i, &v) in values.enumerate() {
        if v > best_value {
            best = i;
            best_value = v;
        }
    }
    best
}
