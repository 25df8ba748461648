use ndarray::{Array, Array2, ArrayView, Dimension, Ix2};
use ndarray_rand::rand_distr::StandardNormal;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{NetError, Result};

/// Numeric precision that parameters and inputs are stored at.
///
/// Arithmetic always runs in `f64`. `Single` rounds every parameter at
/// construction and every input batch on entry to the nearest `f32`.
/// Gradients are not rounded, and neither are parameters written by a
/// solver, so after the first update the weights are full `f64` again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    Single,
    #[default]
    Double,
}

impl Precision {
    pub fn round<D: Dimension>(self, a: Array<f64, D>) -> Array<f64, D> {
        match self {
            Precision::Single => a.mapv_into(|v| v as f32 as f64),
            Precision::Double => a,
        }
    }
}

/// Builds the generator used for weight initialization and dropout masks.
/// A fixed seed makes runs reproducible; `None` draws from OS entropy.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// Samples a `(rows, cols)` matrix from N(0, scale²).
pub fn gaussian(rows: usize, cols: usize, scale: f64, rng: &mut StdRng) -> Array2<f64> {
    Array2::random_using((rows, cols), StandardNormal, rng) * scale
}

/// Reshapes a batch `(N, d1, ..., dk)` into `(N, d1 * ... * dk)`.
///
/// Elements are taken in logical (row-major) order regardless of the memory
/// layout of `x`.
pub fn flatten_batch<D: Dimension>(x: ArrayView<'_, f64, D>) -> Result<Array2<f64>> {
    let shape = x.shape();
    if shape.is_empty() {
        return Err(NetError::shape("input batch", "(N, ...)", shape));
    }
    let n = shape[0];
    let d: usize = shape[1..].iter().product();
    if let Ok(view) = x.view().into_dimensionality::<Ix2>() {
        return Ok(view.to_owned());
    }
    Array2::from_shape_vec((n, d), x.iter().copied().collect())
        .map_err(|_| NetError::shape("input batch", (n, d), shape))
}

/// Σ a², the squared Frobenius norm used by L2 regularization.
pub fn sum_squares<D: Dimension>(a: &Array<f64, D>) -> f64 {
    a.iter().map(|v| v * v).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array3};

    #[test]
    fn flatten_keeps_row_major_order() {
        let x = Array3::from_shape_fn((2, 2, 3), |(i, j, k)| (i * 6 + j * 3 + k) as f64);
        let flat = flatten_batch(x.view()).unwrap();
        assert_eq!(flat.dim(), (2, 6));
        assert_eq!(flat[[1, 0]], 6.0);
        assert_eq!(flat[[1, 5]], 11.0);
    }

    #[test]
    fn flatten_handles_transposed_views() {
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let flat = flatten_batch(a.t()).unwrap();
        assert_eq!(flat, array![[1.0, 3.0], [2.0, 4.0]]);
    }

    #[test]
    fn seeded_gaussian_is_reproducible() {
        let a = gaussian(3, 4, 0.5, &mut make_rng(Some(7)));
        let b = gaussian(3, 4, 0.5, &mut make_rng(Some(7)));
        assert_eq!(a, b);
    }

    #[test]
    fn single_precision_rounds_values() {
        let a = Precision::Single.round(array![0.1_f64]);
        assert_eq!(a[0], 0.1_f32 as f64);
        assert_ne!(a[0], 0.1);
    }
}
