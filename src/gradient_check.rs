//! Finite-difference gradient checking.
//!
//! Used to validate the hand-written backward passes: perturb one element at
//! a time, re-evaluate a scalar function, and compare against the analytic
//! gradient with [`rel_error`].

use ndarray::{Array, Dimension, IntoDimension, Zip};

/// Centered-difference estimate of `∂f/∂x`.
///
/// `f` is evaluated on a perturbed copy of `x`, so the caller's array is
/// never modified. Each element costs two evaluations of `f`.
pub fn numerical_gradient<D, F>(x: &Array<f64, D>, h: f64, mut f: F) -> Array<f64, D>
where
    D: Dimension,
    F: FnMut(&Array<f64, D>) -> f64,
{
    let mut xp = x.clone();
    let mut grad = Array::zeros(x.raw_dim());
    for (idx, &orig) in x.indexed_iter() {
        let idx = idx.into_dimension();
        xp[idx.clone()] = orig + h;
        let plus = f(&xp);
        xp[idx.clone()] = orig - h;
        let minus = f(&xp);
        xp[idx.clone()] = orig;
        grad[idx] = (plus - minus) / (2.0 * h);
    }
    grad
}

/// Largest element-wise relative error `|a − b| / max(1e-8, |a| + |b|)`.
///
/// Panics if `a` and `b` differ in shape.
pub fn rel_error<D: Dimension>(a: &Array<f64, D>, b: &Array<f64, D>) -> f64 {
    let mut worst = 0.0_f64;
    Zip::from(a).and(b).for_each(|&x, &y| {
        let err = (x - y).abs() / (x.abs() + y.abs()).max(1e-8);
        worst = worst.max(err);
    });
    worst
}
