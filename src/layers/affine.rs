use ndarray::{Array1, Array2, Axis};

/// Inputs of an affine layer, kept for the backward pass.
#[derive(Debug, Clone)]
pub struct AffineCache {
    input: Array2<f64>,
    weight: Array2<f64>,
}

/// `z = x·W + b`, with `b` broadcast over the batch rows.
///
/// Shapes: `x` is `(N, D)`, `weight` is `(D, M)`, `bias` is `(M,)`.
pub fn affine_forward(
    x: &Array2<f64>,
    weight: &Array2<f64>,
    bias: &Array1<f64>,
) -> (Array2<f64>, AffineCache) {
    let out = x.dot(weight) + bias;
    let cache = AffineCache {
        input: x.clone(),
        weight: weight.clone(),
    };
    (out, cache)
}

/// Returns `(dx, dW, db)` for upstream gradient `dout` of shape `(N, M)`.
pub fn affine_backward(
    dout: &Array2<f64>,
    cache: &AffineCache,
) -> (Array2<f64>, Array2<f64>, Array1<f64>) {
    let dx = dout.dot(&cache.weight.t());
    let dw = cache.input.t().dot(dout);
    let db = dout.sum_axis(Axis(0));
    (dx, dw, db)
}
