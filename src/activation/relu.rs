use ndarray::Array2;

/// Pre-activation input of a ReLU, kept for the backward pass.
#[derive(Debug, Clone)]
pub struct ReluCache {
    input: Array2<f64>,
}

/// Element-wise `max(0, x)`.
pub fn relu_forward(x: &Array2<f64>) -> (Array2<f64>, ReluCache) {
    let out = x.mapv(|v| if v > 0.0 { v } else { 0.0 });
    (out, ReluCache { input: x.clone() })
}

/// Routes `dout` through only where the forward input was positive.
pub fn relu_backward(dout: &Array2<f64>, cache: &ReluCache) -> Array2<f64> {
    let mut dx = dout.clone();
    dx.zip_mut_with(&cache.input, |d, &x| {
        if x <= 0.0 {
            *d = 0.0;
        }
    });
    dx
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn forward_clamps_negatives() {
        let (out, _) = relu_forward(&array![[-1.0, 0.0, 2.5]]);
        assert_eq!(out, array![[0.0, 0.0, 2.5]]);
    }

    #[test]
    fn backward_masks_non_positive_inputs() {
        let (_, cache) = relu_forward(&array![[-1.0, 0.0, 2.5], [3.0, -0.1, 1.0]]);
        let dx = relu_backward(&array![[1.0, 1.0, 1.0], [2.0, 2.0, 2.0]], &cache);
        assert_eq!(dx, array![[0.0, 0.0, 1.0], [2.0, 0.0, 2.0]]);
    }
}
