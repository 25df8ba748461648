use ndarray::{Array2, ArrayView1, Axis};

use crate::error::{NetError, Result};
use crate::math::matrix::sum_squares;

/// Checks that `y` holds one in-range class per example.
pub fn validate_labels(y: &[usize], n: usize, num_classes: usize) -> Result<()> {
    if y.len() != n {
        return Err(NetError::shape("labels", n, y.len()));
    }
    match y.iter().position(|&label| label >= num_classes) {
        Some(index) => Err(NetError::OutOfRangeLabel {
            index,
            label: y[index],
            num_classes,
        }),
        None => Ok(()),
    }
}

fn validate_linear(w: &Array2<f64>, x: &Array2<f64>, y: &[usize]) -> Result<()> {
    if x.nrows() == 0 {
        return Err(NetError::shape("softmax batch", "N > 0", x.dim()));
    }
    if x.ncols() != w.nrows() {
        return Err(NetError::shape("softmax weights", (x.ncols(), w.ncols()), w.dim()));
    }
    validate_labels(y, x.nrows(), w.ncols())
}

/// Softmax cross-entropy over a precomputed score matrix.
///
/// Returns the mean loss `−(1/N)·Σ log softmax(s_i)[y_i]` and its gradient
/// with respect to `scores`, `(probs − onehot(y)) / N`. Each row is shifted
/// by its maximum before exponentiation.
pub fn softmax_loss(scores: &Array2<f64>, y: &[usize]) -> Result<(f64, Array2<f64>)> {
    let (n, c) = scores.dim();
    if n == 0 {
        return Err(NetError::shape("scores", "N > 0", scores.dim()));
    }
    validate_labels(y, n, c)?;

    let row_max = scores
        .fold_axis(Axis(1), f64::NEG_INFINITY, |&acc, &v| acc.max(v))
        .insert_axis(Axis(1));
    let shifted = scores - &row_max;
    let exp = shifted.mapv(f64::exp);
    let denom = exp.sum_axis(Axis(1)).insert_axis(Axis(1));

    let mut loss = 0.0;
    for (i, &label) in y.iter().enumerate() {
        loss += denom[[i, 0]].ln() - shifted[[i, label]];
    }

    let mut dscores = exp / &denom;
    for (i, &label) in y.iter().enumerate() {
        dscores[[i, label]] -= 1.0;
    }

    let n = n as f64;
    Ok((loss / n, dscores / n))
}

/// Linear softmax classifier loss, one example and one class at a time.
///
/// `w` is `(D, C)`, `x` is `(N, D)`. Adds `reg·ΣW²` to the loss and
/// `2·reg·W` to the gradient.
pub fn softmax_loss_naive(
    w: &Array2<f64>,
    x: &Array2<f64>,
    y: &[usize],
    reg: f64,
) -> Result<(f64, Array2<f64>)> {
    validate_linear(w, x, y)?;
    let (n, d) = x.dim();
    let c = w.ncols();

    let mut loss = 0.0;
    let mut dw = Array2::<f64>::zeros((d, c));

    for i in 0..n {
        let xi: ArrayView1<f64> = x.row(i);
        let mut f = vec![0.0; c];
        for (j, fj) in f.iter_mut().enumerate() {
            for k in 0..d {
                *fj += xi[k] * w[[k, j]];
            }
        }
        let max = f.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        for fj in f.iter_mut() {
            *fj -= max;
        }

        let denom: f64 = f.iter().map(|v| v.exp()).sum();
        loss += -f[y[i]] + denom.ln();

        for (j, fj) in f.iter().enumerate() {
            let prob = fj.exp() / denom;
            let coeff = if j == y[i] { prob - 1.0 } else { prob };
            for k in 0..d {
                dw[[k, j]] += coeff * xi[k];
            }
        }
    }

    let n = n as f64;
    loss /= n;
    dw /= n;

    loss += reg * sum_squares(w);
    dw = dw + w * (2.0 * reg);

    Ok((loss, dw))
}

/// Same result as [`softmax_loss_naive`], computed with whole-array operations.
pub fn softmax_loss_vectorized(
    w: &Array2<f64>,
    x: &Array2<f64>,
    y: &[usize],
    reg: f64,
) -> Result<(f64, Array2<f64>)> {
    validate_linear(w, x, y)?;

    let scores = x.dot(w);
    let (data_loss, dscores) = softmax_loss(&scores, y)?;
    let dw = x.t().dot(&dscores) + w * (2.0 * reg);

    Ok((data_loss + reg * sum_squares(w), dw))
}
