/// Trains a small fully-connected network on three Gaussian blobs.
///
/// Architecture: 4 → 32 (BN, ReLU) → 32 (BN, ReLU) → 3
/// Optimizer:    SGD, lr = 0.2, full batch
///
/// Run with:
///   cargo run --example overfit
use ndarray::{Array2, Axis};
use softmax_nn::math::matrix::{gaussian, make_rng};
use softmax_nn::{Classifier, FcNetConfig, FullyConnectedNet, Sgd};

const PER_CLASS: usize = 40;
const CLASSES: usize = 3;
const DIM: usize = 4;

fn blobs() -> (Array2<f64>, Vec<usize>) {
    let mut rng = make_rng(Some(2024));
    let mut x = gaussian(PER_CLASS * CLASSES, DIM, 0.6, &mut rng);
    let mut y = Vec::with_capacity(PER_CLASS * CLASSES);
    for (i, mut row) in x.axis_iter_mut(Axis(0)).enumerate() {
        let class = i / PER_CLASS;
        row[class] += 2.0;
        y.push(class);
    }
    (x, y)
}

fn main() -> softmax_nn::Result<()> {
    env_logger::init();

    let (x, y) = blobs();
    let mut net = FullyConnectedNet::new(FcNetConfig {
        hidden_dims: vec![32, 32],
        input_dim: DIM,
        num_classes: CLASSES,
        use_batchnorm: true,
        reg: 1e-3,
        weight_scale: 0.1,
        seed: Some(1),
        ..Default::default()
    })?;
    let optimizer = Sgd::new(0.2);

    for step in 0..300 {
        let (loss, grads) = net.loss(&x, &y)?;
        optimizer.step(net.params_mut(), &grads)?;
        if step % 50 == 0 {
            println!("Step {step}: loss = {loss:.6}");
        }
    }

    let predicted = net.predict(&x)?;
    let correct = predicted.iter().zip(&y).filter(|(p, t)| p == t).count();
    println!(
        "Training accuracy: {:.1}%",
        100.0 * correct as f64 / y.len() as f64
    );
    Ok(())
}
