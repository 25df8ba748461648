// Numerically checks the backward pass of a fully-connected network.
//
//   cargo run -- [config.json]
//
// Without an argument a small 15 → 20 → 30 → 10 network is used. Set
// RUST_LOG=debug to see construction details.
use std::env;
use std::process::ExitCode;

use log::{error, info, warn};
use softmax_nn::gradient_check::{numerical_gradient, rel_error};
use softmax_nn::math::matrix::{gaussian, make_rng};
use softmax_nn::{Classifier, FcNetConfig, FullyConnectedNet};

const BATCH: usize = 2;

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("softmax-nn: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> softmax_nn::Result<()> {
    let config = match env::args().nth(1) {
        Some(path) => {
            info!("loading configuration from {path}");
            FcNetConfig::load_json(&path)?
        }
        None => FcNetConfig {
            hidden_dims: vec![20, 30],
            input_dim: 15,
            num_classes: 10,
            weight_scale: 5e-2,
            seed: Some(0),
            ..Default::default()
        },
    };
    if config.dropout > 0.0 && config.seed.is_none() {
        warn!("dropout without a seed draws a new mask per evaluation; expect large errors");
    }

    let mut net = FullyConnectedNet::new(config.clone())?;
    let mut rng = make_rng(config.seed);
    let x = gaussian(BATCH, config.input_dim, 1.0, &mut rng);
    let y: Vec<usize> = (0..BATCH).map(|i| i % config.num_classes).collect();

    let (loss, grads) = net.loss(&x, &y)?;
    println!("initial loss: {loss:.6}");

    for name in net.params().names() {
        let (Some(original), Some(analytic)) = (net.params().get(name), grads.get(name)) else {
            continue;
        };
        let original = original.to_owned();
        let analytic = analytic.to_owned();

        let numeric = numerical_gradient(&original, 1e-5, |perturbed| {
            if let Some(mut slot) = net.params_mut().get_mut(name) {
                slot.assign(perturbed);
            }
            net.loss(&x, &y).map(|(l, _)| l).unwrap_or(f64::NAN)
        });
        if let Some(mut slot) = net.params_mut().get_mut(name) {
            slot.assign(&original);
        }

        println!(
            "{:>8} relative error: {:.2e}",
            name.to_string(),
            rel_error(&analytic, &numeric)
        );
    }
    Ok(())
}
