use log::{debug, trace};
use ndarray::{Array1, ArrayViewD};

use crate::error::Result;
use crate::layers::{
    affine_backward, affine_bn_relu_backward, affine_bn_relu_forward, affine_forward,
    affine_relu_backward, affine_relu_forward, dropout_backward, dropout_forward, AffineBnReluCache,
    AffineCache, AffineReluCache, BatchNormState, DropoutCache, DropoutConfig, Mode,
};
use crate::loss::{softmax_loss, validate_labels};
use crate::math::matrix::{gaussian, make_rng, sum_squares};
use crate::network::classifier::{prepare_batch, Classifier, Evaluation};
use crate::network::config::FcNetConfig;
use crate::network::params::{LayerParams, Layout, NormParams, Params};

/// Main block of one layer; which variant depends on the layer position and
/// whether batch norm is on.
#[derive(Debug)]
enum BlockCache {
    AffineRelu(AffineReluCache),
    AffineBnRelu(AffineBnReluCache),
    Affine(AffineCache),
}

#[derive(Debug)]
struct LayerCache {
    block: BlockCache,
    dropout: Option<DropoutCache>,
}

/// Fully-connected classifier of arbitrary depth:
///
/// `{affine - [batchnorm] - relu - [dropout]} x (L - 1) - affine - softmax`
///
/// Batch-norm running statistics live on the network and are the only state
/// a pass mutates; everything else needed for backprop is rebuilt per call.
#[derive(Debug, Clone)]
pub struct FullyConnectedNet {
    config: FcNetConfig,
    params: Params,
    layout: Layout,
    norm_states: Vec<BatchNormState>,
    dropout: Option<DropoutConfig>,
}

impl FullyConnectedNet {
    pub fn new(config: FcNetConfig) -> Result<FullyConnectedNet> {
        config.validate()?;
        let mut rng = make_rng(config.seed);
        let dims = config.dims();
        let num_layers = config.num_layers();

        let mut layers = Vec::with_capacity(num_layers);
        let mut norm_states = Vec::new();
        for i in 0..num_layers {
            let (fan_in, fan_out) = (dims[i], dims[i + 1]);
            let hidden = i + 1 < num_layers;
            let norm = (hidden && config.use_batchnorm).then(|| {
                norm_states.push(BatchNormState::new(fan_out));
                NormParams {
                    gamma: Array1::ones(fan_out),
                    beta: Array1::zeros(fan_out),
                }
            });
            let weight = gaussian(fan_in, fan_out, config.weight_scale, &mut rng);
            layers.push(LayerParams {
                weight: config.precision.round(weight),
                bias: Array1::zeros(fan_out),
                norm,
            });
        }

        let dropout = (config.dropout > 0.0).then_some(DropoutConfig {
            p: config.dropout,
            seed: config.seed,
        });

        let params = Params { layers };
        let layout = params.layout();
        debug!(
            "fully-connected net {:?}: {} layers, {} parameters, batchnorm={}, dropout={}",
            dims,
            num_layers,
            params.num_parameters(),
            config.use_batchnorm,
            config.dropout
        );

        Ok(FullyConnectedNet {
            config,
            params,
            layout,
            norm_states,
            dropout,
        })
    }

    pub fn config(&self) -> &FcNetConfig {
        &self.config
    }

    pub fn num_layers(&self) -> usize {
        self.params.layers.len()
    }

    /// Running statistics per hidden layer; empty without batch norm.
    pub fn norm_states(&self) -> &[BatchNormState] {
        &self.norm_states
    }

    pub fn dropout(&self) -> Option<&DropoutConfig> {
        self.dropout.as_ref()
    }
}

impl Classifier for FullyConnectedNet {
    fn evaluate(&mut self, x: ArrayViewD<'_, f64>, y: Option<&[usize]>) -> Result<Evaluation> {
        let mode = if y.is_some() { Mode::Train } else { Mode::Test };
        let x = prepare_batch(x, self.config.input_dim, self.config.precision)?;
        if let Some(y) = y {
            validate_labels(y, x.nrows(), self.config.num_classes)?;
        }
        self.params.check_layout(&self.layout)?;
        trace!("fully-connected pass: batch={}, mode={:?}", x.nrows(), mode);

        // Forward
        let num_layers = self.params.layers.len();
        let mut caches = Vec::with_capacity(num_layers);
        let mut out = x;
        for (i, layer) in self.params.layers.iter().enumerate() {
            if i + 1 == num_layers {
                let (scores, cache) = affine_forward(&out, &layer.weight, &layer.bias);
                caches.push(LayerCache {
                    block: BlockCache::Affine(cache),
                    dropout: None,
                });
                out = scores;
                break;
            }

            let (h, block) = match (&layer.norm, self.norm_states.get_mut(i)) {
                (Some(norm), Some(state)) => {
                    let (h, cache) = affine_bn_relu_forward(
                        &out,
                        &layer.weight,
                        &layer.bias,
                        &norm.gamma,
                        &norm.beta,
                        state,
                        mode,
                    );
                    (h, BlockCache::AffineBnRelu(cache))
                }
                _ => {
                    let (h, cache) = affine_relu_forward(&out, &layer.weight, &layer.bias);
                    (h, BlockCache::AffineRelu(cache))
                }
            };

            let (h, dropout) = match &self.dropout {
                Some(config) => {
                    let (h, cache) = dropout_forward(&h, config, mode);
                    (h, Some(cache))
                }
                None => (h, None),
            };

            caches.push(LayerCache { block, dropout });
            out = h;
        }
        let scores = out;

        let Some(y) = y else {
            return Ok(Evaluation::Scores(scores));
        };

        // Backward
        let reg = self.config.reg;
        let (mut loss, mut dout) = softmax_loss(&scores, y)?;
        let mut grads = Vec::with_capacity(num_layers);

        for (layer, cache) in self.params.layers.iter().zip(&caches).rev() {
            if let Some(dropout) = &cache.dropout {
                dout = dropout_backward(&dout, dropout);
            }

            let (dx, dweight, dbias, norm) = match &cache.block {
                BlockCache::Affine(c) => {
                    let (dx, dw, db) = affine_backward(&dout, c);
                    (dx, dw, db, None)
                }
                BlockCache::AffineRelu(c) => {
                    let (dx, dw, db) = affine_relu_backward(&dout, c);
                    (dx, dw, db, None)
                }
                BlockCache::AffineBnRelu(c) => {
                    let g = affine_bn_relu_backward(&dout, c);
                    let norm = NormParams {
                        gamma: g.dgamma,
                        beta: g.dbeta,
                    };
                    (g.dx, g.dweight, g.dbias, Some(norm))
                }
            };

            loss += 0.5 * reg * sum_squares(&layer.weight);
            grads.push(LayerParams {
                weight: dweight + &layer.weight * reg,
                bias: dbias,
                norm,
            });
            dout = dx;
        }
        grads.reverse();

        Ok(Evaluation::Loss {
            loss,
            grads: Params { layers: grads },
        })
    }

    fn params(&self) -> &Params {
        &self.params
    }

    fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetError;
    use crate::gradient_check::rel_error;
    use crate::math::Precision;
    use crate::optim::Sgd;
    use ndarray::Array2;

    fn config(hidden_dims: Vec<usize>) -> FcNetConfig {
        FcNetConfig {
            hidden_dims,
            input_dim: 6,
            num_classes: 4,
            weight_scale: 0.3,
            seed: Some(123),
            ..Default::default()
        }
    }

    fn batch(n: usize) -> (Array2<f64>, Vec<usize>) {
        let mut rng = make_rng(Some(7));
        let x = gaussian(n, 6, 1.0, &mut rng);
        let y = (0..n).map(|i| i % 4).collect();
        (x, y)
    }

    #[test]
    fn parameter_names_follow_configuration() {
        let mut cfg = config(vec![5, 3]);
        cfg.use_batchnorm = true;
        let net = FullyConnectedNet::new(cfg).unwrap();
        let names: Vec<String> = net.params().names().iter().map(|n| n.to_string()).collect();
        assert_eq!(
            names,
            ["W1", "b1", "gamma1", "beta1", "W2", "b2", "gamma2", "beta2", "W3", "b3"]
        );
        assert_eq!(net.norm_states().len(), 2);
        assert_eq!(net.params().layers[2].weight.dim(), (3, 4));
    }

    #[test]
    fn zero_hidden_layers_is_a_single_affine_layer() {
        let net = FullyConnectedNet::new(config(vec![])).unwrap();
        let names: Vec<String> = net.params().names().iter().map(|n| n.to_string()).collect();
        assert_eq!(names, ["W1", "b1"]);
        assert_eq!(net.params().layers[0].weight.dim(), (6, 4));
        assert!(net.norm_states().is_empty());
    }

    #[test]
    fn zero_hidden_layers_matches_plain_softmax() {
        let mut cfg = config(vec![]);
        cfg.reg = 0.3;
        let mut net = FullyConnectedNet::new(cfg).unwrap();
        net.params_mut().layers[0].bias.fill(0.25);
        let (x, y) = batch(5);

        let (loss, _) = net.loss(&x, &y).unwrap();
        let layer = &net.params().layers[0];
        let (data_loss, _) = softmax_loss(&(x.dot(&layer.weight) + &layer.bias), &y).unwrap();
        let expected = data_loss + 0.5 * 0.3 * net.params().weight_squares();
        assert!((loss - expected).abs() < 1e-12);
    }

    #[test]
    fn scores_shape_in_test_mode() {
        let mut net = FullyConnectedNet::new(config(vec![8, 8, 8])).unwrap();
        let (x, _) = batch(3);
        assert_eq!(net.scores(&x).unwrap().dim(), (3, 4));
    }

    #[test]
    fn gradients_mirror_parameters_with_batchnorm() {
        let mut cfg = config(vec![5, 4]);
        cfg.use_batchnorm = true;
        cfg.dropout = 0.2;
        let mut net = FullyConnectedNet::new(cfg).unwrap();
        let (x, y) = batch(8);
        let (_, grads) = net.loss(&x, &y).unwrap();
        assert_eq!(grads.layout(), net.params().layout());
    }

    #[test]
    fn zero_dropout_matches_no_dropout() {
        let mut with = FullyConnectedNet::new(config(vec![7])).unwrap();
        let mut without = with.clone();
        with.dropout = Some(DropoutConfig { p: 0.0, seed: None });
        let (x, y) = batch(6);

        assert_eq!(with.scores(&x).unwrap(), without.scores(&x).unwrap());
        let (a, _) = with.loss(&x, &y).unwrap();
        let (b, _) = without.loss(&x, &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn dropout_is_disabled_at_test_time() {
        let mut cfg = config(vec![7]);
        cfg.dropout = 0.5;
        let mut dropped = FullyConnectedNet::new(cfg).unwrap();
        let mut plain = FullyConnectedNet::new(config(vec![7])).unwrap();
        let (x, _) = batch(4);
        assert_eq!(dropped.scores(&x).unwrap(), plain.scores(&x).unwrap());
    }

    #[test]
    fn batchnorm_state_changes_only_in_train_mode() {
        let mut cfg = config(vec![5]);
        cfg.use_batchnorm = true;
        let mut net = FullyConnectedNet::new(cfg).unwrap();
        let (x, y) = batch(10);

        net.scores(&x).unwrap();
        assert!(net.norm_states()[0].running_mean.iter().all(|&v| v == 0.0));

        net.loss(&x, &y).unwrap();
        let after_train = net.norm_states()[0].clone();
        assert!(after_train.running_var.iter().any(|&v| v > 0.0));

        net.scores(&x).unwrap();
        assert_eq!(net.norm_states()[0].running_mean, after_train.running_mean);
        assert_eq!(net.norm_states()[0].running_var, after_train.running_var);
    }

    #[test]
    fn batchnorm_params_are_not_regularized() {
        let mut cfg = config(vec![5]);
        cfg.use_batchnorm = true;
        cfg.reg = 2.0;
        let mut net = FullyConnectedNet::new(cfg).unwrap();
        let (x, y) = batch(6);
        let (_, grads) = net.loss(&x, &y).unwrap();

        net.config.reg = 0.0;
        let (_, plain) = net.loss(&x, &y).unwrap();
        let norm = grads.layers[0].norm.as_ref().unwrap();
        let plain_norm = plain.layers[0].norm.as_ref().unwrap();
        // Running statistics differ between the calls but do not enter the
        // train-mode gradient, so gamma/beta gradients must be identical.
        assert!(rel_error(&norm.gamma, &plain_norm.gamma) < 1e-12);
        assert!(rel_error(&norm.beta, &plain_norm.beta) < 1e-12);
        assert!(rel_error(&grads.layers[0].bias, &plain.layers[0].bias) < 1e-12);
    }

    #[test]
    fn single_precision_rounds_weights() {
        let mut cfg = config(vec![3]);
        cfg.precision = Precision::Single;
        let net = FullyConnectedNet::new(cfg).unwrap();
        let w = &net.params().layers[0].weight;
        assert!(w.iter().all(|&v| v == v as f32 as f64));
    }

    #[test]
    fn single_precision_is_not_reapplied_after_an_update() {
        let mut cfg = config(vec![3]);
        cfg.precision = Precision::Single;
        let mut net = FullyConnectedNet::new(cfg).unwrap();
        let (x, y) = batch(4);
        let (_, grads) = net.loss(&x, &y).unwrap();
        Sgd::new(1e-3).step(net.params_mut(), &grads).unwrap();
        let w = &net.params().layers[0].weight;
        assert!(w.iter().any(|&v| v != v as f32 as f64));
    }

    #[test]
    fn rejects_invalid_construction_and_labels() {
        let mut cfg = config(vec![5]);
        cfg.dropout = 1.5;
        assert!(matches!(
            FullyConnectedNet::new(cfg),
            Err(NetError::InvalidConfiguration(_))
        ));

        let mut net = FullyConnectedNet::new(config(vec![5])).unwrap();
        let (x, _) = batch(3);
        assert!(matches!(
            net.loss(&x, &[0, 9, 1]),
            Err(NetError::OutOfRangeLabel { index: 1, label: 9, num_classes: 4 })
        ));
    }
}
