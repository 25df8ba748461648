use log::{debug, trace};
use ndarray::{Array1, ArrayViewD};

use crate::error::Result;
use crate::layers::{affine_backward, affine_forward, affine_relu_backward, affine_relu_forward};
use crate::loss::{softmax_loss, validate_labels};
use crate::math::matrix::{gaussian, make_rng};
use crate::math::Precision;
use crate::network::classifier::{prepare_batch, Classifier, Evaluation};
use crate::network::config::TwoLayerConfig;
use crate::network::params::{LayerParams, Layout, Params};

/// `affine - relu - affine - softmax` classifier.
///
/// Parameters are `W1 (D, H)`, `b1 (H,)`, `W2 (H, C)`, `b2 (C,)`.
#[derive(Debug, Clone)]
pub struct TwoLayerNet {
    config: TwoLayerConfig,
    params: Params,
    layout: Layout,
}

impl TwoLayerNet {
    pub fn new(config: TwoLayerConfig) -> Result<TwoLayerNet> {
        config.validate()?;
        let mut rng = make_rng(config.seed);
        let (d, h, c) = (config.input_dim, config.hidden_dim, config.num_classes);

        let params = Params {
            layers: vec![
                LayerParams {
                    weight: gaussian(d, h, config.weight_scale, &mut rng),
                    bias: Array1::zeros(h),
                    norm: None,
                },
                LayerParams {
                    weight: gaussian(h, c, config.weight_scale, &mut rng),
                    bias: Array1::zeros(c),
                    norm: None,
                },
            ],
        };
        let layout = params.layout();
        debug!(
            "two-layer net {}x{}x{}: {} parameters, reg={}",
            d,
            h,
            c,
            params.num_parameters(),
            config.reg
        );

        Ok(TwoLayerNet {
            config,
            params,
            layout,
        })
    }

    pub fn config(&self) -> &TwoLayerConfig {
        &self.config
    }
}

impl Classifier for TwoLayerNet {
    fn evaluate(&mut self, x: ArrayViewD<'_, f64>, y: Option<&[usize]>) -> Result<Evaluation> {
        let x = prepare_batch(x, self.config.input_dim, Precision::Double)?;
        if let Some(y) = y {
            validate_labels(y, x.nrows(), self.config.num_classes)?;
        }
        self.params.check_layout(&self.layout)?;
        trace!("two-layer pass: batch={}, labels={}", x.nrows(), y.is_some());

        let hidden = &self.params.layers[0];
        let output = &self.params.layers[1];

        let (h, h_cache) = affine_relu_forward(&x, &hidden.weight, &hidden.bias);
        let (scores, out_cache) = affine_forward(&h, &output.weight, &output.bias);

        let Some(y) = y else {
            return Ok(Evaluation::Scores(scores));
        };

        let (data_loss, dscores) = softmax_loss(&scores, y)?;
        let (dh, dw2, db2) = affine_backward(&dscores, &out_cache);
        let (_, dw1, db1) = affine_relu_backward(&dh, &h_cache);

        let reg = self.config.reg;
        let loss = data_loss + 0.5 * reg * self.params.weight_squares();
        let grads = Params {
            layers: vec![
                LayerParams {
                    weight: dw1 + &hidden.weight * reg,
                    bias: db1,
                    norm: None,
                },
                LayerParams {
                    weight: dw2 + &output.weight * reg,
                    bias: db2,
                    norm: None,
                },
            ],
        };
        Ok(Evaluation::Loss { loss, grads })
    }

    fn params(&self) -> &Params {
        &self.params
    }

    fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }
}
