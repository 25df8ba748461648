use serde::{Deserialize, Serialize};

use crate::error::{NetError, Result};
use crate::math::Precision;

/// Construction parameters of a [`TwoLayerNet`](crate::network::TwoLayerNet).
///
/// Missing fields in a JSON file take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TwoLayerConfig {
    pub input_dim: usize,
    pub hidden_dim: usize,
    pub num_classes: usize,
    /// Standard deviation of the Gaussian weight initialization.
    pub weight_scale: f64,
    /// L2 regularization strength.
    pub reg: f64,
    /// Seed for weight initialization; `None` uses OS entropy.
    pub seed: Option<u64>,
}

impl Default for TwoLayerConfig {
    fn default() -> Self {
        TwoLayerConfig {
            input_dim: 3 * 32 * 32,
            hidden_dim: 100,
            num_classes: 10,
            weight_scale: 1e-3,
            reg: 0.0,
            seed: None,
        }
    }
}

impl TwoLayerConfig {
    pub fn validate(&self) -> Result<()> {
        positive("input_dim", self.input_dim)?;
        positive("hidden_dim", self.hidden_dim)?;
        positive("num_classes", self.num_classes)?;
        non_negative("weight_scale", self.weight_scale)?;
        non_negative("reg", self.reg)
    }

    pub fn save_json(&self, path: &str) -> Result<()> {
        save_json(self, path)
    }

    pub fn load_json(path: &str) -> Result<TwoLayerConfig> {
        let config: TwoLayerConfig = load_json(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// Construction parameters of a
/// [`FullyConnectedNet`](crate::network::FullyConnectedNet).
///
/// The architecture is `{affine - [batchnorm] - relu - [dropout]} x
/// hidden_dims.len()` followed by a final affine layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FcNetConfig {
    pub hidden_dims: Vec<usize>,
    pub input_dim: usize,
    pub num_classes: usize,
    /// Dropout probability in `[0, 1)`; `0` disables dropout entirely.
    pub dropout: f64,
    pub use_batchnorm: bool,
    pub reg: f64,
    pub weight_scale: f64,
    pub precision: Precision,
    /// Makes weight initialization and every dropout mask deterministic.
    pub seed: Option<u64>,
}

impl Default for FcNetConfig {
    fn default() -> Self {
        FcNetConfig {
            hidden_dims: vec![100],
            input_dim: 3 * 32 * 32,
            num_classes: 10,
            dropout: 0.0,
            use_batchnorm: false,
            reg: 0.0,
            weight_scale: 1e-2,
            precision: Precision::Double,
            seed: None,
        }
    }
}

impl FcNetConfig {
    pub fn validate(&self) -> Result<()> {
        positive("input_dim", self.input_dim)?;
        positive("num_classes", self.num_classes)?;
        if let Some(i) = self.hidden_dims.iter().position(|&d| d == 0) {
            return Err(NetError::InvalidConfiguration(format!(
                "hidden_dims[{i}] must be positive"
            )));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(NetError::InvalidConfiguration(format!(
                "dropout must be in [0, 1), got {}",
                self.dropout
            )));
        }
        non_negative("weight_scale", self.weight_scale)?;
        non_negative("reg", self.reg)
    }

    /// Number of affine layers, `1 + hidden_dims.len()`.
    pub fn num_layers(&self) -> usize {
        1 + self.hidden_dims.len()
    }

    /// Layer widths from input to output: `[input_dim, hidden..., num_classes]`.
    pub fn dims(&self) -> Vec<usize> {
        let mut dims = Vec::with_capacity(self.hidden_dims.len() + 2);
        dims.push(self.input_dim);
        dims.extend_from_slice(&self.hidden_dims);
        dims.push(self.num_classes);
        dims
    }

    pub fn save_json(&self, path: &str) -> Result<()> {
        save_json(self, path)
    }

    pub fn load_json(path: &str) -> Result<FcNetConfig> {
        let config: FcNetConfig = load_json(path)?;
        config.validate()?;
        Ok(config)
    }
}

fn positive(field: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(NetError::InvalidConfiguration(format!("{field} must be positive")));
    }
    Ok(())
}

fn non_negative(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(NetError::InvalidConfiguration(format!(
            "{field} must be finite and non-negative, got {value}"
        )));
    }
    Ok(())
}

fn save_json<T: Serialize>(value: &T, path: &str) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

fn load_json<T: for<'de> Deserialize<'de>>(path: &str) -> Result<T> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(TwoLayerConfig::default().validate().is_ok());
        assert!(FcNetConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let bad = [
            FcNetConfig { input_dim: 0, ..Default::default() },
            FcNetConfig { hidden_dims: vec![10, 0], ..Default::default() },
            FcNetConfig { dropout: 1.0, ..Default::default() },
            FcNetConfig { dropout: -0.1, ..Default::default() },
            FcNetConfig { reg: f64::NAN, ..Default::default() },
            FcNetConfig { weight_scale: -1.0, ..Default::default() },
        ];
        for config in bad {
            assert!(
                matches!(config.validate(), Err(NetError::InvalidConfiguration(_))),
                "{config:?} should be rejected"
            );
        }
        let two = TwoLayerConfig { hidden_dim: 0, ..Default::default() };
        assert!(two.validate().is_err());
    }

    #[test]
    fn dims_cover_every_layer() {
        let config = FcNetConfig {
            hidden_dims: vec![50, 20],
            input_dim: 8,
            num_classes: 3,
            ..Default::default()
        };
        assert_eq!(config.num_layers(), 3);
        assert_eq!(config.dims(), vec![8, 50, 20, 3]);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: FcNetConfig =
            serde_json::from_str(r#"{"hidden_dims": [4], "precision": "single"}"#).unwrap();
        assert_eq!(config.hidden_dims, vec![4]);
        assert_eq!(config.precision, Precision::Single);
        assert_eq!(config.num_classes, 10);
    }

    #[test]
    fn json_file_round_trip() {
        let path = std::env::temp_dir().join("softmax_nn_fc_config.json");
        let path = path.to_string_lossy().into_owned();
        let config = FcNetConfig {
            hidden_dims: vec![7, 5],
            dropout: 0.25,
            use_batchnorm: true,
            seed: Some(3),
            ..Default::default()
        };
        config.save_json(&path).unwrap();
        assert_eq!(FcNetConfig::load_json(&path).unwrap(), config);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn loading_invalid_json_fails_validation() {
        let path = std::env::temp_dir().join("softmax_nn_bad_two_layer.json");
        let path = path.to_string_lossy().into_owned();
        std::fs::write(&path, r#"{"num_classes": 0}"#).unwrap();
        assert!(matches!(
            TwoLayerConfig::load_json(&path),
            Err(NetError::InvalidConfiguration(_))
        ));
        let _ = std::fs::remove_file(&path);
    }
}
