pub mod classifier;
pub mod config;
pub mod fc_net;
pub mod params;
pub mod two_layer;

pub use classifier::{Classifier, Evaluation};
pub use config::{FcNetConfig, TwoLayerConfig};
pub use fc_net::FullyConnectedNet;
pub use params::{LayerParams, NormParams, ParamName, Params};
pub use two_layer::TwoLayerNet;
