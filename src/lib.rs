pub mod error;
pub mod math;
pub mod activation;
pub mod layers;
pub mod loss;
pub mod network;
pub mod optim;
pub mod gradient_check;

// Convenience re-exports
pub use error::{NetError, Result};
pub use layers::Mode;
pub use loss::softmax::{softmax_loss, softmax_loss_naive, softmax_loss_vectorized};
pub use math::Precision;
pub use network::{
    Classifier, Evaluation, FcNetConfig, FullyConnectedNet, ParamName, Params, TwoLayerConfig,
    TwoLayerNet,
};
pub use optim::sgd::Sgd;
