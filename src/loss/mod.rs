pub mod softmax;

pub use softmax::{softmax_loss, softmax_loss_naive, softmax_loss_vectorized, validate_labels};
