pub mod relu;

pub use relu::{relu_backward, relu_forward, ReluCache};
