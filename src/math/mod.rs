pub mod matrix;

pub use matrix::{flatten_batch, Precision};
