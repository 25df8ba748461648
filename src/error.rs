use thiserror::Error;

/// Errors returned by network construction, evaluation and the loss functions.
#[derive(Debug, Error)]
pub enum NetError {
    /// A configuration value is out of range (zero dimension, bad dropout
    /// probability, negative regularization, ...).
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An input, label or parameter array does not have the expected size.
    #[error("shape mismatch in {context}: expected {expected}, found {found}")]
    ShapeMismatch {
        context: &'static str,
        expected: String,
        found: String,
    },

    /// Label `label` at batch position `index` is not a valid class.
    #[error("label {label} at index {index} is out of range for {num_classes} classes")]
    OutOfRangeLabel {
        index: usize,
        label: usize,
        num_classes: usize,
    },

    /// A [`Classifier`](crate::Classifier) answered a pass with the wrong
    /// kind of [`Evaluation`](crate::Evaluation).
    #[error("{pass} pass returned {returned}")]
    UnexpectedEvaluation {
        pass: &'static str,
        returned: &'static str,
    },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NetError {
    pub(crate) fn shape(
        context: &'static str,
        expected: impl std::fmt::Debug,
        found: impl std::fmt::Debug,
    ) -> NetError {
        NetError::ShapeMismatch {
            context,
            expected: format!("{expected:?}"),
            found: format!("{found:?}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, NetError>;
