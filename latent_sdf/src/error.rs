//! Error types for latent_sdf.

use thiserror::Error;

/// Errors that can occur while building, evaluating or persisting a decoder.
#[derive(Error, Debug)]
pub enum LatentSdfError {
    /// Invalid configuration.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// A layer index set names a layer the network does not have.
    #[error("{set} references layer {index}, but the last layer index is {max}")]
    LayerIndexOutOfRange {
        /// Name of the offending configuration field.
        set: &'static str,
        /// The out-of-range index.
        index: usize,
        /// Largest valid layer index.
        max: usize,
    },

    /// Tensor shape mismatch.
    #[error("tensor shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch {
        /// Expected shape.
        expected: Vec<usize>,
        /// Actual shape.
        got: Vec<usize>,
    },

    /// Filesystem error while reading or writing a checkpoint.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure in the Burn record (de)serializer.
    #[error("record error: {message}")]
    Record {
        /// Description of the error.
        message: String,
    },

    /// Invalid or corrupted data.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl LatentSdfError {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

/// Result type for latent_sdf operations.
pub type Result<T> = std::result::Result<T, LatentSdfError>;
