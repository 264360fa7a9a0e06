//! Error types for checkpoint storage.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while reading or writing checkpoints.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StoreError {
    /// Group or dataset name is empty or contains a path separator.
    #[error("invalid name '{0}': names must be non-empty and must not contain '/'")]
    InvalidName(String),

    /// Payload length does not match the declared shape.
    #[error("dataset shape {shape:?} holds {expected} values, got {got}")]
    ShapeMismatch {
        /// Declared shape.
        shape: Vec<usize>,
        /// Product of the shape.
        expected: usize,
        /// Payload length.
        got: usize,
    },

    /// No free collision-avoiding group name was found.
    #[error("no free group name derived from '{0}'")]
    NamesExhausted(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Container (de)serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
