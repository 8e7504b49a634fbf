//! Error types shared by descriptor and data-type handling.

use thiserror::Error;

/// Errors produced while building or validating operand descriptions.
#[derive(Debug, Error)]
pub enum CommonError {
    #[error("unknown data type: {0}")]
    UnknownDataType(String),

    #[error("tensor {name} aliases elements: lengths {lengths:?}, strides {strides:?}")]
    AliasingStrides { name: String, lengths: [usize; 3], strides: [usize; 3] },

    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("invalid problem: {0}")]
    InvalidProblem(String),
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, CommonError>;
