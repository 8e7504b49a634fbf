//! Kernel-side error types.

use bgemm_common::CommonError;
use thiserror::Error;

/// Errors produced by device memory, device operations and the reference path.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("buffer size mismatch: device holds {device} bytes, host slice has {host}")]
    BufferSize { device: usize, host: usize },

    #[error("argument was not created by a compatible device operation")]
    ArgumentMismatch,

    #[error("{instance} cannot run this argument: {reason}")]
    UnsupportedArgument { instance: String, reason: String },

    #[error("device buffer lock poisoned")]
    BufferPoisoned,

    #[error("device allocation of {elements} x {elem_bytes} bytes overflows")]
    AllocationOverflow { elements: usize, elem_bytes: usize },

    #[error("reference shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error(transparent)]
    Common(#[from] CommonError),
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, KernelError>;
