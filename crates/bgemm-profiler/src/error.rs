//! Profiler error types.

use bgemm_common::CommonError;
use bgemm_kernels::KernelError;
use thiserror::Error;

/// Conditions that abort a profiling session.
#[derive(Debug, Error)]
pub enum ProfilerError {
    #[error("kernel error: {0}")]
    Kernel(#[from] KernelError),

    #[error("invalid operand: {0}")]
    Common(#[from] CommonError),

    #[error("no kernel instances are registered")]
    EmptyRegistry,

    #[error("unknown profiler operation '{0}'")]
    UnknownOperation(String),

    #[error("invalid argument {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("failed to read config {path}: {source}")]
    ConfigIo { path: String, source: std::io::Error },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse { path: String, source: toml::de::Error },
}

/// Convenience result alias.
pub type Result<T> = std::result::Result<T, ProfilerError>;
