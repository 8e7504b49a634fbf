//! Batched GEMM multiply-multiply instance profiler
//!
//! Enumerates every registered kernel instance for an operation signature,
//! filters out those that cannot run the problem, times the rest, checks
//! their output against the host reference and reports the fastest.

pub mod check;
pub mod config;
pub mod error;
pub mod harness;
pub mod init;
pub mod operation_registry;
pub mod problem;
pub mod report;

pub use check::{check_err, Tolerance, VerificationOutcome};
pub use config::ProfileConfig;
pub use error::{ProfilerError, Result};
pub use harness::{profile_batched_gemm_multiply_multiply, profile_instances, OPERATION_NAME};
pub use init::InitMethod;
pub use operation_registry::{
    find_operation, operations, GemmDataType, GemmMatrixLayout, OperationArgs, ProfilerOperation,
};
pub use problem::ProblemArgs;
pub use report::{exit, BestPerf, Perf, ProfileReport, SessionOutcome, VariantReport};
