//! Per-session results: the best-variant record and the final outcome.

use std::fmt;

use bgemm_common::OperationSignature;
use bgemm_kernels::BatchedGemmProblem;
use serde::{Deserialize, Serialize};

use crate::check::VerificationOutcome;

/// Process exit codes.
pub mod exit {
    pub const EXIT_SUCCESS: i32 = 0;
    pub const EXIT_FAILURE: i32 = 1;
    pub const EXIT_USAGE: i32 = 2;
}

/// Fastest variant seen so far.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BestPerf {
    pub name: String,
    pub ave_time_ms: f32,
    pub tflops: f32,
    pub gb_per_sec: f32,
}

impl BestPerf {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// Replace the record if `candidate` has strictly higher throughput.
    ///
    /// Returns whether the record changed; ties keep the earlier variant.
    pub fn update(&mut self, candidate: &VariantReport) -> bool {
        match candidate.perf {
            Some(perf) if perf.tflops > self.tflops => {
                *self = BestPerf {
                    name: candidate.name.clone(),
                    ave_time_ms: perf.ave_time_ms,
                    tflops: perf.tflops,
                    gb_per_sec: perf.gb_per_sec,
                };
                true
            }
            _ => false,
        }
    }
}

impl fmt::Display for BestPerf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ms, {} TFlops, {} GB/s, {}",
            self.ave_time_ms, self.tflops, self.gb_per_sec, self.name
        )
    }
}

/// Timing and derived throughput of one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Perf {
    pub ave_time_ms: f32,
    pub tflops: f32,
    pub gb_per_sec: f32,
}

impl Perf {
    /// Score a run of `problem` that took `ave_time_ms`.
    ///
    /// `tflops = flop / 1e9 / ms` and `gb_per_sec = bytes / 1e6 / ms`, where
    /// bytes counts one read of A and B and one write of E per batch. A
    /// zero time (untimed run) scores zero.
    pub fn score(
        problem: &BatchedGemmProblem,
        sizes: [usize; 3],
        ave_time_ms: f32,
    ) -> Self {
        let [a_bytes, b_bytes, e_bytes] = sizes;
        let (m, n, k) = (problem.m as f64, problem.n as f64, problem.k as f64);
        let flop = problem.flop() as f64;
        let bytes = (a_bytes as f64 * m * k + b_bytes as f64 * k * n + e_bytes as f64 * m * n)
            * problem.batch_count as f64;

        let (tflops, gb_per_sec) = if ave_time_ms > 0.0 {
            let ms = f64::from(ave_time_ms);
            ((flop / 1e9 / ms) as f32, (bytes / 1e6 / ms) as f32)
        } else {
            (0.0, 0.0)
        };
        Self { ave_time_ms, tflops, gb_per_sec }
    }
}

impl fmt::Display for Perf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ms, {} TFlops, {} GB/s", self.ave_time_ms, self.tflops, self.gb_per_sec)
    }
}

/// What happened to one variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantReport {
    pub name: String,
    pub supported: bool,
    /// Absent when the variant was skipped.
    pub perf: Option<Perf>,
    pub verification: Option<VerificationOutcome>,
    /// Launch failure of a supported variant; the session counts it as failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    Pass,
    Fail,
    /// No variant is registered for the signature.
    NoInstances,
    /// Variants are registered but none accepts the problem.
    NoSupportedInstances,
}

impl SessionOutcome {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Pass => exit::EXIT_SUCCESS,
            Self::Fail | Self::NoInstances | Self::NoSupportedInstances => exit::EXIT_FAILURE,
        }
    }

    pub fn is_pass(self) -> bool {
        self == Self::Pass
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::NoInstances => "no instances",
            Self::NoSupportedInstances => "no supported instances",
        };
        f.write_str(text)
    }
}

/// Everything a session produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileReport {
    pub operation: String,
    pub signature: OperationSignature,
    pub problem: BatchedGemmProblem,
    pub instances_found: usize,
    pub variants: Vec<VariantReport>,
    pub best: BestPerf,
    pub outcome: SessionOutcome,
}

impl ProfileReport {
    pub fn supported_count(&self) -> usize {
        self.variants.iter().filter(|v| v.supported).count()
    }

    pub fn exit_code(&self) -> i32 {
        self.outcome.exit_code()
    }
}
