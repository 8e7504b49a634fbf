//! Named profiler operations selectable from the command line.

use bgemm_common::{bf16, GemmLayouts, F8};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ProfileConfig;
use crate::error::{ProfilerError, Result};
use crate::harness::{profile_batched_gemm_multiply_multiply, OPERATION_NAME};
use crate::report::ProfileReport;

/// Element-type combination selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GemmDataType {
    /// F8 inputs, F32 scales, BF16 output.
    F8F8Bf16,
    /// BF16 inputs, F32 scales, BF16 output.
    Bf16Bf16Bf16,
}

impl TryFrom<i64> for GemmDataType {
    type Error = ProfilerError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(Self::F8F8Bf16),
            1 => Ok(Self::Bf16Bf16Bf16),
            other => Err(ProfilerError::InvalidArgument {
                name: "data_type",
                reason: format!("expected 0 (fp8 input, bf16 output) or 1 (bf16), got {other}"),
            }),
        }
    }
}

impl fmt::Display for GemmDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::F8F8Bf16 => "f8_f8_bf16",
            Self::Bf16Bf16Bf16 => "bf16_bf16_bf16",
        })
    }
}

/// Operand layout selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GemmMatrixLayout {
    /// `A[g, m, k] * B[g, n, k] = E[g, m, n]`
    MkNkMn,
    /// `A[g, m, k] * B[g, k, n] = E[g, m, n]`
    MkKnMn,
}

impl GemmMatrixLayout {
    pub fn layouts(self) -> GemmLayouts {
        match self {
            Self::MkNkMn => GemmLayouts::MK_NK_MN,
            Self::MkKnMn => GemmLayouts::MK_KN_MN,
        }
    }
}

impl TryFrom<i64> for GemmMatrixLayout {
    type Error = ProfilerError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(Self::MkNkMn),
            1 => Ok(Self::MkKnMn),
            other => Err(ProfilerError::InvalidArgument {
                name: "layout",
                reason: format!("expected 0 (mk_nk_mn) or 1 (mk_kn_mn), got {other}"),
            }),
        }
    }
}

impl fmt::Display for GemmMatrixLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::MkNkMn => "mk_nk_mn",
            Self::MkKnMn => "mk_kn_mn",
        })
    }
}

/// Arguments common to every registered operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationArgs {
    pub data_type: GemmDataType,
    pub layout: GemmMatrixLayout,
    pub config: ProfileConfig,
}

pub type OperationFn = fn(&OperationArgs) -> Result<ProfileReport>;

/// A named entry point.
#[derive(Clone, Copy)]
pub struct ProfilerOperation {
    pub name: &'static str,
    pub description: &'static str,
    pub run: OperationFn,
}

impl fmt::Debug for ProfilerOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProfilerOperation")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

fn run_batched_gemm_multiply_multiply(args: &OperationArgs) -> Result<ProfileReport> {
    let layouts = args.layout.layouts();
    match args.data_type {
        GemmDataType::F8F8Bf16 => {
            profile_batched_gemm_multiply_multiply::<F8, F8, f32, f32, bf16>(layouts, &args.config)
        }
        GemmDataType::Bf16Bf16Bf16 => profile_batched_gemm_multiply_multiply::<
            bf16,
            bf16,
            f32,
            f32,
            bf16,
        >(layouts, &args.config),
    }
}

static OPERATIONS: &[ProfilerOperation] = &[ProfilerOperation {
    name: OPERATION_NAME,
    description: "Batched GEMM with multiply-multiply epilogue",
    run: run_batched_gemm_multiply_multiply,
}];

/// Every registered operation.
pub fn operations() -> &'static [ProfilerOperation] {
    OPERATIONS
}

pub fn find_operation(name: &str) -> Result<&'static ProfilerOperation> {
    OPERATIONS
        .iter()
        .find(|op| op.name == name)
        .ok_or_else(|| ProfilerError::UnknownOperation(name.to_string()))
}
