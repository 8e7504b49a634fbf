//! Problem parameters as supplied by the caller, and their resolution into
//! concrete strides.

use bgemm_common::{CommonError, GemmLayouts, Layout};
use bgemm_kernels::BatchedGemmProblem;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// Sizes and strides of a batched GEMM; negative strides select the packed default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProblemArgs {
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub stride_a: i64,
    pub stride_b: i64,
    pub stride_e: i64,
    pub batch_stride_a: i64,
    pub batch_stride_b: i64,
    pub batch_stride_e: i64,
    pub batch_count: usize,
}

impl Default for ProblemArgs {
    fn default() -> Self {
        Self {
            m: 256,
            n: 128,
            k: 64,
            stride_a: -1,
            stride_b: -1,
            stride_e: -1,
            batch_stride_a: -1,
            batch_stride_b: -1,
            batch_stride_e: -1,
            batch_count: 2,
        }
    }
}

fn or_default(value: i64, default: usize) -> usize {
    usize::try_from(value).unwrap_or(default)
}

/// Leading stride and batch stride of one operand.
fn resolve_strides(
    name: &str,
    layout: Layout,
    rows: usize,
    cols: usize,
    stride: i64,
    batch_stride: i64,
) -> Result<(usize, usize)> {
    let stride = or_default(stride, layout.default_stride(rows, cols));
    let batch_stride = match usize::try_from(batch_stride) {
        Ok(explicit) => explicit,
        Err(_) => layout.outer_len(rows, cols).checked_mul(stride).ok_or_else(|| {
            CommonError::InvalidProblem(format!(
                "default batch stride of {name} overflows: {} x {stride}",
                layout.outer_len(rows, cols)
            ))
        })?,
    };
    Ok((stride, batch_stride))
}

impl ProblemArgs {
    /// Packed problem of the given size.
    pub fn packed(m: usize, n: usize, k: usize, batch_count: usize) -> Self {
        Self { m, n, k, batch_count, ..Self::default() }
    }

    /// Whether any of M, N, K or the batch count is zero.
    pub fn is_empty(&self) -> bool {
        [self.m, self.n, self.k, self.batch_count].contains(&0)
    }

    /// Fill in defaulted strides for `layouts` and check that A, B and E do
    /// not alias and that their spans fit in memory.
    ///
    /// D0 and D1 always use a broadcast stride of 0 and batch strides of M
    /// and N. An empty problem addresses no memory, so its strides are not
    /// validated; every variant rejects it instead.
    pub fn resolve(&self, layouts: &GemmLayouts) -> Result<BatchedGemmProblem> {
        let (m, n, k) = (self.m, self.n, self.k);
        let (stride_a, batch_stride_a) =
            resolve_strides("A", layouts.a, m, k, self.stride_a, self.batch_stride_a)?;
        let (stride_b, batch_stride_b) =
            resolve_strides("B", layouts.b, k, n, self.stride_b, self.batch_stride_b)?;
        let (stride_e, batch_stride_e) =
            resolve_strides("E", layouts.e, m, n, self.stride_e, self.batch_stride_e)?;

        let problem = BatchedGemmProblem {
            m,
            n,
            k,
            batch_count: self.batch_count,
            stride_a,
            stride_b,
            stride_ds: [0, 0],
            stride_e,
            batch_stride_a,
            batch_stride_b,
            batch_stride_ds: [m, n],
            batch_stride_e,
        };

        if self.is_empty() {
            debug!(?problem, "empty problem");
            return Ok(problem);
        }

        problem.a_desc(layouts).validate("A")?;
        problem.b_desc(layouts).validate("B")?;
        problem.e_desc(layouts).validate("E")?;
        debug!(?problem, "resolved problem");
        Ok(problem)
    }
}
