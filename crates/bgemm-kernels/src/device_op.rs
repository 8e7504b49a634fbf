//! The device-operation contract every kernel variant implements.
//!
//! A variant binds raw buffers and problem parameters into an argument,
//! answers whether it can run that argument, and hands out an invoker that
//! executes it. Binding never fails; feasibility is a separate predicate.

use std::any::Any;
use std::fmt;

use bgemm_common::{GemmLayouts, OperationSignature, TensorDescriptor};
use serde::{Deserialize, Serialize};

use crate::device::{DeviceBuffer, StreamConfig};
use crate::element_wise::{MultiplyMultiply, PassThrough};
use crate::error::Result;

/// Number of auxiliary (D) operands of the multiply-multiply epilogue.
pub const NUM_D_TENSOR: usize = 2;

/// Device buffers bound into an argument.
#[derive(Debug, Clone)]
pub struct GemmBuffers {
    pub a: DeviceBuffer,
    pub b: DeviceBuffer,
    pub ds: [DeviceBuffer; NUM_D_TENSOR],
    pub e: DeviceBuffer,
}

/// Sizes and strides of one batched GEMM problem, in elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchedGemmProblem {
    pub m: usize,
    pub n: usize,
    pub k: usize,
    pub batch_count: usize,
    pub stride_a: usize,
    pub stride_b: usize,
    pub stride_ds: [usize; NUM_D_TENSOR],
    pub stride_e: usize,
    pub batch_stride_a: usize,
    pub batch_stride_b: usize,
    pub batch_stride_ds: [usize; NUM_D_TENSOR],
    pub batch_stride_e: usize,
}

impl BatchedGemmProblem {
    /// Descriptor of A as a `{batch, M, K}` tensor.
    pub fn a_desc(&self, layouts: &GemmLayouts) -> TensorDescriptor {
        TensorDescriptor::new(
            self.batch_count,
            self.m,
            self.k,
            self.stride_a,
            self.batch_stride_a,
            layouts.a,
        )
    }

    /// Descriptor of B as a `{batch, K, N}` tensor.
    pub fn b_desc(&self, layouts: &GemmLayouts) -> TensorDescriptor {
        TensorDescriptor::new(
            self.batch_count,
            self.k,
            self.n,
            self.stride_b,
            self.batch_stride_b,
            layouts.b,
        )
    }

    /// Descriptor of D`i` as seen by the epilogue: a `{batch, M, N}` view.
    pub fn d_desc(&self, i: usize, layouts: &GemmLayouts) -> TensorDescriptor {
        let layout = if i == 0 { layouts.d0 } else { layouts.d1 };
        TensorDescriptor::new(
            self.batch_count,
            self.m,
            self.n,
            self.stride_ds[i],
            self.batch_stride_ds[i],
            layout,
        )
    }

    /// Descriptor of E as a `{batch, M, N}` tensor.
    pub fn e_desc(&self, layouts: &GemmLayouts) -> TensorDescriptor {
        TensorDescriptor::new(
            self.batch_count,
            self.m,
            self.n,
            self.stride_e,
            self.batch_stride_e,
            layouts.e,
        )
    }

    /// Floating-point operations of one launch.
    pub fn flop(&self) -> u64 {
        2 * self.batch_count as u64 * self.m as u64 * self.n as u64 * self.k as u64
    }
}

/// Type-erased argument produced by [`DeviceBatchedGemmMultiD::make_argument_pointer`].
pub trait BaseArgument: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
}

/// Executes an argument; returns the elapsed time in milliseconds.
///
/// Blocks until the launch (and its timing) has completed. The argument
/// must have passed `is_supported_argument` on the owning variant.
pub trait BaseInvoker: Send + Sync {
    fn run(&self, argument: &dyn BaseArgument, config: &StreamConfig) -> Result<f32>;
}

/// Batched GEMM with `D` auxiliary tensors fused into the epilogue.
pub trait DeviceBatchedGemmMultiD: Send + Sync {
    /// Bind buffers, problem and operators. Never fails, even for shapes the
    /// variant cannot handle.
    fn make_argument_pointer(
        &self,
        buffers: GemmBuffers,
        problem: &BatchedGemmProblem,
        a_op: PassThrough,
        b_op: PassThrough,
        cde_op: MultiplyMultiply,
    ) -> Box<dyn BaseArgument>;

    /// Pure feasibility predicate for a bound argument.
    fn is_supported_argument(&self, argument: &dyn BaseArgument) -> bool;

    fn make_invoker_pointer(&self) -> Box<dyn BaseInvoker>;

    /// Stable, human-readable instance name.
    fn type_string(&self) -> String;

    fn signature(&self) -> OperationSignature;
}
