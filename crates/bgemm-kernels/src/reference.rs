//! Host reference for batched GEMM and the multiply-multiply epilogue.
//!
//! Naive, single-threaded and deterministic: every output element is a
//! straight f32 dot product over K. Used only for verification.

use std::marker::PhantomData;

use bgemm_common::{Element, HostTensor, Layout, TensorDescriptor};
use tracing::debug;

use crate::device_op::NUM_D_TENSOR;
use crate::element_wise::{ElementwiseOperation, MultiplyMultiply, PassThrough};
use crate::error::{KernelError, Result};

/// `C[g] = c_op(a_op(A[g]) * b_op(B[g]))` on host tensors.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceBatchedGemm<AOp = PassThrough, BOp = PassThrough, COp = PassThrough> {
    _ops: PhantomData<(AOp, BOp, COp)>,
}

/// Bound operands of one reference run.
pub struct ReferenceArgument<'a, A: Element, B: Element, C: Element, AOp, BOp, COp> {
    a: &'a HostTensor<A>,
    b: &'a HostTensor<B>,
    c: &'a mut HostTensor<C>,
    a_op: AOp,
    b_op: BOp,
    c_op: COp,
}

/// Runs a [`ReferenceArgument`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceInvoker;

impl<AOp, BOp, COp> ReferenceBatchedGemm<AOp, BOp, COp>
where
    AOp: ElementwiseOperation,
    BOp: ElementwiseOperation,
    COp: ElementwiseOperation,
{
    pub fn new() -> Self {
        Self { _ops: PhantomData }
    }

    pub fn make_argument<'a, A: Element, B: Element, C: Element>(
        &self,
        a: &'a HostTensor<A>,
        b: &'a HostTensor<B>,
        c: &'a mut HostTensor<C>,
        a_op: AOp,
        b_op: BOp,
        c_op: COp,
    ) -> ReferenceArgument<'a, A, B, C, AOp, BOp, COp> {
        ReferenceArgument { a, b, c, a_op, b_op, c_op }
    }

    pub fn make_invoker(&self) -> ReferenceInvoker {
        ReferenceInvoker
    }
}

impl ReferenceInvoker {
    pub fn run<A, B, C, AOp, BOp, COp>(
        &self,
        arg: &mut ReferenceArgument<'_, A, B, C, AOp, BOp, COp>,
    ) -> Result<()>
    where
        A: Element,
        B: Element,
        C: Element,
        AOp: ElementwiseOperation,
        BOp: ElementwiseOperation,
        COp: ElementwiseOperation,
    {
        let [g_a, m, k] = arg.a.desc().lengths();
        let [g_b, k_b, n] = arg.b.desc().lengths();
        let c_lengths = arg.c.desc().lengths();
        if g_a != g_b || k != k_b || c_lengths != [g_a, m, n] {
            return Err(KernelError::ShapeMismatch(format!(
                "A {:?} x B {:?} -> C {:?}",
                arg.a.desc().lengths(),
                arg.b.desc().lengths(),
                c_lengths
            )));
        }
        debug!(batch = g_a, m, n, k, "reference batched gemm");

        for g in 0..g_a {
            for row in 0..m {
                for col in 0..n {
                    let mut acc = 0.0f32;
                    for kk in 0..k {
                        let (mut x, mut y) = (0.0, 0.0);
                        arg.a_op.apply(&mut x, arg.a.get(g, row, kk).to_f32(), &[]);
                        arg.b_op.apply(&mut y, arg.b.get(g, kk, col).to_f32(), &[]);
                        acc += x * y;
                    }
                    let mut out = 0.0;
                    arg.c_op.apply(&mut out, acc, &[]);
                    arg.c.set(g, row, col, C::from_f32(out));
                }
            }
        }
        Ok(())
    }
}

/// Full host reference: `E = cde_op(A * B, D0, D1)`.
///
/// D0 and D1 are `{batch, M, N}` views (usually with a broadcast axis).
pub fn reference_batched_gemm_multiply_multiply<A, B, D0, D1, E>(
    a: &HostTensor<A>,
    b: &HostTensor<B>,
    d0: &HostTensor<D0>,
    d1: &HostTensor<D1>,
    e: &mut HostTensor<E>,
    cde_op: MultiplyMultiply,
) -> Result<()>
where
    A: Element,
    B: Element,
    D0: Element,
    D1: Element,
    E: Element,
{
    let [batch, m, n] = e.desc().lengths();
    for (name, desc) in [("D0", d0.desc()), ("D1", d1.desc())] {
        if desc.lengths() != [batch, m, n] {
            return Err(KernelError::ShapeMismatch(format!(
                "{name} {:?} does not match E {:?}",
                desc.lengths(),
                e.desc().lengths()
            )));
        }
    }

    let mut c = HostTensor::<f32>::zeros(TensorDescriptor::packed(batch, m, n, Layout::RowMajor));
    let gemm = ReferenceBatchedGemm::<PassThrough, PassThrough, PassThrough>::new();
    let mut arg = gemm.make_argument(a, b, &mut c, PassThrough, PassThrough, PassThrough);
    gemm.make_invoker().run(&mut arg)?;

    for g in 0..batch {
        for row in 0..m {
            for col in 0..n {
                let ds: [f32; NUM_D_TENSOR] =
                    [d0.get(g, row, col).to_f32(), d1.get(g, row, col).to_f32()];
                let mut out = 0.0;
                cde_op.apply(&mut out, c.get(g, row, col), &ds);
                e.set(g, row, col, E::from_f32(out));
            }
        }
    }
    Ok(())
}
