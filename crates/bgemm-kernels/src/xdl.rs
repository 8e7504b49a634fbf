//! XDL-style tiled batched GEMM with a fused multiply-multiply epilogue.
//!
//! Each instance is fixed to one tile configuration. The output is computed
//! block by block: an `MPerBlock x NPerBlock` accumulator is filled by
//! walking K in `KPerBlock` steps, then the epilogue scales it by D0/D1 and
//! stores it as E. Blocks that hang over the problem edge are only legal
//! when the GEMM specialisation pads that dimension.

use std::fmt;
use std::marker::PhantomData;

use bgemm_common::{Element, GemmLayouts, Layout, OperationSignature, TensorDescriptor};
use serde::{Deserialize, Serialize};

use crate::device::{launch_and_time_kernel, StreamConfig};
use crate::device_op::{
    BaseArgument, BaseInvoker, BatchedGemmProblem, DeviceBatchedGemmMultiD, GemmBuffers,
    NUM_D_TENSOR,
};
use crate::element_wise::{ElementwiseOperation, MultiplyMultiply, PassThrough};
use crate::error::{KernelError, Result};

/// Threads per wavefront.
pub const WAVE_SIZE: usize = 64;

/// Which GEMM dimensions may be padded up to a whole tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GemmSpecialization {
    Default,
    MPadding,
    NPadding,
    KPadding,
    MNPadding,
    MKPadding,
    NKPadding,
    MNKPadding,
}

impl GemmSpecialization {
    pub const fn pads_m(self) -> bool {
        matches!(self, Self::MPadding | Self::MNPadding | Self::MKPadding | Self::MNKPadding)
    }

    pub const fn pads_n(self) -> bool {
        matches!(self, Self::NPadding | Self::MNPadding | Self::NKPadding | Self::MNKPadding)
    }

    pub const fn pads_k(self) -> bool {
        matches!(self, Self::KPadding | Self::MKPadding | Self::NKPadding | Self::MNKPadding)
    }
}

impl fmt::Display for GemmSpecialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Main-loop scheduling flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoopScheduler {
    Default,
    Interwave,
}

impl fmt::Display for LoopScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Compile-time tuning parameters of one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileConfig {
    pub gemm_spec: GemmSpecialization,
    pub num_prefetch: usize,
    pub block_size: usize,
    pub m_per_block: usize,
    pub n_per_block: usize,
    pub k_per_block: usize,
    pub ak1: usize,
    pub bk1: usize,
    pub m_per_xdl: usize,
    pub n_per_xdl: usize,
    pub m_xdl_per_wave: usize,
    pub n_xdl_per_wave: usize,
    /// Vector width of A loads along its contiguous dimension.
    pub a_scalar_per_vector: usize,
    /// Vector width of B loads along its contiguous dimension.
    pub b_scalar_per_vector: usize,
    /// Vector width of E stores along its contiguous dimension.
    pub cde_scalar_per_vector: usize,
    pub loop_scheduler: LoopScheduler,
}

impl TileConfig {
    /// Whether the wave decomposition covers the block exactly.
    pub fn is_consistent(&self) -> bool {
        let m_wave_tile = self.m_xdl_per_wave * self.m_per_xdl;
        let n_wave_tile = self.n_xdl_per_wave * self.n_per_xdl;
        if m_wave_tile == 0 || n_wave_tile == 0 || self.ak1 == 0 || self.bk1 == 0 {
            return false;
        }
        if self.m_per_block % m_wave_tile != 0 || self.n_per_block % n_wave_tile != 0 {
            return false;
        }
        let waves = (self.m_per_block / m_wave_tile) * (self.n_per_block / n_wave_tile);
        waves * WAVE_SIZE == self.block_size
            && self.k_per_block % self.ak1 == 0
            && self.k_per_block % self.bk1 == 0
            && self.a_scalar_per_vector > 0
            && self.b_scalar_per_vector > 0
            && self.cde_scalar_per_vector > 0
    }
}

/// Why an instance rejected an argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unsupported {
    ForeignArgument,
    SignatureMismatch,
    InconsistentTile,
    EmptyProblem,
    TileRemainder { dim: char, len: usize, per_block: usize },
    VectorWidth { operand: &'static str, len: usize, scalar_per_vector: usize },
    InvalidDescriptor(String),
    BufferTooSmall { operand: &'static str, required: usize, available: usize },
    OutputAliasesInput,
}

impl fmt::Display for Unsupported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForeignArgument => write!(f, "argument does not belong to this operation"),
            Self::SignatureMismatch => write!(f, "argument bound for a different signature"),
            Self::InconsistentTile => write!(f, "tile configuration is inconsistent"),
            Self::EmptyProblem => write!(f, "M, N, K and batch count must be positive"),
            Self::TileRemainder { dim, len, per_block } => {
                write!(f, "{dim} = {len} is not a multiple of {dim}PerBlock = {per_block}")
            }
            Self::VectorWidth { operand, len, scalar_per_vector } => write!(
                f,
                "{operand}: {len} is not a multiple of ScalarPerVector = {scalar_per_vector}"
            ),
            Self::InvalidDescriptor(msg) => write!(f, "{msg}"),
            Self::BufferTooSmall { operand, required, available } => {
                write!(f, "{operand} buffer holds {available} bytes, needs {required}")
            }
            Self::OutputAliasesInput => write!(f, "output buffer aliases an input buffer"),
        }
    }
}

/// Argument bound by [`DeviceBatchedGemmMultiDXdl`].
#[derive(Debug)]
pub struct XdlArgument {
    signature: OperationSignature,
    buffers: GemmBuffers,
    problem: BatchedGemmProblem,
    a_op: PassThrough,
    b_op: PassThrough,
    cde_op: MultiplyMultiply,
}

impl XdlArgument {
    pub fn problem(&self) -> &BatchedGemmProblem {
        &self.problem
    }
}

impl BaseArgument for XdlArgument {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

/// Core of the tiled kernel, shared by the operation and its invoker.
#[derive(Debug, Clone, Copy)]
struct XdlKernel<A, B, D0, D1, E> {
    layouts: GemmLayouts,
    tile: TileConfig,
    _types: PhantomData<fn() -> (A, B, D0, D1, E)>,
}

impl<A, B, D0, D1, E> XdlKernel<A, B, D0, D1, E>
where
    A: Element,
    B: Element,
    D0: Element,
    D1: Element,
    E: Element,
{
    fn signature(&self) -> OperationSignature {
        OperationSignature::of::<A, B, D0, D1, E>(self.layouts)
    }

    fn check(&self, arg: &XdlArgument) -> std::result::Result<(), Unsupported> {
        if arg.signature != self.signature() {
            return Err(Unsupported::SignatureMismatch);
        }
        if !self.tile.is_consistent() {
            return Err(Unsupported::InconsistentTile);
        }

        let p = &arg.problem;
        let t = &self.tile;
        if p.m == 0 || p.n == 0 || p.k == 0 || p.batch_count == 0 {
            return Err(Unsupported::EmptyProblem);
        }

        for (dim, len, per_block, padded) in [
            ('M', p.m, t.m_per_block, t.gemm_spec.pads_m()),
            ('N', p.n, t.n_per_block, t.gemm_spec.pads_n()),
            ('K', p.k, t.k_per_block, t.gemm_spec.pads_k()),
        ] {
            if !padded && len % per_block != 0 {
                return Err(Unsupported::TileRemainder { dim, len, per_block });
            }
        }

        let l = &self.layouts;
        let a_desc = p.a_desc(l);
        let b_desc = p.b_desc(l);
        let e_desc = p.e_desc(l);
        check_vector_access("A", &a_desc, t.a_scalar_per_vector)?;
        check_vector_access("B", &b_desc, t.b_scalar_per_vector)?;
        check_vector_access("E", &e_desc, t.cde_scalar_per_vector)?;

        let d_descs = [p.d_desc(0, l), p.d_desc(1, l)];
        let invalid = |e: bgemm_common::CommonError| Unsupported::InvalidDescriptor(e.to_string());
        a_desc.validate("A").map_err(invalid)?;
        b_desc.validate("B").map_err(invalid)?;
        e_desc.validate("E").map_err(invalid)?;
        for (i, desc) in d_descs.iter().enumerate() {
            let broadcast: &[usize] = match (desc.layout(), desc.strides()) {
                (Layout::ColumnMajor, [_, _, 0]) => &[2],
                (Layout::RowMajor, [_, 0, _]) => &[1],
                _ => &[],
            };
            desc.validate_with_broadcast(if i == 0 { "D0" } else { "D1" }, broadcast)
                .map_err(invalid)?;
        }

        let b = &arg.buffers;
        check_capacity("A", &a_desc, A::DATA_TYPE.size_bytes(), b.a.len())?;
        check_capacity("B", &b_desc, B::DATA_TYPE.size_bytes(), b.b.len())?;
        check_capacity("D0", &d_descs[0], D0::DATA_TYPE.size_bytes(), b.ds[0].len())?;
        check_capacity("D1", &d_descs[1], D1::DATA_TYPE.size_bytes(), b.ds[1].len())?;
        check_capacity("E", &e_desc, E::DATA_TYPE.size_bytes(), b.e.len())?;

        if [&b.a, &b.b, &b.ds[0], &b.ds[1]].iter().any(|input| input.same_allocation(&b.e)) {
            return Err(Unsupported::OutputAliasesInput);
        }
        Ok(())
    }

    fn execute(&self, arg: &XdlArgument) -> Result<()> {
        let p = &arg.problem;
        let l = &self.layouts;
        let t = &self.tile;

        let a_desc = p.a_desc(l);
        let b_desc = p.b_desc(l);
        let d_descs = [p.d_desc(0, l), p.d_desc(1, l)];
        let e_desc = p.e_desc(l);

        let a_bytes = arg.buffers.a.read()?;
        let b_bytes = arg.buffers.b.read()?;
        let d0_bytes = arg.buffers.ds[0].read()?;
        let d1_bytes = arg.buffers.ds[1].read()?;
        let mut e_bytes = arg.buffers.e.write()?;

        let (mpb, npb, kpb) = (t.m_per_block, t.n_per_block, t.k_per_block);
        let mut a_tile = vec![0.0f32; mpb * kpb];
        let mut b_tile = vec![0.0f32; kpb * npb];
        let mut acc = vec![0.0f32; mpb * npb];

        for g in 0..p.batch_count {
            for m0 in (0..p.m).step_by(mpb) {
                for n0 in (0..p.n).step_by(npb) {
                    acc.fill(0.0);

                    for k0 in (0..p.k).step_by(kpb) {
                        // Out-of-range elements of a padded tile load as zero.
                        for i in 0..mpb {
                            for kk in 0..kpb {
                                let (m, k) = (m0 + i, k0 + kk);
                                let mut v = 0.0;
                                if m < p.m && k < p.k {
                                    let x = load::<A>(&a_bytes, a_desc.offset(g, m, k));
                                    arg.a_op.apply(&mut v, x, &[]);
                                }
                                a_tile[i * kpb + kk] = v;
                            }
                        }
                        for kk in 0..kpb {
                            for j in 0..npb {
                                let (k, n) = (k0 + kk, n0 + j);
                                let mut v = 0.0;
                                if k < p.k && n < p.n {
                                    let x = load::<B>(&b_bytes, b_desc.offset(g, k, n));
                                    arg.b_op.apply(&mut v, x, &[]);
                                }
                                b_tile[kk * npb + j] = v;
                            }
                        }

                        for i in 0..mpb {
                            let a_row = &a_tile[i * kpb..(i + 1) * kpb];
                            let acc_row = &mut acc[i * npb..(i + 1) * npb];
                            for (kk, &a) in a_row.iter().enumerate() {
                                if a == 0.0 {
                                    continue;
                                }
                                let b_row = &b_tile[kk * npb..(kk + 1) * npb];
                                for (c, &b) in acc_row.iter_mut().zip(b_row) {
                                    *c += a * b;
                                }
                            }
                        }
                    }

                    for i in 0..mpb.min(p.m - m0) {
                        for j in 0..npb.min(p.n - n0) {
                            let (m, n) = (m0 + i, n0 + j);
                            let ds: [f32; NUM_D_TENSOR] = [
                                load::<D0>(&d0_bytes, d_descs[0].offset(g, m, n)),
                                load::<D1>(&d1_bytes, d_descs[1].offset(g, m, n)),
                            ];
                            let mut y = 0.0;
                            arg.cde_op.apply(&mut y, acc[i * npb + j], &ds);
                            store::<E>(&mut e_bytes, e_desc.offset(g, m, n), y);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

fn load<T: Element>(bytes: &[u8], offset: usize) -> f32 {
    let size = std::mem::size_of::<T>();
    T::read_bytes(&bytes[offset * size..]).to_f32()
}

fn store<T: Element>(bytes: &mut [u8], offset: usize, value: f32) {
    let size = std::mem::size_of::<T>();
    T::from_f32(value).write_bytes(&mut bytes[offset * size..]);
}

fn check_vector_access(
    operand: &'static str,
    desc: &TensorDescriptor,
    scalar_per_vector: usize,
) -> std::result::Result<(), Unsupported> {
    let [batch, rows, cols] = desc.lengths();
    let [batch_stride, ..] = desc.strides();
    let layout = desc.layout();
    let leading_stride = match layout {
        Layout::RowMajor => desc.strides()[1],
        Layout::ColumnMajor => desc.strides()[2],
    };

    let inner = layout.inner_len(rows, cols);
    let mut checks = vec![inner];
    // Every vector must start aligned, so the strides that move between
    // contiguous runs have to be multiples of the vector width too.
    if layout.outer_len(rows, cols) > 1 {
        checks.push(leading_stride);
    }
    if batch > 1 {
        checks.push(batch_stride);
    }
    match checks.into_iter().find(|len| len % scalar_per_vector != 0) {
        Some(len) => Err(Unsupported::VectorWidth { operand, len, scalar_per_vector }),
        None => Ok(()),
    }
}

fn check_capacity(
    operand: &'static str,
    desc: &TensorDescriptor,
    elem_bytes: usize,
    available: usize,
) -> std::result::Result<(), Unsupported> {
    let required = desc.element_space_size().saturating_mul(elem_bytes);
    if required > available {
        return Err(Unsupported::BufferTooSmall { operand, required, available });
    }
    Ok(())
}

/// One tiled instance for a fixed element-type signature.
pub struct DeviceBatchedGemmMultiDXdl<A, B, D0, D1, E> {
    kernel: XdlKernel<A, B, D0, D1, E>,
}

impl<A, B, D0, D1, E> DeviceBatchedGemmMultiDXdl<A, B, D0, D1, E>
where
    A: Element,
    B: Element,
    D0: Element,
    D1: Element,
    E: Element,
{
    pub fn new(layouts: GemmLayouts, tile: TileConfig) -> Self {
        Self { kernel: XdlKernel { layouts, tile, _types: PhantomData } }
    }

    pub fn tile(&self) -> &TileConfig {
        &self.kernel.tile
    }

    /// Like [`DeviceBatchedGemmMultiD::is_supported_argument`], with the reason.
    pub fn check_argument(
        &self,
        argument: &dyn BaseArgument,
    ) -> std::result::Result<(), Unsupported> {
        let arg = argument
            .as_any()
            .downcast_ref::<XdlArgument>()
            .ok_or(Unsupported::ForeignArgument)?;
        self.kernel.check(arg)
    }
}

impl<A, B, D0, D1, E> DeviceBatchedGemmMultiD for DeviceBatchedGemmMultiDXdl<A, B, D0, D1, E>
where
    A: Element,
    B: Element,
    D0: Element,
    D1: Element,
    E: Element,
{
    fn make_argument_pointer(
        &self,
        buffers: GemmBuffers,
        problem: &BatchedGemmProblem,
        a_op: PassThrough,
        b_op: PassThrough,
        cde_op: MultiplyMultiply,
    ) -> Box<dyn BaseArgument> {
        Box::new(XdlArgument {
            signature: self.kernel.signature(),
            buffers,
            problem: *problem,
            a_op,
            b_op,
            cde_op,
        })
    }

    fn is_supported_argument(&self, argument: &dyn BaseArgument) -> bool {
        self.check_argument(argument).is_ok()
    }

    fn make_invoker_pointer(&self) -> Box<dyn BaseInvoker> {
        Box::new(XdlInvoker { kernel: self.kernel, name: self.type_string() })
    }

    fn type_string(&self) -> String {
        let t = &self.kernel.tile;
        format!(
            concat!(
                "DeviceBatchedGemmMultiD_Xdl<",
                "{}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}, {}>"
            ),
            t.block_size,
            t.m_per_block,
            t.n_per_block,
            t.k_per_block,
            t.ak1,
            t.bk1,
            t.m_per_xdl,
            t.n_per_xdl,
            t.m_xdl_per_wave,
            t.n_xdl_per_wave,
            t.a_scalar_per_vector,
            t.b_scalar_per_vector,
            t.cde_scalar_per_vector,
            t.num_prefetch,
            t.gemm_spec,
            t.loop_scheduler,
        )
    }

    fn signature(&self) -> OperationSignature {
        self.kernel.signature()
    }
}

struct XdlInvoker<A, B, D0, D1, E> {
    kernel: XdlKernel<A, B, D0, D1, E>,
    name: String,
}

impl<A, B, D0, D1, E> BaseInvoker for XdlInvoker<A, B, D0, D1, E>
where
    A: Element,
    B: Element,
    D0: Element,
    D1: Element,
    E: Element,
{
    fn run(&self, argument: &dyn BaseArgument, config: &StreamConfig) -> Result<f32> {
        let arg = argument
            .as_any()
            .downcast_ref::<XdlArgument>()
            .ok_or(KernelError::ArgumentMismatch)?;
        self.kernel.check(arg).map_err(|reason| KernelError::UnsupportedArgument {
            instance: self.name.clone(),
            reason: reason.to_string(),
        })?;
        launch_and_time_kernel(config, &self.name, || self.kernel.execute(arg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceMem;
    use bgemm_common::{bf16, HostTensor, F8};

    fn tile(
        gemm_spec: GemmSpecialization,
        mpb: usize,
        npb: usize,
        kpb: usize,
        spv: usize,
    ) -> TileConfig {
        TileConfig {
            gemm_spec,
            num_prefetch: 1,
            block_size: 64,
            m_per_block: mpb,
            n_per_block: npb,
            k_per_block: kpb,
            ak1: 1,
            bk1: 1,
            m_per_xdl: mpb,
            n_per_xdl: npb,
            m_xdl_per_wave: 1,
            n_xdl_per_wave: 1,
            a_scalar_per_vector: spv,
            b_scalar_per_vector: spv,
            cde_scalar_per_vector: spv,
            loop_scheduler: LoopScheduler::Default,
        }
    }

    fn problem(m: usize, n: usize, k: usize, batch: usize) -> BatchedGemmProblem {
        BatchedGemmProblem {
            m,
            n,
            k,
            batch_count: batch,
            stride_a: k,
            stride_b: k,
            stride_ds: [0, 0],
            stride_e: n,
            batch_stride_a: m * k,
            batch_stride_b: n * k,
            batch_stride_ds: [m, n],
            batch_stride_e: m * n,
        }
    }

    struct Buffers {
        a: DeviceMem,
        b: DeviceMem,
        d0: DeviceMem,
        d1: DeviceMem,
        e: DeviceMem,
    }

    impl Buffers {
        fn new(p: &BatchedGemmProblem) -> Self {
            let (m, n, k, g) = (p.m, p.n, p.k, p.batch_count);
            Self {
                a: DeviceMem::new(g * m * k),
                b: DeviceMem::new(g * n * k),
                d0: DeviceMem::new(4 * g * m),
                d1: DeviceMem::new(4 * g * n),
                e: DeviceMem::new(2 * g * m * n),
            }
        }

        fn bind(&self) -> GemmBuffers {
            GemmBuffers {
                a: self.a.device_buffer(),
                b: self.b.device_buffer(),
                ds: [self.d0.device_buffer(), self.d1.device_buffer()],
                e: self.e.device_buffer(),
            }
        }
    }

    type F8Op = DeviceBatchedGemmMultiDXdl<F8, F8, f32, f32, bf16>;

    fn op(t: TileConfig) -> F8Op {
        DeviceBatchedGemmMultiDXdl::new(GemmLayouts::MK_NK_MN, t)
    }

    fn bind(op: &F8Op, bufs: &Buffers, p: &BatchedGemmProblem) -> Box<dyn BaseArgument> {
        op.make_argument_pointer(bufs.bind(), p, PassThrough, PassThrough, MultiplyMultiply)
    }

    #[test]
    fn tile_consistency() {
        assert!(tile(GemmSpecialization::Default, 32, 32, 32, 1).is_consistent());
        let mut bad = tile(GemmSpecialization::Default, 32, 32, 32, 1);
        bad.block_size = 128;
        assert!(!bad.is_consistent());
    }

    #[test]
    fn default_spec_requires_whole_tiles() {
        let op = op(tile(GemmSpecialization::Default, 4, 4, 4, 1));
        let p = problem(6, 4, 4, 1);
        let bufs = Buffers::new(&p);
        let arg = bind(&op, &bufs, &p);
        assert_eq!(
            op.check_argument(arg.as_ref()),
            Err(Unsupported::TileRemainder { dim: 'M', len: 6, per_block: 4 })
        );
    }

    #[test]
    fn padding_spec_accepts_remainders() {
        let op = op(tile(GemmSpecialization::MNKPadding, 4, 4, 4, 1));
        let p = problem(6, 5, 3, 2);
        let bufs = Buffers::new(&p);
        let arg = bind(&op, &bufs, &p);
        assert!(op.is_supported_argument(arg.as_ref()));
    }

    #[test]
    fn vector_width_is_checked_on_contiguous_dim() {
        let op = op(tile(GemmSpecialization::MNKPadding, 4, 4, 4, 4));
        let p = problem(4, 4, 6, 1);
        let bufs = Buffers::new(&p);
        let arg = bind(&op, &bufs, &p);
        assert!(matches!(
            op.check_argument(arg.as_ref()),
            Err(Unsupported::VectorWidth { operand: "A", .. })
        ));
    }

    #[test]
    fn small_buffers_are_rejected() {
        let op = op(tile(GemmSpecialization::MNKPadding, 4, 4, 4, 1));
        let p = problem(4, 4, 4, 1);
        let mut bufs = Buffers::new(&p);
        bufs.e = DeviceMem::new(4);
        let arg = bind(&op, &bufs, &p);
        assert!(matches!(
            op.check_argument(arg.as_ref()),
            Err(Unsupported::BufferTooSmall { operand: "E", .. })
        ));
    }

    #[test]
    fn output_must_not_alias_inputs() {
        let op = op(tile(GemmSpecialization::MNKPadding, 4, 4, 4, 1));
        let p = problem(2, 2, 2, 1);
        let bufs = Buffers::new(&p);
        let mut bound = bufs.bind();
        bound.e = bufs.d0.device_buffer();
        let arg = op.make_argument_pointer(bound, &p, PassThrough, PassThrough, MultiplyMultiply);
        assert_eq!(op.check_argument(arg.as_ref()), Err(Unsupported::OutputAliasesInput));
    }

    #[test]
    fn argument_from_other_signature_is_rejected() {
        let other: DeviceBatchedGemmMultiDXdl<F8, F8, f32, f32, f32> =
            DeviceBatchedGemmMultiDXdl::new(
                GemmLayouts::MK_NK_MN,
                tile(GemmSpecialization::MNKPadding, 4, 4, 4, 1),
            );
        let op = op(tile(GemmSpecialization::MNKPadding, 4, 4, 4, 1));
        let p = problem(4, 4, 4, 1);
        let bufs = Buffers::new(&p);
        let arg = bind(&op, &bufs, &p);
        assert!(!other.is_supported_argument(arg.as_ref()));
    }

    #[test]
    fn computes_scaled_product() {
        let op = op(tile(GemmSpecialization::MNKPadding, 2, 2, 2, 1));
        let p = problem(3, 3, 3, 1);
        let bufs = Buffers::new(&p);

        // A = all ones (row-major 3x3), B = identity (column-major 3x3).
        let a: Vec<u8> = vec![F8::from_f32(1.0).to_bits(); 9];
        let mut b = vec![F8::from_f32(0.0).to_bits(); 9];
        for i in 0..3 {
            b[i * 3 + i] = F8::from_f32(1.0).to_bits();
        }
        bufs.a.to_device(&a).unwrap();
        bufs.b.to_device(&b).unwrap();
        let d0: Vec<f32> = vec![1.0, 2.0, 3.0];
        let d1: Vec<f32> = vec![10.0, 20.0, 30.0];
        bufs.d0.to_device(bytemuck::cast_slice(&d0)).unwrap();
        bufs.d1.to_device(bytemuck::cast_slice(&d1)).unwrap();

        let arg = bind(&op, &bufs, &p);
        assert!(op.is_supported_argument(arg.as_ref()));
        let ms = op.make_invoker_pointer().run(arg.as_ref(), &StreamConfig::untimed()).unwrap();
        assert_eq!(ms, 0.0);

        let desc = TensorDescriptor::packed(1, 3, 3, Layout::RowMajor);
        let mut e = HostTensor::<bf16>::zeros(desc);
        e.copy_from_bytes(&bufs.e.to_vec().unwrap()).unwrap();
        for m in 0..3 {
            for n in 0..3 {
                assert_eq!(e.get(0, m, n).to_f32(), d0[m] * d1[n], "E[{m},{n}]");
            }
        }
    }

    #[test]
    fn invoker_refuses_unsupported_argument() {
        let op = op(tile(GemmSpecialization::Default, 4, 4, 4, 1));
        let p = problem(3, 4, 4, 1);
        let bufs = Buffers::new(&p);
        let arg = bind(&op, &bufs, &p);
        let err =
            op.make_invoker_pointer().run(arg.as_ref(), &StreamConfig::untimed()).unwrap_err();
        assert!(matches!(err, KernelError::UnsupportedArgument { .. }));
    }

    #[test]
    fn type_string_names_tile() {
        let op = op(tile(GemmSpecialization::MNKPadding, 16, 16, 16, 1));
        let name = op.type_string();
        assert!(name.starts_with("DeviceBatchedGemmMultiD_Xdl<64, 16, 16, 16"));
        assert!(name.contains("MNKPadding"));
    }
}
