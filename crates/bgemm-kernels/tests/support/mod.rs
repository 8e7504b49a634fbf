//! Shared fixture: a packed F8 x F8 -> BF16 problem with integer data.

#![allow(dead_code)]

use bgemm_common::{bf16, Element, GemmLayouts, HostTensor, F8};
use bgemm_kernels::{
    reference_batched_gemm_multiply_multiply, BatchedGemmProblem, DeviceBatchedGemmMultiD,
    DeviceMem, GemmBuffers, MultiplyMultiply, PassThrough, StreamConfig,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub const LAYOUTS: GemmLayouts = GemmLayouts::MK_NK_MN;

pub fn packed_problem(m: usize, n: usize, k: usize, batch_count: usize) -> BatchedGemmProblem {
    BatchedGemmProblem {
        m,
        n,
        k,
        batch_count,
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

pub struct Fixture {
    pub problem: BatchedGemmProblem,
    pub a: HostTensor<F8>,
    pub b: HostTensor<F8>,
    pub d0: HostTensor<f32>,
    pub d1: HostTensor<f32>,
    pub a_dev: DeviceMem,
    pub b_dev: DeviceMem,
    pub d0_dev: DeviceMem,
    pub d1_dev: DeviceMem,
    pub e_dev: DeviceMem,
}

fn random_ints<T: Element>(t: &mut HostTensor<T>, rng: &mut ChaCha8Rng) {
    t.generate(|_, _, _| T::from_f32(rng.gen_range(-5..=5) as f32));
}

fn upload<T: Element>(t: &HostTensor<T>) -> DeviceMem {
    let mem = DeviceMem::new(t.as_bytes().len());
    mem.to_device(t.as_bytes()).unwrap();
    mem
}

impl Fixture {
    pub fn new(problem: BatchedGemmProblem, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut a = HostTensor::zeros(problem.a_desc(&LAYOUTS));
        let mut b = HostTensor::zeros(problem.b_desc(&LAYOUTS));
        let mut d0 = HostTensor::zeros(problem.d_desc(0, &LAYOUTS));
        let mut d1 = HostTensor::zeros(problem.d_desc(1, &LAYOUTS));
        random_ints(&mut a, &mut rng);
        random_ints(&mut b, &mut rng);
        random_ints(&mut d0, &mut rng);
        random_ints(&mut d1, &mut rng);

        let e_bytes = problem.e_desc(&LAYOUTS).element_space_size() * std::mem::size_of::<bf16>();
        Self {
            problem,
            a_dev: upload(&a),
            b_dev: upload(&b),
            d0_dev: upload(&d0),
            d1_dev: upload(&d1),
            e_dev: DeviceMem::new(e_bytes),
            a,
            b,
            d0,
            d1,
        }
    }

    pub fn buffers(&self) -> GemmBuffers {
        GemmBuffers {
            a: self.a_dev.device_buffer(),
            b: self.b_dev.device_buffer(),
            ds: [self.d0_dev.device_buffer(), self.d1_dev.device_buffer()],
            e: self.e_dev.device_buffer(),
        }
    }

    pub fn reference(&self) -> HostTensor<bf16> {
        let mut e = HostTensor::zeros(self.problem.e_desc(&LAYOUTS));
        reference_batched_gemm_multiply_multiply(
            &self.a,
            &self.b,
            &self.d0,
            &self.d1,
            &mut e,
            MultiplyMultiply,
        )
        .unwrap();
        e
    }

    pub fn device_output(&self) -> HostTensor<bf16> {
        let mut e = HostTensor::zeros(self.problem.e_desc(&LAYOUTS));
        e.copy_from_bytes(&self.e_dev.to_vec().unwrap()).unwrap();
        e
    }

    /// Bind and run `op`; `None` when the variant rejects the problem.
    pub fn run(&self, op: &dyn DeviceBatchedGemmMultiD) -> Option<f32> {
        let arg = op.make_argument_pointer(
            self.buffers(),
            &self.problem,
            PassThrough,
            PassThrough,
            MultiplyMultiply,
        );
        if !op.is_supported_argument(arg.as_ref()) {
            return None;
        }
        Some(op.make_invoker_pointer().run(arg.as_ref(), &StreamConfig::untimed()).unwrap())
    }
}

/// Wraps a variant and binds only the first half of the rows of M, so it
/// leaves the rest of E untouched.
pub struct PartialWriter<O>(pub O);

impl<O: DeviceBatchedGemmMultiD> DeviceBatchedGemmMultiD for PartialWriter<O> {
    fn make_argument_pointer(
        &self,
        buffers: GemmBuffers,
        problem: &BatchedGemmProblem,
        a_op: PassThrough,
        b_op: PassThrough,
        cde_op: MultiplyMultiply,
    ) -> Box<dyn bgemm_kernels::BaseArgument> {
        let mut half = *problem;
        half.m = (problem.m / 2).max(1);
        self.0.make_argument_pointer(buffers, &half, a_op, b_op, cde_op)
    }

    fn is_supported_argument(&self, argument: &dyn bgemm_kernels::BaseArgument) -> bool {
        self.0.is_supported_argument(argument)
    }

    fn make_invoker_pointer(&self) -> Box<dyn bgemm_kernels::BaseInvoker> {
        self.0.make_invoker_pointer()
    }

    fn type_string(&self) -> String {
        format!("PartialWriter<{}>", self.0.type_string())
    }

    fn signature(&self) -> bgemm_common::OperationSignature {
        self.0.signature()
    }
}
