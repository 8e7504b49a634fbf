//! Batched GEMM multiply-multiply kernels
//!
//! The device-operation contract, the tiled kernel variants implementing it,
//! the signature-keyed instance registry and the host reference used to
//! verify them.

pub mod device;
pub mod device_op;
pub mod element_wise;
pub mod error;
pub mod factory;
pub mod instances;
pub mod reference;
pub mod xdl;

pub use device::{launch_and_time_kernel, DeviceBuffer, DeviceMem, StreamConfig, StreamHandle};
pub use device_op::{
    BaseArgument, BaseInvoker, BatchedGemmProblem, DeviceBatchedGemmMultiD, GemmBuffers,
    NUM_D_TENSOR,
};
pub use element_wise::{ElementwiseOperation, MultiplyMultiply, PassThrough};
pub use error::{KernelError, Result};
pub use factory::{
    get_instances, get_instances_for, instance_count, registered_signatures, registry,
    InstanceRegistry,
};
pub use reference::{reference_batched_gemm_multiply_multiply, ReferenceBatchedGemm};
pub use xdl::{DeviceBatchedGemmMultiDXdl, GemmSpecialization, LoopScheduler, TileConfig};
