//! Common types for the batched GEMM profiler
//!
//! Element types, matrix layouts, batched tensor descriptors and the
//! operation signature that keys the kernel instance registry.

pub mod dtype;
pub mod error;
pub mod layout;
pub mod signature;
pub mod tensor;

pub use dtype::{DataType, Element, F8};
pub use error::{CommonError, Result};
pub use half::{bf16, f16};
pub use layout::Layout;
pub use signature::{GemmDataTypes, GemmLayouts, OperationSignature};
pub use tensor::{HostTensor, TensorDescriptor};
