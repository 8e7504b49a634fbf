//! Operation signatures: the key under which kernel instances are registered.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dtype::{DataType, Element};
use crate::layout::Layout;

/// Layout of every operand of a batched GEMM with two auxiliary tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GemmLayouts {
    pub a: Layout,
    pub b: Layout,
    pub d0: Layout,
    pub d1: Layout,
    pub e: Layout,
}

impl GemmLayouts {
    /// Primary layouts with the fixed scale-vector layouts.
    ///
    /// D0 is one value per row and D1 one value per column; with a broadcast
    /// stride of 0 this is expressed as column-major D0 and row-major D1.
    pub const fn with_scale_vectors(a: Layout, b: Layout, e: Layout) -> Self {
        Self { a, b, d0: Layout::ColumnMajor, d1: Layout::RowMajor, e }
    }

    /// `A[m, k] * B[n, k] = E[m, n]`
    pub const MK_NK_MN: Self =
        Self::with_scale_vectors(Layout::RowMajor, Layout::ColumnMajor, Layout::RowMajor);

    /// `A[m, k] * B[k, n] = E[m, n]`
    pub const MK_KN_MN: Self =
        Self::with_scale_vectors(Layout::RowMajor, Layout::RowMajor, Layout::RowMajor);
}

/// Element types of every operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GemmDataTypes {
    pub a: DataType,
    pub b: DataType,
    pub d0: DataType,
    pub d1: DataType,
    pub e: DataType,
}

impl GemmDataTypes {
    pub fn of<A: Element, B: Element, D0: Element, D1: Element, E: Element>() -> Self {
        Self {
            a: A::DATA_TYPE,
            b: B::DATA_TYPE,
            d0: D0::DATA_TYPE,
            d1: D1::DATA_TYPE,
            e: E::DATA_TYPE,
        }
    }
}

/// Exact type/layout key for a batched GEMM multiply-multiply operation.
///
/// Two signatures match only if every component matches; there is no
/// implicit widening or narrowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperationSignature {
    pub dtypes: GemmDataTypes,
    pub layouts: GemmLayouts,
}

impl OperationSignature {
    pub const fn new(dtypes: GemmDataTypes, layouts: GemmLayouts) -> Self {
        Self { dtypes, layouts }
    }

    /// Signature for the given element types.
    pub fn of<A: Element, B: Element, D0: Element, D1: Element, E: Element>(
        layouts: GemmLayouts,
    ) -> Self {
        Self { dtypes: GemmDataTypes::of::<A, B, D0, D1, E>(), layouts }
    }
}

impl fmt::Display for OperationSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = &self.dtypes;
        let l = &self.layouts;
        write!(
            f,
            "{}_{}_{}_{}_{}[{},{},{},{},{}]",
            d.a, d.b, d.d0, d.d1, d.e, l.a, l.b, l.d0, l.d1, l.e
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::F8;
    use half::bf16;

    #[test]
    fn signature_from_generics() {
        let sig = OperationSignature::of::<F8, F8, f32, f32, bf16>(GemmLayouts::MK_NK_MN);
        assert_eq!(sig.dtypes.a, DataType::F8);
        assert_eq!(sig.dtypes.e, DataType::Bf16);
        assert_eq!(sig.layouts.b, Layout::ColumnMajor);
        assert_eq!(sig.to_string(), "f8_f8_f32_f32_bf16[row,col,col,row,row]");
    }

    #[test]
    fn no_implicit_widening() {
        let narrow = OperationSignature::of::<F8, F8, f32, f32, bf16>(GemmLayouts::MK_NK_MN);
        let wide = OperationSignature::of::<F8, F8, f32, f32, f32>(GemmLayouts::MK_NK_MN);
        assert_ne!(narrow, wide);
        let other_layout = OperationSignature::of::<F8, F8, f32, f32, bf16>(GemmLayouts::MK_KN_MN);
        assert_ne!(narrow, other_layout);
    }
}
