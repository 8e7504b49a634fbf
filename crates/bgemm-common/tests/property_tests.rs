//! Property tests for `bgemm-common`.
//!
//! 1. **F8 rounding error** stays within half a unit in the last place.
//! 2. **F8 conversion is monotone**.
//! 3. **Packed descriptors** never alias and span exactly their elements.
//! 4. **Padded leading strides** keep descriptors valid.

use bgemm_common::{Layout, TensorDescriptor, F8};
use proptest::prelude::*;

fn layout() -> impl Strategy<Value = Layout> {
    prop_oneof![Just(Layout::RowMajor), Just(Layout::ColumnMajor)]
}

// ---------------------------------------------------------------------------
// Properties: F8 conversion
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_f8_error_is_half_ulp(x in -448.0f32..=448.0) {
        let back = F8::from_f32(x).to_f32();
        let bound = x.abs() / 16.0 + f32::powi(2.0, -10);
        prop_assert!((back - x).abs() <= bound, "{} -> {} (bound {})", x, back, bound);
    }

    #[test]
    fn prop_f8_is_monotone(a in -500.0f32..500.0, b in -500.0f32..500.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(F8::from_f32(lo).to_f32() <= F8::from_f32(hi).to_f32());
    }
}

// ---------------------------------------------------------------------------
// Properties: descriptors
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn prop_packed_descriptor_is_dense(
        batch in 1usize..5,
        rows in 1usize..17,
        cols in 1usize..17,
        layout in layout(),
    ) {
        let desc = TensorDescriptor::packed(batch, rows, cols, layout);
        prop_assert!(desc.validate("t").is_ok());
        prop_assert_eq!(desc.element_space_size(), desc.element_size());
    }

    #[test]
    fn prop_padded_stride_is_valid(
        rows in 1usize..17,
        cols in 1usize..17,
        pad in 0usize..8,
        layout in layout(),
    ) {
        let stride = layout.default_stride(rows, cols) + pad;
        let batch_stride = layout.outer_len(rows, cols) * stride;
        let desc = TensorDescriptor::new(2, rows, cols, stride, batch_stride, layout);
        prop_assert!(desc.validate("t").is_ok());
        prop_assert!(desc.element_space_size() >= desc.element_size());
    }
}
