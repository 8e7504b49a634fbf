//! Element-wise operators applied on operand load and in the epilogue.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A small value-type operator: `y = op(x, ds...)`.
///
/// `ds` carries the auxiliary operands for epilogue operators and is empty
/// for operand-side operators.
pub trait ElementwiseOperation: Copy + Send + Sync + fmt::Debug + 'static {
    fn apply(&self, y: &mut f32, x: f32, ds: &[f32]);
}

/// `y = x`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassThrough;

impl ElementwiseOperation for PassThrough {
    fn apply(&self, y: &mut f32, x: f32, _ds: &[f32]) {
        *y = x;
    }
}

/// `y = x * d0 * d1`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplyMultiply;

impl ElementwiseOperation for MultiplyMultiply {
    fn apply(&self, y: &mut f32, x: f32, ds: &[f32]) {
        *y = match ds {
            [d0, d1] => x * d0 * d1,
            _ => ds.iter().fold(x, |acc, d| acc * d),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_through_copies() {
        let mut y = 0.0;
        PassThrough.apply(&mut y, 3.5, &[]);
        assert_eq!(y, 3.5);
    }

    #[test]
    fn multiply_multiply_scales_by_both() {
        let mut y = 0.0;
        MultiplyMultiply.apply(&mut y, 2.0, &[3.0, 0.5]);
        assert_eq!(y, 3.0);
    }

    #[test]
    fn zero_is_absorbing() {
        let mut y = 1.0;
        MultiplyMultiply.apply(&mut y, 0.0, &[123.0, -7.0]);
        assert_eq!(y, 0.0);
    }
}
