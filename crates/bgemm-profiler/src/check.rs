//! Tolerance comparison of device output against the host reference.

use bgemm_common::{DataType, Element, HostTensor};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Relative and absolute tolerance for one output type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    pub rtol: f64,
    pub atol: f64,
}

impl Tolerance {
    /// Default tolerance for results stored as `dtype`.
    pub const fn for_type(dtype: DataType) -> Self {
        match dtype {
            DataType::F32 => Self { rtol: 1e-5, atol: 3e-6 },
            DataType::F16 => Self { rtol: 1e-3, atol: 1e-3 },
            DataType::Bf16 => Self { rtol: 1e-1, atol: 1e-1 },
            DataType::F8 => Self { rtol: 1e-3, atol: 1e-3 },
        }
    }

    /// Largest error tolerated against `reference`.
    pub fn bound(&self, reference: f64) -> f64 {
        self.atol + self.rtol * reference.abs()
    }
}

/// First element that exceeded the tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mismatch {
    /// Index in logical `(batch, row, col)` order.
    pub index: usize,
    pub device: f32,
    pub reference: f32,
}

/// Result of comparing one device output with the reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub passed: bool,
    pub max_abs_error: f64,
    pub mismatches: usize,
    pub first_mismatch: Option<Mismatch>,
}

/// Compare `device` with `reference` element by element.
///
/// An element fails when `|device - reference| > atol + rtol * |reference|`.
/// A NaN on either side fails unless both are NaN. Shape mismatches fail
/// outright.
pub fn check_err<T: Element>(
    device: &HostTensor<T>,
    reference: &HostTensor<T>,
    tolerance: Tolerance,
) -> VerificationOutcome {
    if device.desc().lengths() != reference.desc().lengths() {
        warn!(
            device = ?device.desc().lengths(),
            reference = ?reference.desc().lengths(),
            "output shape differs from reference"
        );
        return VerificationOutcome {
            passed: false,
            max_abs_error: f64::INFINITY,
            mismatches: device.desc().element_size().max(reference.desc().element_size()),
            first_mismatch: None,
        };
    }

    let mut max_abs_error = 0.0f64;
    let mut mismatches = 0;
    let mut first_mismatch = None;
    let device_values = device.logical_values();
    let reference_values = reference.logical_values();

    for (index, (&out, &expected)) in device_values.iter().zip(&reference_values).enumerate() {
        let ok = if out.is_nan() || expected.is_nan() {
            out.is_nan() && expected.is_nan()
        } else {
            let err = (f64::from(out) - f64::from(expected)).abs();
            max_abs_error = max_abs_error.max(err);
            err <= tolerance.bound(f64::from(expected))
        };
        if !ok {
            mismatches += 1;
            if first_mismatch.is_none() {
                first_mismatch = Some(Mismatch { index, device: out, reference: expected });
            }
        }
    }

    if let Some(m) = first_mismatch {
        warn!(
            mismatches,
            max_abs_error,
            index = m.index,
            device = m.device,
            reference = m.reference,
            "verification failed"
        );
    } else {
        debug!(max_abs_error, "verification passed");
    }

    VerificationOutcome { passed: mismatches == 0, max_abs_error, mismatches, first_mismatch }
}
