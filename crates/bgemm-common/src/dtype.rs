//! Element data types understood by the profiler.
//!
//! Device buffers are untyped byte ranges; the [`Element`] trait is the bridge
//! between a host element type and its on-device byte representation.

use bytemuck::{Pod, Zeroable};
use half::{bf16, f16};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CommonError, Result};

/// Runtime tag for an element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// 8-bit float, E4M3 (1 sign, 4 exponent, 3 mantissa), finite-only.
    F8,
    /// bfloat16.
    Bf16,
    /// IEEE half precision.
    F16,
    /// IEEE single precision.
    F32,
}

impl DataType {
    /// Size of one element in bytes.
    pub const fn size_bytes(self) -> usize {
        match self {
            DataType::F8 => 1,
            DataType::Bf16 | DataType::F16 => 2,
            DataType::F32 => 4,
        }
    }

    /// Short name used in instance and signature strings.
    pub const fn name(self) -> &'static str {
        match self {
            DataType::F8 => "f8",
            DataType::Bf16 => "bf16",
            DataType::F16 => "f16",
            DataType::F32 => "f32",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for DataType {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "f8" | "fp8" => Ok(DataType::F8),
            "bf16" => Ok(DataType::Bf16),
            "f16" | "fp16" => Ok(DataType::F16),
            "f32" | "fp32" => Ok(DataType::F32),
            other => Err(CommonError::UnknownDataType(other.to_string())),
        }
    }
}

/// 8-bit E4M3 float (OCP "FN" flavour: no infinities, a single NaN pattern).
///
/// Conversion from `f32` rounds to nearest-even and saturates to ±448.
#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct F8(u8);

impl F8 {
    /// Largest finite magnitude.
    pub const MAX: f32 = 448.0;
    const NAN_BITS: u8 = 0x7f;
    const MAX_BITS: u8 = 0x7e;
    const EXP_BIAS: i32 = 7;

    /// Wrap raw E4M3 bits.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw E4M3 bits.
    pub const fn to_bits(self) -> u8 {
        self.0
    }

    pub fn is_nan(self) -> bool {
        self.0 & 0x7f == Self::NAN_BITS
    }

    pub fn from_f32(value: f32) -> Self {
        if value.is_nan() {
            return Self(Self::NAN_BITS);
        }
        let sign = if value.is_sign_negative() { 0x80 } else { 0x00 };
        let magnitude = value.abs();
        if magnitude > Self::MAX {
            return Self(sign | Self::MAX_BITS);
        }

        // Below 2^-6 the format is subnormal with a fixed step of 2^-9.
        if magnitude < f32::powi(2.0, 1 - Self::EXP_BIAS) {
            let steps = (magnitude * 512.0).round_ties_even() as u8;
            // steps == 8 lands exactly on the smallest normal encoding.
            return Self(sign | steps);
        }

        let bits = magnitude.to_bits();
        let mut exponent = ((bits >> 23) & 0xff) as i32 - 127 + Self::EXP_BIAS;
        let fraction = bits & 0x007f_ffff;
        let mut mantissa = fraction >> 20;
        let remainder = fraction & 0x000f_ffff;
        let halfway = 0x0008_0000;
        if remainder > halfway || (remainder == halfway && mantissa & 1 == 1) {
            mantissa += 1;
        }
        if mantissa == 8 {
            mantissa = 0;
            exponent += 1;
        }
        if exponent > 15 || (exponent == 15 && mantissa == 7) {
            return Self(sign | Self::MAX_BITS);
        }
        Self(sign | ((exponent as u8) << 3) | mantissa as u8)
    }

    pub fn to_f32(self) -> f32 {
        if self.is_nan() {
            return f32::NAN;
        }
        let sign = if self.0 & 0x80 != 0 { -1.0 } else { 1.0 };
        let exponent = i32::from((self.0 >> 3) & 0x0f);
        let mantissa = f32::from(self.0 & 0x07);
        let magnitude = if exponent == 0 {
            mantissa * f32::powi(2.0, -9)
        } else {
            (1.0 + mantissa / 8.0) * f32::powi(2.0, exponent - Self::EXP_BIAS)
        };
        sign * magnitude
    }
}

impl fmt::Debug for F8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F8({})", self.to_f32())
    }
}

impl fmt::Display for F8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_f32())
    }
}

/// Host element type with a fixed device representation.
pub trait Element: Pod + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    const DATA_TYPE: DataType;

    fn to_f32(self) -> f32;
    fn from_f32(value: f32) -> Self;

    /// Decode one element from a little-endian, possibly unaligned, byte slice.
    fn read_bytes(bytes: &[u8]) -> Self {
        bytemuck::pod_read_unaligned(&bytes[..std::mem::size_of::<Self>()])
    }

    /// Encode one element into `out`.
    fn write_bytes(self, out: &mut [u8]) {
        out[..std::mem::size_of::<Self>()].copy_from_slice(bytemuck::bytes_of(&self));
    }
}

impl Element for F8 {
    const DATA_TYPE: DataType = DataType::F8;

    fn to_f32(self) -> f32 {
        F8::to_f32(self)
    }

    fn from_f32(value: f32) -> Self {
        F8::from_f32(value)
    }
}

impl Element for bf16 {
    const DATA_TYPE: DataType = DataType::Bf16;

    fn to_f32(self) -> f32 {
        bf16::to_f32(self)
    }

    fn from_f32(value: f32) -> Self {
        bf16::from_f32(value)
    }
}

impl Element for f16 {
    const DATA_TYPE: DataType = DataType::F16;

    fn to_f32(self) -> f32 {
        f16::to_f32(self)
    }

    fn from_f32(value: f32) -> Self {
        f16::from_f32(value)
    }
}

impl Element for f32 {
    const DATA_TYPE: DataType = DataType::F32;

    fn to_f32(self) -> f32 {
        self
    }

    fn from_f32(value: f32) -> Self {
        value
    }
}
