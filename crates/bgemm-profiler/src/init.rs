//! Input tensor initialisation.

use bgemm_common::{Element, HostTensor};
use rand::distributions::uniform::SampleRange;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ProfilerError, Result};

/// How input tensors are filled before profiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitMethod {
    /// Leave every operand zero.
    None,
    /// Integers in `[-5, 5]` for every operand.
    #[default]
    Integer,
    /// A in `[0, 1)`, B in `[-0.5, 0.5)`, D0 and D1 in `[0, 1)`.
    Decimal,
}

impl TryFrom<i64> for InitMethod {
    type Error = ProfilerError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Integer),
            2 => Ok(Self::Decimal),
            other => Err(ProfilerError::InvalidArgument {
                name: "init_method",
                reason: format!("expected 0, 1 or 2, got {other}"),
            }),
        }
    }
}

impl fmt::Display for InitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Integer => "integer",
            Self::Decimal => "decimal",
        };
        f.write_str(name)
    }
}

fn fill<T, R>(tensor: &mut HostTensor<T>, rng: &mut ChaCha8Rng, range: R)
where
    T: Element,
    R: SampleRange<f32> + Clone,
{
    tensor.generate(|_, _, _| T::from_f32(rng.gen_range(range.clone())));
}

fn fill_integers<T: Element>(tensor: &mut HostTensor<T>, rng: &mut ChaCha8Rng) {
    tensor.generate(|_, _, _| T::from_f32(rng.gen_range(-5i32..=5) as f32));
}

/// Fill the four inputs according to `method`, deterministically from `seed`.
pub fn initialize<A, B, D0, D1>(
    method: InitMethod,
    seed: u64,
    a: &mut HostTensor<A>,
    b: &mut HostTensor<B>,
    d0: &mut HostTensor<D0>,
    d1: &mut HostTensor<D1>,
) where
    A: Element,
    B: Element,
    D0: Element,
    D1: Element,
{
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    match method {
        InitMethod::None => {}
        InitMethod::Integer => {
            fill_integers(a, &mut rng);
            fill_integers(b, &mut rng);
            fill_integers(d0, &mut rng);
            fill_integers(d1, &mut rng);
        }
        InitMethod::Decimal => {
            fill(a, &mut rng, 0.0f32..1.0);
            fill(b, &mut rng, -0.5f32..0.5);
            fill(d0, &mut rng, 0.0f32..1.0);
            fill(d1, &mut rng, 0.0f32..1.0);
        }
    }
}
