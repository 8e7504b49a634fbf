//! Precompiled tile configurations, grouped by operation signature.
//!
//! Each submodule exposes `add_*_instances` functions that append boxed
//! variants to a list, one function per (signature, specialisation family).

mod bf16_bf16_bf16;
mod f8_f8_bf16_mk_nk_mn;

pub use bf16_bf16_bf16::{
    add_xdl_bf16_bf16_bf16_mk_kn_mn_instances, add_xdl_bf16_bf16_bf16_mk_nk_mn_instances,
};
pub use f8_f8_bf16_mk_nk_mn::{
    add_xdl_f8_f8_bf16_mk_nk_mn_comp_default_instances,
    add_xdl_f8_f8_bf16_mk_nk_mn_comp_mnkpadding_instances,
};

use crate::device_op::DeviceBatchedGemmMultiD;
use crate::xdl::{GemmSpecialization, LoopScheduler, TileConfig};

/// Owned instance list.
pub type InstanceList = Vec<Box<dyn DeviceBatchedGemmMultiD>>;

/// Shorthand for one row of an instance table.
///
/// Columns: block, M/N/K per block, AK1, BK1, M/N per XDL, M/N XDL per wave,
/// A/B/CDE scalar per vector.
#[allow(clippy::too_many_arguments)]
pub(crate) const fn tile(
    gemm_spec: GemmSpecialization,
    block_size: usize,
    [m_per_block, n_per_block, k_per_block]: [usize; 3],
    [ak1, bk1]: [usize; 2],
    [m_per_xdl, n_per_xdl]: [usize; 2],
    [m_xdl_per_wave, n_xdl_per_wave]: [usize; 2],
    [a_scalar_per_vector, b_scalar_per_vector, cde_scalar_per_vector]: [usize; 3],
    loop_scheduler: LoopScheduler,
) -> TileConfig {
    TileConfig {
        gemm_spec,
        num_prefetch: 1,
        block_size,
        m_per_block,
        n_per_block,
        k_per_block,
        ak1,
        bk1,
        m_per_xdl,
        n_per_xdl,
        m_xdl_per_wave,
        n_xdl_per_wave,
        a_scalar_per_vector,
        b_scalar_per_vector,
        cde_scalar_per_vector,
        loop_scheduler,
    }
}
