//! F8 x F8 -> BF16, A row-major, B column-major, E row-major.

use bgemm_common::{bf16, GemmLayouts, F8};

use super::{tile, InstanceList};
use crate::xdl::{
    DeviceBatchedGemmMultiDXdl,
    GemmSpecialization::{Default as GemmDefault, MNKPadding},
    LoopScheduler::{Default as Sched, Interwave},
    TileConfig,
};

type Instance = DeviceBatchedGemmMultiDXdl<F8, F8, f32, f32, bf16>;

const COMP_DEFAULT: [TileConfig; 6] = [
    tile(GemmDefault, 256, [256, 128, 64], [16, 16], [32, 32], [4, 2], [16, 16, 16], Sched),
    tile(GemmDefault, 256, [128, 128, 64], [16, 16], [32, 32], [2, 2], [16, 16, 16], Sched),
    tile(GemmDefault, 256, [128, 256, 64], [16, 16], [32, 32], [2, 4], [16, 16, 16], Sched),
    tile(GemmDefault, 256, [256, 128, 128], [16, 16], [32, 32], [4, 2], [16, 16, 16], Sched),
    tile(GemmDefault, 128, [64, 64, 64], [16, 16], [32, 32], [1, 2], [16, 16, 16], Sched),
    tile(GemmDefault, 256, [64, 64, 64], [16, 16], [16, 16], [2, 2], [16, 16, 8], Interwave),
];

const COMP_MNKPADDING: [TileConfig; 2] = [
    tile(MNKPadding, 256, [128, 128, 64], [16, 16], [32, 32], [2, 2], [16, 16, 8], Sched),
    tile(MNKPadding, 64, [16, 16, 16], [1, 1], [16, 16], [1, 1], [1, 1, 1], Sched),
];

/// Compute-bound tiles that require whole-tile problem sizes.
pub fn add_xdl_f8_f8_bf16_mk_nk_mn_comp_default_instances(instances: &mut InstanceList) {
    for config in COMP_DEFAULT {
        instances.push(Box::new(Instance::new(GemmLayouts::MK_NK_MN, config)));
    }
}

/// Padded tiles that accept any M, N and K.
pub fn add_xdl_f8_f8_bf16_mk_nk_mn_comp_mnkpadding_instances(instances: &mut InstanceList) {
    for config in COMP_MNKPADDING {
        instances.push(Box::new(Instance::new(GemmLayouts::MK_NK_MN, config)));
    }
}
