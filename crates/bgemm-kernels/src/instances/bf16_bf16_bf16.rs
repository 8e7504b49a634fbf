//! BF16 x BF16 -> BF16 with F32 scale vectors.

use bgemm_common::{bf16, GemmLayouts};

use super::{tile, InstanceList};
use crate::xdl::{
    DeviceBatchedGemmMultiDXdl,
    GemmSpecialization::{Default as GemmDefault, KPadding, MNKPadding, MNPadding},
    LoopScheduler::Default as Sched,
    TileConfig,
};

type Instance = DeviceBatchedGemmMultiDXdl<bf16, bf16, f32, f32, bf16>;

const MK_NK_MN: [TileConfig; 4] = [
    tile(GemmDefault, 256, [256, 128, 32], [8, 8], [32, 32], [4, 2], [8, 8, 8], Sched),
    tile(MNPadding, 256, [128, 128, 32], [8, 8], [32, 32], [2, 2], [8, 8, 8], Sched),
    tile(KPadding, 128, [64, 64, 64], [8, 8], [32, 32], [1, 2], [8, 8, 8], Sched),
    tile(MNKPadding, 64, [32, 32, 32], [8, 8], [16, 16], [2, 2], [1, 1, 1], Sched),
];

// B is row-major here, so its vector loads run along N.
const MK_KN_MN: [TileConfig; 2] = [
    tile(GemmDefault, 256, [128, 128, 32], [8, 8], [32, 32], [2, 2], [8, 8, 8], Sched),
    tile(MNKPadding, 64, [32, 32, 32], [8, 8], [16, 16], [2, 2], [1, 1, 1], Sched),
];

pub fn add_xdl_bf16_bf16_bf16_mk_nk_mn_instances(instances: &mut InstanceList) {
    for config in MK_NK_MN {
        instances.push(Box::new(Instance::new(GemmLayouts::MK_NK_MN, config)));
    }
}

pub fn add_xdl_bf16_bf16_bf16_mk_kn_mn_instances(instances: &mut InstanceList) {
    for config in MK_KN_MN {
        instances.push(Box::new(Instance::new(GemmLayouts::MK_KN_MN, config)));
    }
}
