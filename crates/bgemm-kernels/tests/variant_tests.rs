//! Integration tests for the registered variants against the host reference.

mod support;

use bgemm_common::{bf16, F8};
use bgemm_kernels::{
    get_instances_for, DeviceBatchedGemmMultiD, DeviceBatchedGemmMultiDXdl, GemmSpecialization,
    LoopScheduler, MultiplyMultiply, PassThrough, TileConfig,
};
use support::{packed_problem, Fixture, PartialWriter, LAYOUTS};

fn f8_instances() -> &'static [Box<dyn DeviceBatchedGemmMultiD>] {
    get_instances_for::<F8, F8, f32, f32, bf16>(LAYOUTS)
}

fn permissive() -> &'static dyn DeviceBatchedGemmMultiD {
    f8_instances()
        .iter()
        .rev()
        .find(|op| op.type_string().starts_with("DeviceBatchedGemmMultiD_Xdl<64, 16, 16, 16, 1, 1"))
        .map(|op| op.as_ref())
        .expect("permissive instance registered")
}

#[test]
fn every_supported_variant_matches_reference() {
    let fixture = Fixture::new(packed_problem(256, 128, 64, 2), 7);
    let expected = fixture.reference();

    let mut supported = 0;
    for op in f8_instances() {
        fixture.e_dev.set_zero().unwrap();
        if fixture.run(op.as_ref()).is_none() {
            continue;
        }
        supported += 1;
        assert_eq!(fixture.device_output(), expected, "{}", op.type_string());
    }
    assert!(supported >= 2, "only {supported} variants ran");
}

#[test]
fn unit_problem_runs_on_permissive_variant() {
    let fixture = Fixture::new(packed_problem(1, 1, 1, 1), 1);
    assert!(fixture.run(permissive()).is_some());
    assert_eq!(fixture.device_output(), fixture.reference());

    // Whole-tile variants reject it.
    let default_tile = f8_instances()[0].as_ref();
    assert!(fixture.run(default_tile).is_none());
}

#[test]
fn feasibility_check_is_pure() {
    let fixture = Fixture::new(packed_problem(96, 80, 48, 3), 3);
    fixture.e_dev.set_zero().unwrap();
    let before = fixture.e_dev.to_vec().unwrap();
    let a_before = fixture.a_dev.to_vec().unwrap();

    for op in f8_instances() {
        let arg = op.make_argument_pointer(
            fixture.buffers(),
            &fixture.problem,
            PassThrough,
            PassThrough,
            MultiplyMultiply,
        );
        let first = op.is_supported_argument(arg.as_ref());
        let second = op.is_supported_argument(arg.as_ref());
        assert_eq!(first, second, "{}", op.type_string());
    }

    assert_eq!(fixture.e_dev.to_vec().unwrap(), before);
    assert_eq!(fixture.a_dev.to_vec().unwrap(), a_before);
}

#[test]
fn stale_output_hides_partial_writer_without_reset() {
    let fixture = Fixture::new(packed_problem(32, 32, 32, 1), 11);
    let expected = fixture.reference();
    let full = permissive();
    let partial = PartialWriter(DeviceBatchedGemmMultiDXdl::<F8, F8, f32, f32, bf16>::new(
        LAYOUTS,
        TileConfig {
            gemm_spec: GemmSpecialization::MNKPadding,
            num_prefetch: 1,
            block_size: 64,
            m_per_block: 16,
            n_per_block: 16,
            k_per_block: 16,
            ak1: 1,
            bk1: 1,
            m_per_xdl: 16,
            n_per_xdl: 16,
            m_xdl_per_wave: 1,
            n_xdl_per_wave: 1,
            a_scalar_per_vector: 1,
            b_scalar_per_vector: 1,
            cde_scalar_per_vector: 1,
            loop_scheduler: LoopScheduler::Default,
        },
    ));

    // Full variant first, then the partial one on the same output.
    fixture.e_dev.set_zero().unwrap();
    fixture.run(full).unwrap();
    fixture.run(&partial).unwrap();
    assert_eq!(fixture.device_output(), expected, "stale rows mask the missing writes");

    // Resetting before the partial variant exposes it.
    fixture.e_dev.set_zero().unwrap();
    fixture.run(&partial).unwrap();
    let output = fixture.device_output();
    assert_ne!(output, expected);
    assert_eq!(output.get(0, 31, 0).to_f32(), 0.0);
    assert_eq!(output.get(0, 0, 0), expected.get(0, 0, 0));
}
