use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

const BIN: &str = "bgemm-profiler";

fn profile_args(data_type: &str, layout: &str, m: &str) -> Vec<String> {
    [
        "batched_gemm_multiply_multiply",
        data_type,
        layout,
        "1", "1", "0", "0",
        m, "32", "32",
        "-1", "-1", "-1", "-1", "-1", "-1",
        "2",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[test]
fn help_works() {
    Command::cargo_bin(BIN).unwrap().arg("--help").assert().success();
}

#[test]
fn no_arguments_lists_operations() {
    Command::cargo_bin(BIN)
        .unwrap()
        .assert()
        .success()
        .stdout(predicate::str::contains("batched_gemm_multiply_multiply"));
}

#[test]
fn list_shows_signatures() {
    Command::cargo_bin(BIN)
        .unwrap()
        .args(["list", "--verbose"])
        .assert()
        .success()
        .stdout(predicate::str::contains("f8_f8_f32_f32_bf16[row,col,col,row,row]"))
        .stdout(predicate::str::contains("DeviceBatchedGemmMultiD_Xdl<"));
}

#[test]
fn profile_prints_perf_lines_and_passes() {
    Command::cargo_bin(BIN)
        .unwrap()
        .args(profile_args("0", "0", "32"))
        .assert()
        .code(0)
        .stdout(predicate::str::contains("a_g_m_k: dim 3, lengths {2, 32, 32}"))
        .stdout(predicate::str::contains("found "))
        .stdout(predicate::str::contains("Perf: 0 ms, 0 TFlops, 0 GB/s, "))
        .stdout(predicate::str::contains("does not support this problem"))
        .stdout(predicate::str::contains("Best Perf: "));
}

#[test]
fn json_report_is_machine_readable() {
    let output = Command::cargo_bin(BIN)
        .unwrap()
        .args(profile_args("1", "1", "32"))
        .args(["--format", "json"])
        .assert()
        .code(0)
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["outcome"], "pass");
    assert_eq!(report["problem"]["batch_stride_ds"], serde_json::json!([32, 32]));
}

#[test]
fn unregistered_combination_exits_one() {
    Command::cargo_bin(BIN)
        .unwrap()
        .args(profile_args("0", "1", "32"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("found 0 instances"));
}

#[test]
fn empty_problem_exits_one() {
    Command::cargo_bin(BIN)
        .unwrap()
        .args(profile_args("0", "0", "0"))
        .assert()
        .code(1)
        .stdout(predicate::str::contains("no instance supports this problem"));
}

#[test]
fn malformed_input_is_a_usage_error() {
    Command::cargo_bin(BIN)
        .unwrap()
        .args(["batched_gemm_multiply_multiply", "0", "0", "1"])
        .assert()
        .code(2);

    Command::cargo_bin(BIN)
        .unwrap()
        .args(profile_args("9", "0", "32"))
        .assert()
        .code(2);
}

#[test]
fn config_file_supplies_seed_and_timing() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "seed = 7\ncold_niters = 0\nnrepeat = 1").unwrap();
    Command::cargo_bin(BIN)
        .unwrap()
        .arg("--config")
        .arg(file.path())
        .args(profile_args("0", "0", "64"))
        .assert()
        .code(0);
}

#[test]
fn missing_config_file_fails() {
    Command::cargo_bin(BIN)
        .unwrap()
        .args(["--config", "/nonexistent/bgemm.toml", "list"])
        .assert()
        .code(1);
}
