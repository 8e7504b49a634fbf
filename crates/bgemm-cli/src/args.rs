//! Command-line arguments.

use std::path::PathBuf;

use bgemm_profiler::{
    GemmDataType, GemmMatrixLayout, InitMethod, OperationArgs, ProblemArgs, ProfileConfig,
};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

/// Batched GEMM multiply-multiply instance profiler
#[derive(Debug, Parser)]
#[command(name = "bgemm-profiler")]
#[command(about = "Select, verify and benchmark batched GEMM multiply-multiply kernel instances")]
#[command(long_about = r#"
Enumerates every kernel instance registered for an operation signature, skips
the ones that cannot run the problem, times the rest, checks their output
against a host reference and reports the fastest.

Examples:
  # F8 x F8 -> BF16, A[g,m,k] * B[g,n,k], verified, integer init, timed
  bgemm-profiler batched_gemm_multiply_multiply 0 0 1 1 0 1 256 128 64 -1 -1 -1 -1 -1 -1 2

  # List operations and registered signatures
  bgemm-profiler list
"#)]
#[command(version)]
pub struct Cli {
    /// TOML file with default session options
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    /// Report format on stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Batched GEMM with multiply-multiply epilogue
    #[command(name = "batched_gemm_multiply_multiply", allow_negative_numbers = true)]
    BatchedGemmMultiplyMultiply(ProfileCommand),

    /// List operations and registered instance signatures
    List {
        /// Also print every instance name
        #[arg(short, long)]
        verbose: bool,
    },
}

fn parse_data_type(s: &str) -> Result<GemmDataType, String> {
    let value: i64 = s.parse().map_err(|e| format!("{e}"))?;
    GemmDataType::try_from(value).map_err(|e| e.to_string())
}

fn parse_layout(s: &str) -> Result<GemmMatrixLayout, String> {
    let value: i64 = s.parse().map_err(|e| format!("{e}"))?;
    GemmMatrixLayout::try_from(value).map_err(|e| e.to_string())
}

fn parse_init(s: &str) -> Result<InitMethod, String> {
    let value: i64 = s.parse().map_err(|e| format!("{e}"))?;
    InitMethod::try_from(value).map_err(|e| e.to_string())
}

fn parse_flag(s: &str) -> Result<bool, String> {
    match s {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(format!("expected 0 or 1, got {other}")),
    }
}

/// Positional arguments, in the profiler's traditional order.
#[derive(Debug, Args)]
pub struct ProfileCommand {
    /// 0: fp8 input, bf16 output; 1: bf16 input, bf16 output
    #[arg(value_parser = parse_data_type)]
    pub data_type: GemmDataType,

    /// 0: A[g, m, k] * B[g, n, k] = E[g, m, n]; 1: A[g, m, k] * B[g, k, n] = E[g, m, n]
    #[arg(value_parser = parse_layout)]
    pub layout: GemmMatrixLayout,

    /// Verify against the host reference (0: no, 1: yes)
    #[arg(value_parser = parse_flag, action = ArgAction::Set)]
    pub verify: bool,

    /// 0: no init, 1: integer values, 2: decimal values
    #[arg(value_parser = parse_init)]
    pub init: InitMethod,

    /// Print tensor values (0: no, 1: yes)
    #[arg(value_parser = parse_flag, action = ArgAction::Set)]
    pub log: bool,

    /// Time kernels (0: no, 1: yes)
    #[arg(value_parser = parse_flag, action = ArgAction::Set)]
    pub time_kernel: bool,

    #[arg(value_name = "M")]
    pub m: usize,
    #[arg(value_name = "N")]
    pub n: usize,
    #[arg(value_name = "K")]
    pub k: usize,

    /// Negative selects the packed default
    #[arg(value_name = "StrideA")]
    pub stride_a: i64,
    #[arg(value_name = "StrideB")]
    pub stride_b: i64,
    #[arg(value_name = "StrideE")]
    pub stride_e: i64,
    #[arg(value_name = "BatchStrideA")]
    pub batch_stride_a: i64,
    #[arg(value_name = "BatchStrideB")]
    pub batch_stride_b: i64,
    #[arg(value_name = "BatchStrideE")]
    pub batch_stride_e: i64,
    #[arg(value_name = "BatchCount")]
    pub batch_count: usize,

    /// Warm-up launches before timing
    #[arg(long, value_name = "N")]
    pub cold_niters: Option<usize>,

    /// Timed launches per instance
    #[arg(long, value_name = "N")]
    pub nrepeat: Option<usize>,

    /// Seed for input generation
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

impl ProfileCommand {
    /// Merge the command line over `base`.
    pub fn to_operation_args(&self, base: ProfileConfig) -> OperationArgs {
        let config = ProfileConfig {
            verify: self.verify,
            init: self.init,
            log: self.log,
            time_kernel: self.time_kernel,
            cold_niters: self.cold_niters.unwrap_or(base.cold_niters),
            nrepeat: self.nrepeat.unwrap_or(base.nrepeat),
            seed: self.seed.unwrap_or(base.seed),
            quiet: base.quiet,
            problem: ProblemArgs {
                m: self.m,
                n: self.n,
                k: self.k,
                stride_a: self.stride_a,
                stride_b: self.stride_b,
                stride_e: self.stride_e,
                batch_stride_a: self.batch_stride_a,
                batch_stride_b: self.batch_stride_b,
                batch_stride_e: self.batch_stride_e,
                batch_count: self.batch_count,
            },
        };
        OperationArgs { data_type: self.data_type, layout: self.layout, config }
    }
}
