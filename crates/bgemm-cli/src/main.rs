//! bgemm-profiler command-line entry point

use anyhow::{Context, Result};
use bgemm_kernels::{get_instances, registered_signatures};
use bgemm_profiler::{
    exit, find_operation, operations, ProfileConfig, ProfileReport, SessionOutcome,
};
use clap::{CommandFactory, Parser};
use console::style;
use tracing::{debug, error};

mod args;

use args::{Cli, Commands, LogFormat, OutputFormat, ProfileCommand};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version requests print to stdout and succeed.
            let code = if e.use_stderr() { exit::EXIT_USAGE } else { exit::EXIT_SUCCESS };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if let Err(e) = setup_logging(cli.log_level.as_deref(), cli.log_format) {
        eprintln!("failed to initialise logging: {e}");
    }

    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("Command failed: {}", e);
            for cause in e.chain().skip(1) {
                error!("  Caused by: {}", cause);
            }
            eprintln!("{} {:#}", style("error:").red().bold(), e);
            exit::EXIT_FAILURE
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<i32> {
    let base = load_configuration(&cli)?;

    match cli.command {
        Some(Commands::BatchedGemmMultiplyMultiply(cmd)) => profile(&cmd, base, cli.format),
        Some(Commands::List { verbose }) => {
            list(verbose);
            Ok(exit::EXIT_SUCCESS)
        }
        None => {
            Cli::command().print_help()?;
            println!();
            list(false);
            Ok(exit::EXIT_SUCCESS)
        }
    }
}

/// Defaults from `--config`, or built-in defaults.
fn load_configuration(cli: &Cli) -> Result<ProfileConfig> {
    match &cli.config {
        Some(path) => {
            let config = ProfileConfig::from_file(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            debug!(path = %path.display(), "loaded configuration");
            Ok(config)
        }
        None => Ok(ProfileConfig::default()),
    }
}

fn setup_logging(level: Option<&str>, format: LogFormat) -> Result<()> {
    let filter = match level {
        Some(level) => tracing_subscriber::EnvFilter::try_new(level)
            .with_context(|| format!("invalid log level '{level}'"))?,
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
    };

    // Logs go to stderr; stdout carries the profiler report.
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => subscriber
            .json()
            .with_timer(tracing_subscriber::fmt::time::uptime())
            .try_init(),
        LogFormat::Compact => subscriber.compact().try_init(),
        LogFormat::Pretty => subscriber.pretty().try_init(),
    }
    .map_err(|e| anyhow::anyhow!("{e}"))
}

fn profile(cmd: &ProfileCommand, base: ProfileConfig, format: OutputFormat) -> Result<i32> {
    let mut args = cmd.to_operation_args(base);
    if format == OutputFormat::Json {
        args.config.quiet = true;
    }

    let operation = find_operation(bgemm_profiler::OPERATION_NAME)?;
    debug!(data_type = %args.data_type, layout = %args.layout, "dispatching profile");
    let report = (operation.run)(&args).context("Profiling failed")?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
            println!("{json}");
        }
        OutputFormat::Text => print_summary(&report),
    }
    Ok(report.exit_code())
}

fn print_summary(report: &ProfileReport) {
    println!();
    println!("{}", style("Summary").bold().cyan());
    println!("  Signature: {}", report.signature);
    println!(
        "  Instances: {} found, {} supported",
        report.instances_found,
        report.supported_count()
    );
    if !report.best.is_empty() {
        println!("  Best:      {}", style(&report.best.name).bold());
    }
    let verdict = match report.outcome {
        SessionOutcome::Pass => style("✓ PASS").green(),
        SessionOutcome::Fail => style("✗ FAIL").red(),
        SessionOutcome::NoInstances => {
            style("✗ no instances registered for this signature").red()
        }
        SessionOutcome::NoSupportedInstances => {
            style("✗ no instance supports this problem").red()
        }
    };
    println!("  Result:    {verdict}");
}

fn list(verbose: bool) {
    println!("{}", style("Operations:").bold());
    for op in operations() {
        println!("  {:<34} {}", op.name, op.description);
    }

    println!();
    println!("{}", style("Registered signatures:").bold());
    for signature in registered_signatures() {
        let instances = get_instances(signature);
        println!("  {signature} ({} instances)", instances.len());
        if verbose {
            for op in instances {
                println!("    {}", op.type_string());
            }
        }
    }
}
