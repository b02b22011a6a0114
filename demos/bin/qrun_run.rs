//! Run one bundled algorithm end to end on QCloud.
//!
//! The API key is read from the variable named by `credential_var`
//! (`API_KEY` unless configured otherwise). A `.env` file in the working
//! directory is loaded first.

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use qrun_adapter_qcloud::{QCloudBackend, originir};
use qrun_demos::circuits::Algorithm;
use qrun_demos::runner::AlgorithmRunner;
use qrun_demos::{
    print_header, print_histogram, print_info, print_result, print_section, print_success,
};
use qrun_hal::{Backend, QrunConfig};

#[derive(Parser, Debug)]
#[command(name = "qrun-run")]
#[command(about = "Run a small quantum algorithm on a remote QPU")]
#[command(version)]
struct Args {
    /// Algorithm to run. Lists the algorithms when omitted.
    #[arg(value_enum)]
    algorithm: Option<Algorithm>,

    /// Number of shots (defaults to the algorithm's own)
    #[arg(short, long)]
    shots: Option<u32>,

    /// YAML configuration file (defaults to ~/.qrun/config.yaml when present)
    #[arg(short, long, env = "QRUN_CONFIG")]
    config: Option<PathBuf>,

    /// Machine to run on (origin_72 or full_amplitude)
    #[arg(short, long)]
    backend: Option<String>,

    /// Print the OriginIR program before submitting
    #[arg(long)]
    show_program: bool,

    /// Number of outcomes to print
    #[arg(long, default_value = "16")]
    top: usize,

    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let Some(algorithm) = args.algorithm else {
        list_algorithms();
        return Ok(());
    };

    let config_path = args.config.or_else(default_config_path);
    let mut config = QrunConfig::load(config_path.as_deref()).context("Failed to load configuration")?;
    if let Some(backend) = args.backend {
        config.backend.backend = backend;
        config.validate()?;
    }

    let mut runner = AlgorithmRunner::new(algorithm);
    if let Some(shots) = args.shots {
        runner = runner.with_shots(shots);
    }

    print_header(&format!("qrun: {algorithm}"));
    print_info(algorithm.description());

    let backend = QCloudBackend::from_config(&config.backend).context("Failed to create QCloud backend")?;
    let backend: Arc<dyn Backend> = Arc::new(backend);

    print_section("Backend");
    let caps = backend.capabilities();
    print_result("Machine", backend.name());
    print_result("Qubits", caps.num_qubits);
    print_result("Simulator", caps.is_simulator);
    print_result("Shots", runner.shots);

    if args.show_program {
        let circuit = runner.build(&config)?;
        let decomposed = caps.decomposer().decompose(&circuit)?;
        print_section("OriginIR");
        println!("{}", originir::emit(&decomposed)?);
    }

    print_section("Execution");
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(format!("Running {algorithm} on {}...", backend.name()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let report = runner.run(backend, &config).await;
    spinner.finish_and_clear();
    let report = report?;

    print_result("Logical operations", report.circuit.num_ops());
    print_result("Native operations", report.decomposed.operations().len());
    print_result("Physical qubits", report.decomposed.used_physical_qubits().len());
    if let Some(ms) = report.result.execution_time_ms {
        print_result("Execution time", format!("{ms} ms"));
    }

    print_section("Counts");
    print_histogram(&report.result.counts, args.top);

    if algorithm == Algorithm::RandomNumber {
        print_section("Random integers");
        for (value, count) in &report.integers {
            for _ in 0..*count {
                println!("  {value}");
            }
        }
    }

    if let Some((bitstring, count)) = report.most_frequent() {
        println!();
        print_success(&format!(
            "Most frequent outcome {} ({count} of {} shots)",
            style(bitstring).bold(),
            report.result.counts.total_shots()
        ));
    }

    Ok(())
}

/// `~/.qrun/config.yaml`, if it exists.
fn default_config_path() -> Option<PathBuf> {
    let path = dirs::home_dir()?.join(".qrun").join("config.yaml");
    path.is_file().then_some(path)
}

fn list_algorithms() {
    print_header("qrun algorithms");
    for algorithm in Algorithm::ALL {
        println!(
            "  {:<18} {:>2} qubits {:>5} shots  {}",
            style(algorithm.name()).bold(),
            algorithm.num_qubits(),
            algorithm.default_shots(),
            algorithm.description()
        );
    }
    println!();
}
