//! CLI entry point for the simulation harness: run a built-in sketch on a
//! simulated Esplora and write its snapshot trace.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use esplora_rs::scenarios::{SCENARIOS, scenario};
use esplora_rs::session::write_effective_config;
use esplora_rs::{ForcedRandom, HarnessError, SessionOptions, TraceWriter, run_session};
use esplora_shared::config::{SimConfig, load_config};

/// Simulation Harness CLI
#[derive(Parser, Debug)]
#[command(name = "sim-harness", about = "Run Arduino sketches on a simulated Esplora board.")]
pub struct Cli {
    /// Path to a TOML config file (overrides defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output directory for the trace and summary
    #[arg(short, long, default_value = "./sim_output")]
    output: PathBuf,

    /// Scenario to run
    #[arg(long, default_value = "blink")]
    scenario: String,

    /// Stop after this many simulated microseconds
    #[arg(long)]
    max_micros: Option<u64>,

    /// Stop after this many passes of the sketch loop
    #[arg(long)]
    max_iterations: Option<u64>,

    /// Force random() to return VALUE, for DRAWS calls (e.g. --force-random 4:10)
    #[arg(long)]
    force_random: Option<ForcedRandom>,

    /// Also write every snapshot as JSON lines
    #[arg(long)]
    jsonl: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available built-in scenarios
    ListScenarios,
    /// Run a single scenario (default)
    Run,
}

fn main() {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .init();

    if let Err(e) = run(cli) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), HarnessError> {
    if let Some(Commands::ListScenarios) = cli.command {
        for (name, description) in SCENARIOS {
            println!("{name:<12} {description}");
        }
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)?
        }
        None => SimConfig::default(),
    };
    let sketch =
        scenario(&cli.scenario).ok_or_else(|| HarnessError::UnknownScenario(cli.scenario.clone()))?;
    let options = SessionOptions {
        max_micros: cli.max_micros,
        max_iterations: cli.max_iterations,
        force_random: cli.force_random,
    };

    let mut trace = TraceWriter::create(&cli.output, cli.jsonl)?;
    write_effective_config(&config, &cli.output)?;
    let report = run_session(&config, sketch, &options, &mut trace)?;
    trace.finish()?;
    report.write_json(&cli.output)?;

    if !report.serial.is_empty() {
        print!("{}", report.serial);
    }
    if let Some((category, message)) = &report.failure {
        tracing::warn!(%category, %message, "sketch reported a failure");
    }
    tracing::info!(
        "{} snapshots written to {}",
        report.snapshots,
        cli.output.display()
    );
    Ok(())
}
