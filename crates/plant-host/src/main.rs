//! # Plant Host
//!
//! The runner process for the cooling-plant supervisory engine. It owns
//! everything the pure engine deliberately does not: the periodic cycle, the
//! snapshot files exchanged with the acquisition and actuation services, and
//! the telemetry spool.
//!
//! ## Responsibilities
//!
//! * Load the site configuration (`plant.cfg`).
//! * Run the supervisory loop at the configured period.
//! * Spool line-protocol telemetry for the forwarder.
//! * Replay recorded cycle files for commissioning and regression work.

// Use mimalloc for better performance
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use parking_lot::Mutex;
use plant_engine::Engine;
use plant_host::{config, replay, reporter, runner};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Runner process for the cooling-plant supervisory control engine.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the live supervisory loop.
    Run(RunArgs),
    /// Replay a recorded cycle file through the engine and print the outputs.
    Replay(replay::ReplayArgs),
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
struct RunArgs {
    /// Path to the plant configuration file.
    #[arg(short, long, default_value = "plant.cfg")]
    config_path: PathBuf,

    /// Path to the sensor snapshot JSON written by the acquisition service.
    #[arg(long, default_value = "/var/lib/plant/sensors.json")]
    snapshot_path: PathBuf,

    /// Path to the operator override JSON written by the UI.
    #[arg(long, default_value = "/var/lib/plant/overrides.json")]
    ui_path: PathBuf,

    /// Path the command snapshot JSON is written to.
    #[arg(long, default_value = "/var/lib/plant/commands.json")]
    output_path: PathBuf,

    /// Path the telemetry spool is appended to.
    #[arg(long, default_value = "/var/lib/plant/telemetry.spool")]
    spool_path: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logging subscriber.
    tracing_subscriber::fmt::init();

    // Parse command-line arguments.
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_supervisor(args).await,
        Commands::Replay(args) => {
            let (cfg, _host) = config::load(&args.config_path)?;
            replay::run(args, cfg)
        }
    }
}

/// Initializes and runs the supervisory loop and the telemetry reporter.
async fn run_supervisor(args: RunArgs) -> Result<()> {
    info!("Starting plant supervisor...");

    // 1. Load configuration.
    info!("Loading configuration from: {:?}", args.config_path);
    let (cfg, host) = config::load(&args.config_path)?;

    // 2. Shared latest-output slot for the reporter.
    let latest = Arc::new(Mutex::new(None));

    // 3. Telemetry reporter task.
    let report_period = Duration::from_secs_f64(host.report_period_s);
    tokio::spawn(reporter::run(
        latest.clone(),
        args.spool_path.clone(),
        report_period,
    ));
    info!("Telemetry reporter started.");

    // 4. The supervisory loop, with Ctrl+C shutdown.
    let engine = Engine::new(cfg);
    let paths = runner::RunnerPaths {
        snapshot: args.snapshot_path,
        ui: args.ui_path,
        output: args.output_path,
    };

    tokio::select! {
        result = runner::run(engine, host, paths, latest) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting.");
            Ok(())
        }
    }
}
