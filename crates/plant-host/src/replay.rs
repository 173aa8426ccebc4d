//! Offline Replay
//!
//! A CLI subcommand that streams a JSONL file of recorded (or synthetic)
//! cycles through the engine and prints each command snapshot, without any
//! live plant attached. Useful for commissioning reviews and regression
//! comparisons: the engine is deterministic, so the same input file always
//! produces the same output stream.

use anyhow::{Context, Result};
use clap::Parser;
use plant_engine::{Engine, EngineState, PlantConfig, RawSnapshot, UiCommands};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::info;

/// Arguments for the `replay` subcommand.
#[derive(Parser, Debug)]
pub struct ReplayArgs {
    /// Path to the JSONL cycle file to replay.
    #[arg(required = true)]
    pub cycle_file: PathBuf,

    /// Path to the plant configuration file.
    #[arg(short, long, default_value = "plant.cfg")]
    pub config_path: PathBuf,

    /// Print full command snapshots instead of one summary line per cycle.
    #[arg(long)]
    pub full: bool,
}

/// One recorded cycle.
#[derive(Debug, Deserialize)]
struct CycleRecord {
    /// Seconds since the start of the recording.
    t: f64,
    /// Raw channel values for this cycle.
    #[serde(default)]
    channels: RawSnapshot,
    /// Operator overrides in effect for this cycle.
    #[serde(default)]
    ui: UiCommands,
}

/// Runs the replay.
pub fn run(args: ReplayArgs, cfg: PlantConfig) -> Result<()> {
    info!(file = ?args.cycle_file, "starting replay");

    let engine = Engine::new(cfg);
    let epoch = UNIX_EPOCH;
    let mut state = EngineState::new(epoch, engine.config());

    let file = File::open(&args.cycle_file)
        .with_context(|| format!("Failed to open cycle file: {:?}", args.cycle_file))?;
    let reader = BufReader::new(file);

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: CycleRecord = serde_json::from_str(&line)
            .with_context(|| format!("line {}: malformed cycle record", line_num + 1))?;

        let now = time_at(epoch, record.t);
        let out = engine.step(now, &record.channels, &record.ui, &mut state);

        if args.full {
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            println!(
                "[t={:>8.1}s] demand={:>5.1}% dT={:>6.1}F active={} lead=tower{} alarm={:?} faults={:?}",
                record.t,
                out.cooling_demand_pct,
                out.loop_delta_t_f,
                out.active_towers,
                out.lead_tower.number(),
                out.alarm,
                out.fault_conditions,
            );
        }
    }

    info!("replay finished");
    Ok(())
}

fn time_at(epoch: SystemTime, offset_s: f64) -> SystemTime {
    epoch + Duration::from_secs_f64(offset_s.max(0.0))
}
