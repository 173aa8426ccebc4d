//! Live Supervisory Loop
//!
//! Drives the engine at the configured cycle period. Each cycle reads the
//! latest sensor snapshot (written by the acquisition service) and any
//! operator override file, runs one step, writes the command snapshot for
//! the actuation service, and publishes the result for the telemetry
//! reporter. The loop never dies on bad input: a missing or malformed
//! snapshot file reads as empty, which the engine's sanitizer handles.

use crate::config::HostConfig;
use anyhow::{Context, Result};
use parking_lot::Mutex;
use plant_engine::{CommandSnapshot, Engine, EngineState, RawSnapshot, UiCommands};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{info, warn};

/// File paths the runner exchanges snapshots through.
#[derive(Debug, Clone)]
pub struct RunnerPaths {
    /// Sensor snapshot JSON, written by the acquisition service.
    pub snapshot: PathBuf,
    /// Operator override JSON, written by the UI. Optional.
    pub ui: PathBuf,
    /// Command snapshot JSON, read by the actuation service.
    pub output: PathBuf,
}

/// Runs the supervisory loop until the process is stopped.
pub async fn run(
    engine: Engine,
    host: HostConfig,
    paths: RunnerPaths,
    latest: Arc<Mutex<Option<CommandSnapshot>>>,
) -> Result<()> {
    let mut state = EngineState::new(SystemTime::now(), engine.config());
    let mut interval = tokio::time::interval(Duration::from_secs_f64(host.cycle_period_s));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    info!(period_s = host.cycle_period_s, "supervisory loop starting");
    loop {
        interval.tick().await;
        let now = SystemTime::now();

        let raw = read_snapshot(&paths.snapshot);
        let ui = read_ui(&paths.ui);

        let out = engine.step(now, &raw, &ui, &mut state);

        if let Err(err) = write_output(&paths.output, &out) {
            warn!(%err, "failed to write command snapshot");
        }
        *latest.lock() = Some(out);
    }
}

/// Reads the sensor snapshot file; any failure yields an empty snapshot.
fn read_snapshot(path: &Path) -> RawSnapshot {
    match std::fs::read_to_string(path) {
        Ok(text) => match serde_json::from_str(&text) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(%err, ?path, "malformed sensor snapshot, treating as empty");
                RawSnapshot::new()
            }
        },
        Err(err) => {
            warn!(%err, ?path, "sensor snapshot unreadable, treating as empty");
            RawSnapshot::new()
        }
    }
}

/// Reads the operator override file; absence means no overrides.
fn read_ui(path: &Path) -> UiCommands {
    match std::fs::read_to_string(path) {
        Ok(text) => match serde_json::from_str(&text) {
            Ok(ui) => ui,
            Err(err) => {
                warn!(%err, ?path, "malformed override file, ignoring");
                UiCommands::none()
            }
        },
        Err(_) => UiCommands::none(),
    }
}

/// Writes the command snapshot atomically (write-then-rename) so the
/// actuation service never reads a torn file.
fn write_output(path: &Path, out: &CommandSnapshot) -> Result<()> {
    let json = serde_json::to_string_pretty(out).context("serializing command snapshot")?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).with_context(|| format!("writing {:?}", tmp))?;
    std::fs::rename(&tmp, path).with_context(|| format!("renaming into {:?}", path))?;
    Ok(())
}
