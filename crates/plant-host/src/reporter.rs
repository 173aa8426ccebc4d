//! Telemetry Reporter
//!
//! Formats the latest command snapshot as one InfluxDB line-protocol record
//! and appends it to the telemetry spool file. A separate forwarder ships
//! the spool to the time-series store; this process never talks to the
//! network.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use plant_engine::{AlarmStatus, CommandSnapshot, Tower};
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};
use tracing::{debug, warn};

/// ISO 10816 zone boundaries, mm/s RMS.
const ZONE_A_MAX: f64 = 2.8;
const ZONE_B_MAX: f64 = 4.5;
const ZONE_C_MAX: f64 = 7.1;

fn alarm_label(alarm: AlarmStatus) -> &'static str {
    match alarm {
        AlarmStatus::Normal => "normal",
        AlarmStatus::Warning => "warning",
        AlarmStatus::Critical => "critical",
        AlarmStatus::Error => "error",
    }
}

/// The vibration severity zone for a velocity reading.
fn vibration_zone(mm_s: f64) -> &'static str {
    if mm_s <= ZONE_A_MAX {
        "A"
    } else if mm_s <= ZONE_B_MAX {
        "B"
    } else if mm_s <= ZONE_C_MAX {
        "C"
    } else {
        "D"
    }
}

/// Formats one snapshot as a line-protocol record.
///
/// `metrics,<tags> <fields> <timestamp_ns>` with per-tower currents, speeds,
/// vibration readings and zones, the loop temperatures, and the plant-level
/// figures.
pub fn format_line(snapshot: &CommandSnapshot) -> String {
    let mut fields = String::new();
    let r = &snapshot.readings;

    for tower in Tower::ALL {
        let n = tower.number();
        let cmd = &snapshot.towers[tower];
        let [leg_a, leg_b] = r.vfd_currents_a[tower];
        let vib = r.vibration_mm_s[tower];
        let _ = write!(
            fields,
            "tower{n}FanSpeed={:.2},tower{n}VFDEnable={}i,tower{n}CurrentA={:.2},tower{n}CurrentB={:.2},tower{n}Vibration={:.2},tower{n}VibrationZone=\"{}\",",
            cmd.fan_speed_v,
            cmd.vfd_enable as u8,
            leg_a,
            leg_b,
            vib,
            vibration_zone(vib),
        );
    }

    let _ = write!(
        fields,
        "towerSupplyTemp={:.2},towerReturnTemp={:.2},hpSupplyTemp={:.2},hpReturnTemp={:.2},outdoorTemp={:.2},targetSupplyTemp={:.2},loopDeltaT={:.2},coolingDemand={:.1},activeTowers={}i,leadTower={}i,temperingValve={:.2},bypassValve={:.2},alarm=\"{}\"",
        r.tower_supply_f,
        r.tower_return_f,
        r.hp_supply_f,
        r.hp_return_f,
        r.outdoor_f,
        snapshot.target_supply_temp_f,
        snapshot.loop_delta_t_f,
        snapshot.cooling_demand_pct,
        snapshot.active_towers,
        snapshot.lead_tower.number(),
        snapshot.tempering_valve_v,
        snapshot.bypass_valve_v,
        alarm_label(snapshot.alarm),
    );

    if let Some(eff) = snapshot.hx_effectiveness {
        let _ = write!(fields, ",hxEffectiveness={eff:.3}");
    }

    let timestamp_ns = snapshot
        .generated_at
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_nanos();

    format!("metrics,source=plant-supervisor {fields} {timestamp_ns}")
}

/// Appends one record for the latest snapshot, if any, to the spool file.
pub fn report_once(latest: &Mutex<Option<CommandSnapshot>>, spool: &Path) -> Result<()> {
    let snapshot = match latest.lock().clone() {
        Some(s) => s,
        None => {
            debug!("no snapshot yet, skipping report");
            return Ok(());
        }
    };

    let line = format_line(&snapshot);
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(spool)
        .with_context(|| format!("Failed to open telemetry spool: {:?}", spool))?;
    writeln!(file, "{line}").context("Failed to append telemetry record")?;
    Ok(())
}

/// Runs the reporter loop: one spool record per report period.
pub async fn run(
    latest: Arc<Mutex<Option<CommandSnapshot>>>,
    spool: PathBuf,
    period: Duration,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        if let Err(err) = report_once(&latest, &spool) {
            warn!(%err, "telemetry report failed");
        }
    }
}
