//! Sensor Sanitizer
//!
//! Parses the raw channel map into typed readings and guards the control
//! logic against implausible values. Loop temperatures outside physical
//! bounds are replaced with the last accepted value, so a single bad scan
//! (open thermistor, RS-485 glitch) cannot yank the staging logic around.
//! Currents and vibrations arrive pre-converted and are taken as-is; a value
//! that fails to parse reads as 0.0, which never trips a fault on its own.

use crate::config::{ChannelMap, PlantConfig};
use crate::ids::{PerPump, PerTower, Pump};
use crate::snapshot::{RawSnapshot, SensorReadings};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Accepted range for the four loop temperatures, °F.
const LOOP_TEMP_RANGE: (f64, f64) = (40.0, 120.0);
/// Accepted range for the outdoor temperature, °F.
const OUTDOOR_RANGE: (f64, f64) = (-20.0, 120.0);
/// Outdoor value used when the reading is missing or implausible, °F.
const OUTDOOR_DEFAULT: f64 = 60.0;
/// Substitution warnings are emitted once per this many cycles.
const LOG_DECIMATION: u64 = 16;

/// The most recent accepted value for each loop temperature.
///
/// Seeded with mild mid-range values so the first cycles after a cold boot
/// with a dead sensor neither stage towers nor trip the cold shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LastGoodTemps {
    pub tower_supply_f: f64,
    pub tower_return_f: f64,
    pub hp_return_f: f64,
    pub hp_supply_f: f64,
}

impl Default for LastGoodTemps {
    fn default() -> Self {
        Self {
            tower_supply_f: 75.0,
            tower_return_f: 85.0,
            hp_return_f: 85.0,
            hp_supply_f: 75.0,
        }
    }
}

/// Parses and validates one cycle's raw snapshot.
///
/// `last_good` is updated only with values that pass validation. `tick`
/// drives the deterministic decimation of substitution warnings.
pub fn sanitize(
    cfg: &PlantConfig,
    raw: &RawSnapshot,
    last_good: &mut LastGoodTemps,
    tick: u64,
) -> SensorReadings {
    let (supply_key, return_key, hp_return_key, hp_supply_key) = match cfg.channel_map {
        ChannelMap::Legacy => ("CH1", "CH2", "CH9", "CH10"),
        ChannelMap::Optimized => ("CH10", "CH9", "CH1", "CH2"),
    };

    let tower_supply_f = loop_temp(raw, supply_key, &mut last_good.tower_supply_f, tick);
    let tower_return_f = loop_temp(raw, return_key, &mut last_good.tower_return_f, tick);
    let hp_return_f = loop_temp(raw, hp_return_key, &mut last_good.hp_return_f, tick);
    let hp_supply_f = loop_temp(raw, hp_supply_key, &mut last_good.hp_supply_f, tick);

    let outdoor_f = match channel_f64(raw, "outdoorTemp") {
        Some(v) if (OUTDOOR_RANGE.0..=OUTDOOR_RANGE.1).contains(&v) => v,
        Some(v) => {
            if tick % LOG_DECIMATION == 0 {
                warn!(channel = "outdoorTemp", value = v, "outdoor reading out of range, using default");
            }
            OUTDOOR_DEFAULT
        }
        None => OUTDOOR_DEFAULT,
    };

    let setpoint_f = channel_f64(raw, "userSetpoint").unwrap_or(cfg.default_setpoint_f);

    // AI1/AI2 are tower 1's two VFD legs, AI3/AI4 tower 2's, AI5/AI6 tower 3's.
    let vfd_currents_a = PerTower::from_fn(|t| {
        let base = t.index() * 2;
        [
            channel_f64(raw, &format!("AI{}", base + 1)).unwrap_or(0.0),
            channel_f64(raw, &format!("AI{}", base + 2)).unwrap_or(0.0),
        ]
    });

    let pump_currents_a = PerPump::from_fn(|p| {
        let key = match p {
            Pump::One => "CH8",
            Pump::Two => "CH5",
            Pump::Three => "CH6",
        };
        channel_f64(raw, key).unwrap_or(0.0)
    });

    let vibration_mm_s =
        PerTower::from_fn(|t| channel_f64(raw, &format!("WTV801_{}", t.number())).unwrap_or(0.0));

    SensorReadings {
        tower_supply_f,
        tower_return_f,
        hp_return_f,
        hp_supply_f,
        outdoor_f,
        setpoint_f,
        vfd_currents_a,
        pump_currents_a,
        vibration_mm_s,
    }
}

/// Validates one loop temperature against physical bounds, falling back to
/// (and otherwise refreshing) the last accepted value.
fn loop_temp(raw: &RawSnapshot, key: &str, last_good: &mut f64, tick: u64) -> f64 {
    match channel_f64(raw, key) {
        Some(v) if (LOOP_TEMP_RANGE.0..=LOOP_TEMP_RANGE.1).contains(&v) => {
            *last_good = v;
            v
        }
        Some(v) => {
            if tick % LOG_DECIMATION == 0 {
                warn!(channel = key, value = v, last_good = *last_good, "loop temperature out of range, holding last good");
            }
            *last_good
        }
        None => *last_good,
    }
}

/// Parses a channel as f64, treating missing, empty, and unparseable values
/// alike as absent.
fn channel_f64(raw: &RawSnapshot, key: &str) -> Option<f64> {
    raw.get(key)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}
