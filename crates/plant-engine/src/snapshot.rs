//! Input Snapshots
//!
//! The acquisition service materializes one [`RawSnapshot`] per cycle: a flat
//! map of channel IDs to string values, exactly as the HAT/relay/RS-485
//! drivers report them. The sanitizer turns that into typed
//! [`SensorReadings`]. UI overrides arrive separately as [`UiCommands`].
//!
//! Recognized channels:
//!
//! | Key            | Meaning                              |
//! |----------------|--------------------------------------|
//! | `AI1`..`AI6`   | VFD leg currents, A (two per tower)  |
//! | `CH1`, `CH2`, `CH9`, `CH10` | loop temperatures, °F (mapping per [`ChannelMap`](crate::config::ChannelMap)) |
//! | `CH5`, `CH6`, `CH8` | pump 2, 3, 1 currents, A        |
//! | `WTV801_1`..`WTV801_3` | tower vibrations, mm/s RMS    |
//! | `outdoorTemp`  | outdoor temperature, °F              |
//! | `userSetpoint` | target HP supply temperature, °F     |

use crate::ids::{ControlMode, PerPump, PerTower, Pump, Tower};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One cycle's raw sensor readings, keyed by channel ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawSnapshot {
    pub channels: BTreeMap<String, String>,
}

impl RawSnapshot {
    /// An empty snapshot; every channel will take its documented default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a channel value. Convenient for tests and synthetic snapshots.
    pub fn set(&mut self, key: &str, value: impl ToString) -> &mut Self {
        self.channels.insert(key.to_string(), value.to_string());
        self
    }

    /// Returns the raw string for a channel, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.channels.get(key).map(String::as_str)
    }
}

/// Sanitized, typed sensor readings for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReadings {
    /// Water leaving the towers toward the heat exchanger, °F.
    pub tower_supply_f: f64,
    /// Water returning to the towers, °F.
    pub tower_return_f: f64,
    /// Heat-pump loop return, °F.
    pub hp_return_f: f64,
    /// Heat-pump loop supply, °F.
    pub hp_supply_f: f64,
    /// Outdoor dry-bulb temperature, °F.
    pub outdoor_f: f64,
    /// Target HP supply temperature, °F.
    pub setpoint_f: f64,
    /// Two VFD leg currents per tower, A.
    pub vfd_currents_a: PerTower<[f64; 2]>,
    /// Pump motor currents, A.
    pub pump_currents_a: PerPump<f64>,
    /// Tower vibration RMS velocities, mm/s.
    pub vibration_mm_s: PerTower<f64>,
}

impl Default for SensorReadings {
    fn default() -> Self {
        Self {
            tower_supply_f: 0.0,
            tower_return_f: 0.0,
            hp_return_f: 0.0,
            hp_supply_f: 0.0,
            outdoor_f: 0.0,
            setpoint_f: 0.0,
            vfd_currents_a: PerTower::uniform([0.0; 2]),
            pump_currents_a: PerPump::uniform(0.0),
            vibration_mm_s: PerTower::uniform(0.0),
        }
    }
}

impl SensorReadings {
    /// The highest of the tower's two VFD leg currents.
    pub fn max_vfd_current(&self, tower: Tower) -> f64 {
        let [a, b] = self.vfd_currents_a[tower];
        a.max(b)
    }

    /// The current drawn by the given pump.
    pub fn pump_current(&self, pump: Pump) -> f64 {
        self.pump_currents_a[pump]
    }
}

/// Operator overrides for one tower.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerOverride {
    /// Force the VFD enable on or off.
    pub vfd_enable: Option<bool>,
    /// Force the fan speed command, volts.
    pub fan_speed_v: Option<f64>,
    /// Force the basin heater on or off.
    pub heater_enable: Option<bool>,
}

impl TowerOverride {
    /// True when no field is overridden.
    pub fn is_empty(&self) -> bool {
        self.vfd_enable.is_none() && self.fan_speed_v.is_none() && self.heater_enable.is_none()
    }
}

/// Operator commands from the UI, all optional.
///
/// Overrides are applied after every automatic decision (including the
/// warning-clamp pass), so an explicit operator command always wins — except
/// against the safety gate, which runs first and short-circuits everything.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiCommands {
    /// Master enable for the whole plant.
    pub system_enabled: Option<bool>,
    /// Requested control mode.
    pub control_mode: Option<ControlMode>,
    /// Per-tower overrides.
    pub towers: PerTower<TowerOverride>,
    /// Force the bypass valve position, volts.
    pub bypass_valve_v: Option<f64>,
    /// Force the tempering valve position, volts.
    pub tempering_valve_v: Option<f64>,
}

impl Default for UiCommands {
    fn default() -> Self {
        Self {
            system_enabled: None,
            control_mode: None,
            towers: PerTower::uniform(TowerOverride::default()),
            bypass_valve_v: None,
            tempering_valve_v: None,
        }
    }
}

impl UiCommands {
    /// A command set with no overrides at all.
    pub fn none() -> Self {
        Self::default()
    }
}
