//! Output Command Snapshot
//!
//! The engine's entire decision for one cycle, fully materialized. The
//! runner actuates exactly what is here; nothing else crosses the boundary.

use crate::config::PlantConfig;
use crate::fault::Fault;
use crate::ids::{AlarmStatus, ControlMode, PerPump, PerTower, Tower};
use crate::snapshot::SensorReadings;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Isolation-valve command for one tower.
///
/// Tri-state by construction: open and close can never be asserted together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValveCommand {
    /// Drive the valve open.
    Open,
    /// Drive the valve closed.
    Close,
    /// Leave the valve where it is.
    Idle,
}

/// Commands for one tower.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TowerOutput {
    /// VFD run enable.
    pub vfd_enable: bool,
    /// Fan speed command, volts. Either 0 or within the VFD's usable range.
    pub fan_speed_v: f64,
    /// Isolation valve command.
    pub isolation_valve: ValveCommand,
    /// Basin heater enable.
    pub heater_enable: bool,
}

impl TowerOutput {
    /// Off, isolated, heater as given.
    fn off(heater_enable: bool) -> Self {
        Self {
            vfd_enable: false,
            fan_speed_v: 0.0,
            isolation_valve: ValveCommand::Close,
            heater_enable,
        }
    }
}

/// The complete output of one control cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandSnapshot {
    /// Per-tower commands.
    pub towers: PerTower<TowerOutput>,
    /// Per-pump run enables.
    pub pumps: PerPump<bool>,
    /// Bypass valve position command, volts.
    pub bypass_valve_v: f64,
    /// Tempering valve position command, volts.
    pub tempering_valve_v: f64,
    /// Plant alarm level.
    pub alarm: AlarmStatus,
    /// Active fault condition strings, annunciator format.
    pub fault_conditions: Vec<String>,
    /// Labels of safety bypasses currently configured.
    pub safety_bypasses: Vec<String>,
    /// Reported control mode.
    pub control_mode: ControlMode,
    /// The current lead tower.
    pub lead_tower: Tower,
    /// Number of towers with their VFD enabled.
    pub active_towers: u8,
    /// Cooling demand, percent.
    pub cooling_demand_pct: f64,
    /// HP supply minus setpoint, °F.
    pub loop_delta_t_f: f64,
    /// Target HP supply temperature, °F.
    pub target_supply_temp_f: f64,
    /// Towers that wanted to start but were held by the off cooldown.
    pub blocked_by_cooldown: Vec<Tower>,
    /// Instantaneous heat-exchanger effectiveness. Diagnostic only; `None`
    /// when the loop temperatures give no meaningful denominator.
    pub hx_effectiveness: Option<f64>,
    /// The sanitized readings this cycle decided on, mirrored for telemetry.
    pub readings: SensorReadings,
    /// When this snapshot was produced.
    pub generated_at: SystemTime,
}

/// Instantaneous HX effectiveness from the loop temperatures.
fn hx_effectiveness(readings: &SensorReadings) -> Option<f64> {
    let denom = readings.hp_return_f - readings.tower_supply_f;
    if denom.abs() < 0.5 {
        return None;
    }
    Some(((readings.hp_return_f - readings.hp_supply_f) / denom).clamp(0.0, 1.0))
}

impl CommandSnapshot {
    /// A neutral all-off snapshot the automatic passes then fill in.
    pub(crate) fn baseline(
        cfg: &PlantConfig,
        readings: SensorReadings,
        lead_tower: Tower,
        heaters_on: bool,
        now: SystemTime,
    ) -> Self {
        Self {
            towers: PerTower::uniform(TowerOutput::off(heaters_on)),
            pumps: PerPump::uniform(false),
            bypass_valve_v: cfg.valve.min_voltage,
            tempering_valve_v: cfg.valve.min_voltage,
            alarm: AlarmStatus::Normal,
            fault_conditions: Vec::new(),
            safety_bypasses: cfg.bypasses.active_labels(),
            control_mode: ControlMode::Auto,
            lead_tower,
            active_towers: 0,
            cooling_demand_pct: 0.0,
            loop_delta_t_f: readings.hp_supply_f - readings.setpoint_f,
            target_supply_temp_f: readings.setpoint_f,
            blocked_by_cooldown: Vec::new(),
            hx_effectiveness: hx_effectiveness(&readings),
            readings,
            generated_at: now,
        }
    }

    /// The safe-shutdown output forced by a critical fault: fans off and
    /// zeroed, isolation valves driven closed, pumps off, valves parked,
    /// heaters held at their last safe state.
    pub fn safe_shutdown(
        cfg: &PlantConfig,
        readings: SensorReadings,
        lead_tower: Tower,
        heaters_on: bool,
        faults: &[Fault],
        now: SystemTime,
    ) -> Self {
        let mut snap = Self::baseline(cfg, readings, lead_tower, heaters_on, now);
        snap.alarm = AlarmStatus::Critical;
        snap.fault_conditions = faults.iter().map(Fault::to_string).collect();
        snap
    }

    /// The fully-safe output returned when the engine itself fails: every
    /// enable off, every isolation valve driven closed, heaters off, valves
    /// parked, mode and alarm at `error`.
    pub fn fail_safe(cfg: &PlantConfig, now: SystemTime) -> Self {
        let mut snap = Self::baseline(cfg, SensorReadings::default(), Tower::One, false, now);
        snap.alarm = AlarmStatus::Error;
        snap.control_mode = ControlMode::Error;
        snap.fault_conditions = vec![Fault::ControlSystemError.to_string()];
        snap
    }

    /// Recounts `active_towers` from the per-tower enables.
    pub(crate) fn refresh_active_towers(&mut self) {
        self.active_towers = Tower::ALL
            .iter()
            .filter(|&&t| self.towers[t].vfd_enable)
            .count() as u8;
    }
}
