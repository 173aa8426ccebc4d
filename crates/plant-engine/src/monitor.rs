//! Monitoring Pass
//!
//! Warning-level checks run after the automatic decisions: vibration in the
//! warning band and VFD current approaching its critical limit. An affected
//! tower keeps running but its fan is clamped down, and the ramp memory is
//! rewritten so the clamp does not cause a step change when it releases.

use crate::config::PlantConfig;
use crate::fault::Fault;
use crate::ids::{AlarmStatus, Tower};
use crate::output::CommandSnapshot;
use crate::snapshot::SensorReadings;
use crate::state::EngineState;
use tracing::warn;

/// Raises warning faults and clamps offending fan speeds.
pub fn pass(
    cfg: &PlantConfig,
    readings: &SensorReadings,
    state: &mut EngineState,
    out: &mut CommandSnapshot,
) {
    let mut any_warning = false;

    for tower in Tower::ALL {
        let mut tower_warning = false;

        if !cfg.bypasses.vibration {
            let v = readings.vibration_mm_s[tower];
            if v >= cfg.vibration.warning_mm_s && v <= cfg.vibration.critical_mm_s {
                warn!(%tower, vibration = v, "vibration in warning band");
                out.fault_conditions
                    .push(Fault::HighVibrationWarning(tower).to_string());
                tower_warning = true;
            }
        }

        if !cfg.bypasses.current {
            let i = readings.max_vfd_current(tower);
            if i >= cfg.current.vfd_warning_a && i < cfg.current.vfd_critical_a {
                warn!(%tower, current = i, "VFD current in warning band");
                out.fault_conditions
                    .push(Fault::VfdCurrentWarning(tower).to_string());
                tower_warning = true;
            }
        }

        if tower_warning {
            any_warning = true;
            let cmd = &mut out.towers[tower];
            if cmd.fan_speed_v > cfg.fan.warning_clamp_v {
                warn!(%tower, from = cmd.fan_speed_v, to = cfg.fan.warning_clamp_v, "clamping fan for warning fault");
                cmd.fan_speed_v = cfg.fan.warning_clamp_v;
                if let Some(ramp) = &mut state.ramps[tower] {
                    ramp.current_v = cfg.fan.warning_clamp_v;
                }
            }
        }
    }

    if any_warning && out.alarm != AlarmStatus::Critical {
        out.alarm = AlarmStatus::Warning;
    }
}
