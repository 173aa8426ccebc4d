//! Fan Speed Computation
//!
//! Produces the per-tower VFD speed command in three stages: a target
//! voltage (startup floor, maintain band, or PID), a ramp filter bounding
//! the rate of change, and a final coercion that turns sub-minimum commands
//! into a clean 0 V so the drive is never asked to creep below its floor.

use crate::config::PlantConfig;
use crate::snapshot::SensorReadings;
use crate::state::{seconds_between, RampState};
use pid::PidState;
use std::time::SystemTime;
use tracing::warn;

/// Fallback step applied to `last_output` when the PID itself fails, volts.
const FALLBACK_STEP_V: f64 = 0.1;

/// Computes the pre-ramp target voltage for a running tower.
///
/// - Within the minimum-runtime window the target is pinned at the VFD floor
///   (startup floor).
/// - Within the maintain band around the setpoint the fan idles at the floor.
/// - Otherwise the PID runs on the HP supply temperature. If it errors, an
///   integrator-style step nudges the last output up or down by demand.
pub fn target_voltage(
    cfg: &PlantConfig,
    readings: &SensorReadings,
    run_seconds: f64,
    demand_pct: f64,
    pid_state: &mut PidState,
) -> f64 {
    if run_seconds < cfg.timing.min_runtime_s {
        return cfg.fan.min_voltage;
    }

    if (readings.hp_supply_f - readings.setpoint_f).abs() < cfg.fan.maintain_band_f {
        return cfg.fan.min_voltage;
    }

    let params = cfg.tower_pid_params();
    match pid::update(
        readings.hp_supply_f,
        readings.setpoint_f,
        &params,
        cfg.tower_pid.dt_s,
        pid_state,
    ) {
        Ok(out) => out.output,
        Err(err) => {
            warn!(%err, demand_pct, "fan PID failed, using proportional step fallback");
            if demand_pct > 50.0 {
                pid_state.last_output =
                    (pid_state.last_output + FALLBACK_STEP_V).min(cfg.fan.max_voltage);
            } else if demand_pct < 30.0 {
                pid_state.last_output =
                    (pid_state.last_output - FALLBACK_STEP_V).max(cfg.fan.min_voltage);
            }
            pid_state
                .last_output
                .clamp(cfg.fan.min_voltage, cfg.fan.max_voltage)
        }
    }
}

/// Applies the ramp filter, moving the commanded voltage toward `target_v`
/// by at most one step per ramp delay.
///
/// On first activation the ramp initializes at the VFD floor. Upward moves
/// wait `ramp_up_delay_s` between steps, downward moves `ramp_down_delay_s`;
/// each step is capped at `ramp_step_v`.
pub fn apply_ramp(
    cfg: &PlantConfig,
    now: SystemTime,
    target_v: f64,
    ramp: &mut Option<RampState>,
) -> f64 {
    let ramp = match ramp {
        Some(r) => r,
        None => {
            *ramp = Some(RampState {
                current_v: cfg.fan.min_voltage,
                last_change: now,
            });
            return cfg.fan.min_voltage;
        }
    };

    let delay = if target_v > ramp.current_v {
        cfg.fan.ramp_up_delay_s
    } else {
        cfg.fan.ramp_down_delay_s
    };

    if seconds_between(ramp.last_change, now) >= delay && target_v != ramp.current_v {
        let step = (target_v - ramp.current_v).clamp(-cfg.fan.ramp_step_v, cfg.fan.ramp_step_v);
        ramp.current_v += step;
        ramp.last_change = now;
    }

    ramp.current_v.clamp(cfg.fan.min_voltage, cfg.fan.max_voltage)
}

/// Post-ramp coercion: a nonzero command below the VFD floor, outside the
/// startup window, disables the drive outright.
///
/// Returns `(speed_v, enabled)`.
pub fn coerce_sub_minimum(cfg: &PlantConfig, speed_v: f64, run_seconds: f64) -> (f64, bool) {
    if speed_v > 0.0 && speed_v < cfg.fan.min_voltage && run_seconds >= cfg.timing.min_runtime_s {
        (0.0, false)
    } else {
        (speed_v, true)
    }
}
