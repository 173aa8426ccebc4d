//! Tempering and Bypass Valve Control
//!
//! Freeze protection for the heat-pump loop. In warm weather both valves
//! park at the closed end of their 2–10 V span. Below the cold-regime
//! boundary a PID positions the tempering valve to hold the averaged HP
//! loop temperature, with hard minimum positions by outdoor band and a slew
//! limit on normal movement. The band floors are hard minimums: they apply
//! even when the slew limit would otherwise hold the valve lower.

use crate::config::PlantConfig;
use crate::output::CommandSnapshot;
use crate::snapshot::{SensorReadings, UiCommands};
use pid::PidState;
use tracing::warn;

/// Positions the tempering and bypass valves for this cycle.
pub fn control(
    cfg: &PlantConfig,
    readings: &SensorReadings,
    ui: &UiCommands,
    valve_pid: &mut PidState,
    out: &mut CommandSnapshot,
) {
    let v = &cfg.valve;

    // Operator override of both valves disables automatic control entirely.
    if let (Some(bypass), Some(tempering)) = (ui.bypass_valve_v, ui.tempering_valve_v) {
        out.bypass_valve_v = bypass.clamp(v.min_voltage, v.max_voltage);
        out.tempering_valve_v = tempering.clamp(v.min_voltage, v.max_voltage);
        return;
    }

    if readings.outdoor_f >= v.cold_regime_below_f {
        // Warm regime: both valves closed, controller memory parked so the
        // next cold spell starts from a clean state.
        out.bypass_valve_v = v.min_voltage;
        out.tempering_valve_v = v.min_voltage;
        valve_pid.reset_to(v.min_voltage);
    } else {
        out.bypass_valve_v = v.min_voltage;
        out.tempering_valve_v = cold_regime_position(cfg, readings, valve_pid);
    }

    // A single-valve override still wins over the automatic result.
    if let Some(bypass) = ui.bypass_valve_v {
        out.bypass_valve_v = bypass.clamp(v.min_voltage, v.max_voltage);
    }
    if let Some(tempering) = ui.tempering_valve_v {
        out.tempering_valve_v = tempering.clamp(v.min_voltage, v.max_voltage);
    }
}

/// The cold-regime tempering position: PID on the averaged HP loop
/// temperature, band floors, slew limit, floors re-applied.
fn cold_regime_position(cfg: &PlantConfig, readings: &SensorReadings, valve_pid: &mut PidState) -> f64 {
    let v = &cfg.valve;
    let hp_loop = (readings.hp_supply_f + readings.hp_return_f) / 2.0;
    let previous = valve_pid.last_output;

    let raw = match pid::update(hp_loop, v.loop_setpoint_f, &cfg.valve_pid_params(), v.dt_s, valve_pid)
    {
        Ok(out) => out.output,
        Err(err) => {
            let fallback = if readings.outdoor_f < 35.0 {
                v.fallback_cold_v
            } else {
                v.fallback_mild_v
            };
            warn!(%err, fallback, "tempering PID failed, holding fallback position");
            valve_pid.last_output = fallback;
            return fallback.clamp(v.min_voltage, v.max_voltage);
        }
    };

    let floor = outdoor_band_floor(cfg, readings.outdoor_f);
    let floored = raw.max(floor);

    // Normal movement is slew-limited; the band floor stays a hard minimum.
    let slewed = floored.clamp(previous - v.slew_limit_v, previous + v.slew_limit_v);
    let position = slewed.max(floor).clamp(v.min_voltage, v.max_voltage);

    // Next cycle slews from what was actually commanded.
    valve_pid.last_output = position;
    position
}

/// The minimum tempering position for the current outdoor band.
fn outdoor_band_floor(cfg: &PlantConfig, outdoor_f: f64) -> f64 {
    if outdoor_f < 35.0 {
        cfg.valve.floor_below_35_v
    } else if outdoor_f < 40.0 {
        cfg.valve.floor_below_40_v
    } else {
        cfg.valve.min_voltage
    }
}
