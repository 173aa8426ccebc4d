//! Manual Override Merger
//!
//! The last pass before the snapshot leaves the engine. Operator commands
//! are authoritative over every automatic decision made this cycle,
//! including the monitoring clamps; only the safety gate, which runs first
//! and short-circuits the cycle, outranks them.

use crate::config::PlantConfig;
use crate::ids::{Pump, Tower};
use crate::output::{CommandSnapshot, ValveCommand};
use crate::snapshot::UiCommands;
use tracing::info;

/// Applies UI overrides onto the automatic output.
pub fn merge(cfg: &PlantConfig, ui: &UiCommands, out: &mut CommandSnapshot) {
    if let Some(mode) = ui.control_mode {
        out.control_mode = mode;
    }

    for tower in Tower::ALL {
        let ov = &ui.towers[tower];
        let cmd = &mut out.towers[tower];

        if let Some(speed) = ov.fan_speed_v {
            cmd.fan_speed_v = legal_speed(cfg, speed);
        }
        if let Some(enable) = ov.vfd_enable {
            cmd.vfd_enable = enable;
            if enable {
                if cmd.fan_speed_v <= 0.0 {
                    cmd.fan_speed_v = cfg.fan.min_voltage;
                }
                cmd.isolation_valve = ValveCommand::Open;
            } else {
                cmd.fan_speed_v = 0.0;
                cmd.isolation_valve = ValveCommand::Close;
            }
        }
        if let Some(heater) = ov.heater_enable {
            cmd.heater_enable = heater;
        }
    }

    if let Some(bypass) = ui.bypass_valve_v {
        out.bypass_valve_v = bypass.clamp(cfg.valve.min_voltage, cfg.valve.max_voltage);
    }
    if let Some(tempering) = ui.tempering_valve_v {
        out.tempering_valve_v = tempering.clamp(cfg.valve.min_voltage, cfg.valve.max_voltage);
    }

    // Master disable wins over everything above. Heaters stay with the
    // freeze-protection decision: they guard the equipment, not the load.
    if ui.system_enabled == Some(false) {
        info!("system disabled by operator");
        for tower in Tower::ALL {
            let cmd = &mut out.towers[tower];
            cmd.vfd_enable = false;
            cmd.fan_speed_v = 0.0;
            cmd.isolation_valve = ValveCommand::Close;
        }
        for pump in Pump::ALL {
            out.pumps[pump] = false;
        }
        out.bypass_valve_v = cfg.valve.min_voltage;
        out.tempering_valve_v = cfg.valve.min_voltage;
        out.cooling_demand_pct = 0.0;
    }
}

/// Coerces an operator speed request into the drive's legal set:
/// non-positive values read as off, anything else lands in the usable span.
fn legal_speed(cfg: &PlantConfig, requested: f64) -> f64 {
    if requested <= 0.0 {
        0.0
    } else {
        requested.clamp(cfg.fan.min_voltage, cfg.fan.max_voltage)
    }
}
