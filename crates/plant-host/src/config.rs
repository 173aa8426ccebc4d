//! Host Configuration Loader
//!
//! Parses the site's `plant.cfg` (INI format) and overlays it onto the
//! engine's compiled-in defaults. Every key is optional; a missing file key
//! means "use the commissioned default". Unknown keys are ignored so a site
//! file can carry annotations for other tools.

use anyhow::{anyhow, Context, Result};
use configparser::ini::Ini;
use plant_engine::{ChannelMap, PlantConfig, Pump, Tower};
use std::path::Path;

/// Host-side settings that are not part of the engine's decision logic.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Supervisory cycle period, seconds.
    pub cycle_period_s: f64,
    /// Telemetry report period, seconds.
    pub report_period_s: f64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            cycle_period_s: 7.0,
            report_period_s: 45.0,
        }
    }
}

/// Loads `plant.cfg`, returning the engine and host configurations.
pub fn load(path: &Path) -> Result<(PlantConfig, HostConfig)> {
    let mut ini = Ini::new();
    ini.load(path)
        .map_err(|e| anyhow!(e))
        .with_context(|| format!("Failed to load configuration file: {:?}", path))?;

    let mut cfg = PlantConfig::default();
    let mut host = HostConfig::default();

    if let Some(setpoint) = get_float(&ini, "plant", "setpoint")? {
        cfg.default_setpoint_f = setpoint;
    }
    if let Some(map) = ini.get("plant", "channel_map") {
        cfg.channel_map = match map.to_lowercase().as_str() {
            "legacy" => ChannelMap::Legacy,
            "optimized" => ChannelMap::Optimized,
            other => return Err(anyhow!("[plant] channel_map: unknown value {other:?}")),
        };
    }
    if let Some(period) = get_float(&ini, "plant", "cycle_period_s")? {
        host.cycle_period_s = period;
    }
    if let Some(period) = get_float(&ini, "plant", "report_period_s")? {
        host.report_period_s = period;
    }

    for tower in Tower::ALL {
        let key = format!("tower{}_available", tower.number());
        if let Some(avail) = get_bool(&ini, "towers", &key)? {
            cfg.equipment.tower_available[tower] = avail;
        }
        let id_key = format!("tower{}_id", tower.number());
        if let Some(id) = ini.get("towers", &id_key) {
            cfg.equipment.tower_ids[tower] = id;
        }
    }

    for pump in Pump::ALL {
        let key = format!("pump{}_available", pump.number());
        if let Some(avail) = get_bool(&ini, "pumps", &key)? {
            cfg.equipment.pump_available[pump] = avail;
        }
        let id_key = format!("pump{}_id", pump.number());
        if let Some(id) = ini.get("pumps", &id_key) {
            cfg.equipment.pump_ids[pump] = id;
        }
    }

    for (key, flag) in [
        ("emergency_stop", &mut cfg.bypasses.emergency_stop),
        ("water_level", &mut cfg.bypasses.water_level),
        ("vibration", &mut cfg.bypasses.vibration),
        ("current", &mut cfg.bypasses.current),
        ("pump_status", &mut cfg.bypasses.pump_status),
        ("vfd_fault", &mut cfg.bypasses.vfd_fault),
    ] {
        if let Some(value) = get_bool(&ini, "bypasses", key)? {
            *flag = value;
        }
    }

    Ok((cfg, host))
}

fn get_float(ini: &Ini, section: &str, key: &str) -> Result<Option<f64>> {
    ini.getfloat(section, key)
        .map_err(|e| anyhow!("[{section}] {key}: {e}"))
}

fn get_bool(ini: &Ini, section: &str, key: &str) -> Result<Option<bool>> {
    ini.getbool(section, key)
        .map_err(|e| anyhow!("[{section}] {key}: {e}"))
}
