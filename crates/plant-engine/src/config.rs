//! Plant Configuration
//!
//! Every constant the engine decides with lives here: equipment inventory
//! and availability, safety-check bypasses, staging thresholds, VFD limits,
//! protection timings, and the valve/heater freeze-protection tuning. The
//! defaults are the commissioned values for the three-tower plant; the host
//! overlays site-specific overrides from its INI file.

use crate::ids::{PerPump, PerTower};
use serde::{Deserialize, Serialize};

/// Which analog channel carries which loop temperature.
///
/// The two generations of the acquisition wiring disagree on the mapping of
/// CH1/CH2/CH9/CH10 to the four loop temperatures. The correct choice must
/// come from physical commissioning; `Legacy` is the longest-deployed wiring
/// and is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelMap {
    /// CH1 = tower supply, CH2 = tower return, CH9 = HP return, CH10 = HP supply.
    Legacy,
    /// CH10 = tower supply, CH9 = tower return, CH1 = HP return, CH2 = HP supply.
    Optimized,
}

/// Equipment inventory: identifiers and availability flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentConfig {
    /// Opaque tower identifiers, as known to the historian.
    pub tower_ids: PerTower<String>,
    /// Opaque pump identifiers.
    pub pump_ids: PerPump<String>,
    /// Towers the staging logic may use. An unavailable tower is never
    /// commanded on and is skipped by lead rotation.
    pub tower_available: PerTower<bool>,
    /// Pumps the supervisor may select for rotation or failover.
    pub pump_available: PerPump<bool>,
}

impl Default for EquipmentConfig {
    fn default() -> Self {
        Self {
            tower_ids: PerTower::from_fn(|t| format!("CT-{}", t.number())),
            pump_ids: PerPump::from_fn(|p| format!("CWP-{}", p.number())),
            tower_available: PerTower::uniform(true),
            pump_available: PerPump::uniform(true),
        }
    }
}

/// Per-domain safety-check bypass switches.
///
/// A set flag disables the corresponding check. Bypasses exist for
/// commissioning and sensor-failure workarounds; every active bypass is
/// reported in the output snapshot so it cannot go unnoticed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyBypasses {
    pub emergency_stop: bool,
    pub water_level: bool,
    pub vibration: bool,
    pub current: bool,
    pub pump_status: bool,
    pub vfd_fault: bool,
}

impl SafetyBypasses {
    /// Labels of the bypasses currently active, for the output snapshot.
    pub fn active_labels(&self) -> Vec<String> {
        let mut labels = Vec::new();
        for (flag, label) in [
            (self.emergency_stop, "EMERGENCY_STOP"),
            (self.water_level, "WATER_LEVEL"),
            (self.vibration, "VIBRATION"),
            (self.current, "CURRENT"),
            (self.pump_status, "PUMP_STATUS"),
            (self.vfd_fault, "VFD_FAULT"),
        ] {
            if flag {
                labels.push(label.to_string());
            }
        }
        labels
    }
}

/// Staging thresholds and hard limits, in °F.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StagingConfig {
    /// ΔT at which the first tower stages on.
    pub stage1_delta_t: f64,
    /// ΔT at which a second tower stages on.
    pub stage2_delta_t: f64,
    /// ΔT at which all three towers stage on.
    pub stage3_delta_t: f64,
    /// ΔT at which demand saturates at 100%.
    pub stage4_delta_t: f64,
    /// ΔT below which everything shuts down cold.
    pub cold_shutdown_delta_t: f64,
    /// Running towers continue while ΔT stays at or above this.
    pub continue_delta_t: f64,
    /// A tower past its minimum runtime releases below this ΔT.
    pub release_delta_t: f64,
    /// Hard minimum heat-pump supply temperature.
    pub hp_supply_min_f: f64,
    /// Hard minimum tower supply temperature.
    pub tower_supply_min_f: f64,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            stage1_delta_t: 10.0,
            stage2_delta_t: 20.0,
            stage3_delta_t: 30.0,
            stage4_delta_t: 35.0,
            cold_shutdown_delta_t: -15.0,
            continue_delta_t: -5.0,
            release_delta_t: -10.0,
            hp_supply_min_f: 65.0,
            tower_supply_min_f: 50.0,
        }
    }
}

/// Fan VFD output range and ramp behavior.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FanConfig {
    /// Lowest speed command the drive accepts; anything below is coerced to
    /// 0 V (drive disabled).
    pub min_voltage: f64,
    /// Full-speed command.
    pub max_voltage: f64,
    /// Seconds between upward ramp steps.
    pub ramp_up_delay_s: f64,
    /// Seconds between downward ramp steps.
    pub ramp_down_delay_s: f64,
    /// Largest voltage move per ramp step.
    pub ramp_step_v: f64,
    /// Speed a warning-level fault clamps a fan down to.
    pub warning_clamp_v: f64,
    /// |HP supply − setpoint| band inside which fans hold minimum speed.
    pub maintain_band_f: f64,
}

impl Default for FanConfig {
    fn default() -> Self {
        Self {
            min_voltage: 2.6,
            max_voltage: 4.8,
            ramp_up_delay_s: 15.0,
            ramp_down_delay_s: 20.0,
            ramp_step_v: 0.3,
            warning_clamp_v: 3.5,
            maintain_band_f: 2.0,
        }
    }
}

/// Equipment-protection timings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Minimum tower runtime after a start, seconds.
    pub min_runtime_s: f64,
    /// Minimum tower off time after a stop, seconds.
    pub min_off_time_s: f64,
    /// Pump changeover overlap, seconds.
    pub pump_overlap_s: f64,
    /// Lead-tower and pump rotation period, seconds.
    pub rotation_period_s: f64,
    /// Minimum spacing between pump failovers, seconds.
    pub pump_failover_debounce_s: f64,
    /// Nominal supervisory cycle period, seconds.
    pub cycle_period_s: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            min_runtime_s: 420.0,
            min_off_time_s: 180.0,
            pump_overlap_s: 5.0,
            rotation_period_s: 7.0 * 24.0 * 3600.0,
            pump_failover_debounce_s: 30.0,
            cycle_period_s: 7.0,
        }
    }
}

/// Vibration severity boundaries, mm/s RMS (ISO 10816 zone edges).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VibrationConfig {
    pub warning_mm_s: f64,
    pub critical_mm_s: f64,
}

impl Default for VibrationConfig {
    fn default() -> Self {
        Self {
            warning_mm_s: 4.5,
            critical_mm_s: 7.1,
        }
    }
}

/// Current limits, amperes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurrentConfig {
    /// VFD leg current warning threshold.
    pub vfd_warning_a: f64,
    /// VFD leg current critical threshold.
    pub vfd_critical_a: f64,
    /// Minimum current a healthy running pump draws.
    pub pump_min_running_a: f64,
    /// Pump overcurrent critical threshold.
    pub pump_max_a: f64,
    /// Below this the active pump is considered failed and a changeover is
    /// scheduled.
    pub pump_failure_a: f64,
}

impl Default for CurrentConfig {
    fn default() -> Self {
        Self {
            vfd_warning_a: 40.0,
            vfd_critical_a: 45.0,
            pump_min_running_a: 5.0,
            pump_max_a: 45.0,
            pump_failure_a: 10.0,
        }
    }
}

/// Tempering/bypass valve control for freeze protection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValveConfig {
    /// Outdoor temperature below which the cold regime is active.
    pub cold_regime_below_f: f64,
    /// HP-loop temperature the tempering PID holds in the cold regime.
    pub loop_setpoint_f: f64,
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    /// Valve signal range, volts (2 V closed, 10 V full open).
    pub min_voltage: f64,
    pub max_voltage: f64,
    /// Anti-windup cap on the PID integral.
    pub max_integral: f64,
    /// Minimum tempering position when outdoor is below 35 °F.
    pub floor_below_35_v: f64,
    /// Minimum tempering position when outdoor is below 40 °F.
    pub floor_below_40_v: f64,
    /// Largest tempering move per cycle.
    pub slew_limit_v: f64,
    /// Fixed position used when the PID fails, outdoor below 35 °F.
    pub fallback_cold_v: f64,
    /// Fixed position used when the PID fails, milder outdoor.
    pub fallback_mild_v: f64,
    /// PID step interval, seconds (the supervisory cycle period).
    pub dt_s: f64,
}

impl Default for ValveConfig {
    fn default() -> Self {
        Self {
            cold_regime_below_f: 42.0,
            loop_setpoint_f: 45.0,
            kp: 2.5,
            ki: 0.15,
            kd: 0.05,
            min_voltage: 2.0,
            max_voltage: 10.0,
            max_integral: 50.0,
            floor_below_35_v: 6.8,
            floor_below_40_v: 5.2,
            slew_limit_v: 0.4,
            fallback_cold_v: 7.6,
            fallback_mild_v: 6.0,
            dt_s: 7.0,
        }
    }
}

/// Freeze-protection heater hysteresis, °F.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeaterConfig {
    /// Heaters switch on below this outdoor temperature.
    pub on_below_f: f64,
    /// Heaters switch off above this outdoor temperature.
    pub off_above_f: f64,
}

impl Default for HeaterConfig {
    fn default() -> Self {
        Self {
            on_below_f: 35.0,
            off_above_f: 45.0,
        }
    }
}

/// Tower fan PID tuning.
///
/// Reverse-acting: fan speed rises as the HP supply temperature rises above
/// the setpoint. The proportional gain is sized so the P term spans the
/// 2.2 V drive range over roughly the staging band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TowerPidConfig {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
    pub max_integral: f64,
    /// PID step interval, seconds.
    pub dt_s: f64,
}

impl Default for TowerPidConfig {
    fn default() -> Self {
        Self {
            kp: 0.12,
            ki: 0.008,
            kd: 0.0,
            max_integral: 100.0,
            dt_s: 15.0,
        }
    }
}

/// The complete, read-only plant configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlantConfig {
    pub equipment: EquipmentConfig,
    pub bypasses: SafetyBypasses,
    pub staging: StagingConfig,
    pub fan: FanConfig,
    pub timing: TimingConfig,
    pub vibration: VibrationConfig,
    pub current: CurrentConfig,
    pub valve: ValveConfig,
    pub heater: HeaterConfig,
    pub tower_pid: TowerPidConfig,
    pub channel_map: ChannelMap,
    /// Setpoint used when the UI has not supplied one, °F.
    pub default_setpoint_f: f64,
}

impl PlantConfig {
    /// The tower PID parameter set for the `pid` crate.
    pub fn tower_pid_params(&self) -> pid::PidParams {
        pid::PidParams::new(
            self.tower_pid.kp,
            self.tower_pid.ki,
            self.tower_pid.kd,
            self.fan.min_voltage,
            self.fan.max_voltage,
        )
        .reverse_acting()
        .with_max_integral(self.tower_pid.max_integral)
    }

    /// The tempering-valve PID parameter set for the `pid` crate.
    pub fn valve_pid_params(&self) -> pid::PidParams {
        pid::PidParams::new(
            self.valve.kp,
            self.valve.ki,
            self.valve.kd,
            self.valve.min_voltage,
            self.valve.max_voltage,
        )
        .with_max_integral(self.valve.max_integral)
    }
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            equipment: EquipmentConfig::default(),
            bypasses: SafetyBypasses::default(),
            staging: StagingConfig::default(),
            fan: FanConfig::default(),
            timing: TimingConfig::default(),
            vibration: VibrationConfig::default(),
            current: CurrentConfig::default(),
            valve: ValveConfig::default(),
            heater: HeaterConfig::default(),
            tower_pid: TowerPidConfig::default(),
            channel_map: ChannelMap::default(),
            default_setpoint_f: 75.0,
        }
    }
}

impl Default for ChannelMap {
    fn default() -> Self {
        ChannelMap::Legacy
    }
}
