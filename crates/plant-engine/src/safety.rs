//! Safety Gate
//!
//! Evaluates the critical fault conditions before any staging decision is
//! made. Any hit short-circuits the whole cycle to the safe-shutdown output.
//! Timers in the carried state are deliberately left alone on that path, so
//! minimum-off accounting still applies once the fault clears.

use crate::config::PlantConfig;
use crate::fault::Fault;
use crate::ids::{Pump, Tower};
use crate::snapshot::SensorReadings;
use tracing::error;

/// Returns every critical fault present in this cycle's readings.
///
/// Each check honors its configured bypass:
/// - tower vibration above the critical boundary (`vibration` bypass),
/// - either VFD leg current above the critical limit (`current` bypass),
/// - any pump current above the overcurrent limit (`pump_status` bypass).
pub fn critical_faults(cfg: &PlantConfig, readings: &SensorReadings) -> Vec<Fault> {
    let mut faults = Vec::new();

    if !cfg.bypasses.vibration {
        for tower in Tower::ALL {
            let v = readings.vibration_mm_s[tower];
            if v > cfg.vibration.critical_mm_s {
                error!(%tower, vibration = v, limit = cfg.vibration.critical_mm_s, "critical vibration");
                faults.push(Fault::HighVibrationCritical(tower));
            }
        }
    }

    if !cfg.bypasses.current {
        for tower in Tower::ALL {
            let i = readings.max_vfd_current(tower);
            if i > cfg.current.vfd_critical_a {
                error!(%tower, current = i, limit = cfg.current.vfd_critical_a, "critical VFD current");
                faults.push(Fault::CriticalVfdCurrent(tower));
            }
        }
    }

    if !cfg.bypasses.pump_status {
        for pump in Pump::ALL {
            let i = readings.pump_current(pump);
            if i > cfg.current.pump_max_a {
                error!(%pump, current = i, limit = cfg.current.pump_max_a, "pump overcurrent");
                faults.push(Fault::PumpOvercurrent(pump));
            }
        }
    }

    faults
}
