//! Fault conditions raised by the safety gate and the monitoring pass.

use crate::ids::{Pump, Tower};
use thiserror::Error;

/// A named fault condition.
///
/// The `Display` rendering matches the condition strings the plant's alarm
/// annunciator and historian key on, e.g. `TOWER2_HIGH_VIBRATION_CRITICAL`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Tower fan vibration above the critical ISO 10816 boundary.
    #[error("TOWER{}_HIGH_VIBRATION_CRITICAL", .0.number())]
    HighVibrationCritical(Tower),
    /// Tower fan vibration in the warning band.
    #[error("TOWER{}_HIGH_VIBRATION_WARNING", .0.number())]
    HighVibrationWarning(Tower),
    /// A VFD leg current above the critical limit.
    #[error("TOWER{}_CRITICAL_VFD_CURRENT", .0.number())]
    CriticalVfdCurrent(Tower),
    /// A VFD leg current in the warning band.
    #[error("TOWER{}_VFD_CURRENT_WARNING", .0.number())]
    VfdCurrentWarning(Tower),
    /// Pump motor current above the critical limit.
    #[error("PUMP{}_OVERCURRENT", .0.number())]
    PumpOvercurrent(Pump),
    /// The engine itself failed; outputs were forced to the fail-safe set.
    #[error("CONTROL_SYSTEM_ERROR")]
    ControlSystemError,
}

impl Fault {
    /// Whether this fault forces the safe-shutdown output on its own.
    pub fn is_critical(self) -> bool {
        matches!(
            self,
            Fault::HighVibrationCritical(_)
                | Fault::CriticalVfdCurrent(_)
                | Fault::PumpOvercurrent(_)
                | Fault::ControlSystemError
        )
    }
}
