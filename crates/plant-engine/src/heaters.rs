//! Freeze-Protection Heaters
//!
//! Plain hysteresis on outdoor temperature. The commanded state is carried
//! so readings inside the deadband hold the previous decision.

use crate::config::PlantConfig;
use crate::ids::Tower;
use crate::output::CommandSnapshot;
use tracing::info;

/// Updates the heater command from outdoor temperature and writes it to all
/// three towers.
pub fn control(cfg: &PlantConfig, outdoor_f: f64, heaters_on: &mut bool, out: &mut CommandSnapshot) {
    let next = if outdoor_f < cfg.heater.on_below_f {
        true
    } else if outdoor_f > cfg.heater.off_above_f {
        false
    } else {
        *heaters_on
    };

    if next != *heaters_on {
        info!(outdoor_f, on = next, "freeze-protection heaters switching");
    }
    *heaters_on = next;

    for tower in Tower::ALL {
        out.towers[tower].heater_enable = next;
    }
}
