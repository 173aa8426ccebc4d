//! Lead-Tower Rotation
//!
//! Evens wear across the towers by advancing the lead on a weekly boundary.
//! Also repairs the lead immediately if it becomes unavailable, since the
//! staging logic must always start its duty order from a usable tower.

use crate::config::PlantConfig;
use crate::ids::Tower;
use crate::state::{seconds_between, EngineState};
use std::time::SystemTime;
use tracing::info;

/// Advances the lead tower when the rotation period has elapsed, or at any
/// time when the current lead is configured unavailable.
///
/// The rotation anchor is reset only when the lead actually moved.
pub fn rotate_lead(cfg: &PlantConfig, now: SystemTime, state: &mut EngineState) {
    let period_elapsed =
        seconds_between(state.lead_rotation_started, now) >= cfg.timing.rotation_period_s;
    let lead_unavailable = !cfg.equipment.tower_available[state.lead_tower];

    if !period_elapsed && !lead_unavailable {
        return;
    }

    if let Some(next) = next_available(cfg, state.lead_tower) {
        if next != state.lead_tower {
            info!(from = %state.lead_tower, to = %next, "lead tower rotation");
            state.lead_tower = next;
            state.lead_rotation_started = now;
        }
    }
    // No available successor: leave the lead unchanged.
}

/// Scans forward from the tower after `from`, wrapping, for up to three
/// candidates; returns the first available one.
fn next_available(cfg: &PlantConfig, from: Tower) -> Option<Tower> {
    let mut candidate = from.next();
    for _ in 0..3 {
        if cfg.equipment.tower_available[candidate] {
            return Some(candidate);
        }
        candidate = candidate.next();
    }
    None
}
