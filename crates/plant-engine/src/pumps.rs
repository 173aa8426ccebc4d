//! Pump Supervisor
//!
//! Exactly one pump carries the heat-pump loop, with weekly rotation and
//! failure-triggered failover. Both transitions go through the same overlap
//! changeover: the incoming pump runs alongside the outgoing one for a few
//! seconds so loop circulation is never lost. The loop circulates whenever
//! the system is enabled, independent of tower demand — the tempering valve
//! needs flow to protect anything.

use crate::config::PlantConfig;
use crate::ids::Pump;
use crate::output::CommandSnapshot;
use crate::snapshot::SensorReadings;
use crate::state::{seconds_between, PumpChangeover, PumpSupervisorState};
use std::time::SystemTime;
use tracing::{info, warn};

/// Runs one supervisor cycle: failure detection, rotation, changeover
/// bookkeeping, enables, and runtime accrual.
///
/// `dt_s` is the elapsed time since the previous cycle, used for the
/// runtime-hours accrual.
pub fn supervise(
    cfg: &PlantConfig,
    now: SystemTime,
    readings: &SensorReadings,
    state: &mut PumpSupervisorState,
    dt_s: f64,
    out: &mut CommandSnapshot,
) {
    // 1. Failure detection on the active pump, debounced so a changeover's
    //    own transient cannot trigger a second failover.
    if state.changeover.is_none() && !cfg.bypasses.pump_status {
        let current = readings.pump_current(state.active);
        let debounced = state
            .last_failover
            .map(|t| seconds_between(t, now) > cfg.timing.pump_failover_debounce_s)
            .unwrap_or(true);
        if current < cfg.current.pump_failure_a && debounced {
            // The failover bookkeeping advances whenever the failure fires,
            // even when no takeover exists, so the debounce window holds.
            state.failover_count += 1;
            state.last_failover = Some(now);
            match next_available(cfg, state.active).filter(|&p| p != state.active) {
                Some(next) => {
                    warn!(
                        failed = %state.active,
                        takeover = %next,
                        current,
                        "pump failure detected, scheduling failover"
                    );
                    state.changeover = Some(PumpChangeover {
                        new_pump: next,
                        started: now,
                    });
                }
                None => {
                    warn!(active = %state.active, current, "pump failure with no available takeover");
                }
            }
        }
    }

    // 2. Weekly rotation, deferred while any changeover is in flight. The
    //    rotation anchor resets whenever the period elapses, even when no
    //    alternate pump is available to rotate onto.
    if state.changeover.is_none()
        && seconds_between(state.rotation_started, now) >= cfg.timing.rotation_period_s
    {
        state.rotation_started = now;
        if let Some(next) = next_available(cfg, state.active).filter(|&p| p != state.active) {
            info!(from = %state.active, to = %next, "pump rotation");
            state.changeover = Some(PumpChangeover {
                new_pump: next,
                started: now,
            });
        }
    }

    // 3. Changeover execution: both pumps run for every cycle in which the
    //    record is present; once the overlap has elapsed the record clears
    //    and the incoming pump becomes active for the next cycle.
    if let Some(ch) = state.changeover {
        out.pumps[state.active] = true;
        out.pumps[ch.new_pump] = true;
        if seconds_between(ch.started, now) >= cfg.timing.pump_overlap_s {
            info!(from = %state.active, to = %ch.new_pump, "changeover complete");
            state.active = ch.new_pump;
            state.changeover = None;
        }
    } else {
        // 4. Normal operation.
        out.pumps[state.active] = true;
    }

    state.runtime_hours[state.active] += dt_s / 3600.0;
}

/// Scans forward from the pump after `from`, wrapping, for up to three
/// candidates; returns the first available one.
fn next_available(cfg: &PlantConfig, from: Pump) -> Option<Pump> {
    let mut candidate = from.next();
    for _ in 0..3 {
        if cfg.equipment.pump_available[candidate] {
            return Some(candidate);
        }
        candidate = candidate.next();
    }
    None
}
