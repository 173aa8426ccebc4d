//! Tower Commander and Runtime Enforcer
//!
//! The commander activates towers to meet the staging decision, honoring
//! availability and the minimum-off cooldown. The enforcer runs afterwards
//! and owns the protection timings: it reverses a commanded shutdown while a
//! tower is inside its minimum runtime, keeps a healthy running tower on
//! through demand dips, and writes the off-cooldown mark when a stop is
//! actually permitted.

use crate::config::PlantConfig;
use crate::fan;
use crate::ids::{PerTower, Tower};
use crate::output::{CommandSnapshot, ValveCommand};
use crate::snapshot::SensorReadings;
use crate::staging::StagingDecision;
use crate::state::{EngineState, TowerRun};
use std::time::SystemTime;
use tracing::{debug, info};

/// Activates up to `decision.demanded` towers and computes their fan speeds.
///
/// Selection prefers towers that are already running (in duty order), then
/// idle towers in duty order, so demand dips never swap a running lag tower
/// for the idle lead. Returns which towers the commander claimed this cycle;
/// the enforcer leaves those alone.
pub fn command_towers(
    cfg: &PlantConfig,
    now: SystemTime,
    readings: &SensorReadings,
    decision: &StagingDecision,
    state: &mut EngineState,
    out: &mut CommandSnapshot,
) -> PerTower<bool> {
    let mut selected = PerTower::uniform(false);
    let mut activated = 0usize;

    let mut candidates: Vec<Tower> = Vec::with_capacity(3);
    for &t in decision.duty_order.iter() {
        if state.towers[t].is_running() {
            candidates.push(t);
        }
    }
    for &t in decision.duty_order.iter() {
        if !state.towers[t].is_running() {
            candidates.push(t);
        }
    }

    for tower in candidates {
        if activated >= decision.demanded {
            break;
        }
        if !cfg.equipment.tower_available[tower] {
            debug!(%tower, "skipping unavailable tower");
            continue;
        }
        if let Some(off_s) = state.cooldown_seconds(tower, now) {
            if off_s < cfg.timing.min_off_time_s {
                info!(%tower, off_s, "start blocked by off cooldown");
                out.blocked_by_cooldown.push(tower);
                continue;
            }
        }

        activate(cfg, now, readings, decision, state, out, tower);
        selected[tower] = true;
        activated += 1;
    }

    selected
}

/// Starts (or continues) one tower and computes its speed command.
fn activate(
    cfg: &PlantConfig,
    now: SystemTime,
    readings: &SensorReadings,
    decision: &StagingDecision,
    state: &mut EngineState,
    out: &mut CommandSnapshot,
    tower: Tower,
) {
    if !state.towers[tower].is_running() {
        info!(%tower, "starting tower");
        state.towers[tower] = TowerRun::Running { since: now };
        state.ramps[tower] = None;
        state.tower_pids[tower].reset_to(cfg.fan.min_voltage);
    }

    // run_seconds is Some by construction here.
    let run_s = state.run_seconds(tower, now).unwrap_or(0.0);
    let target = fan::target_voltage(
        cfg,
        readings,
        run_s,
        decision.demand_pct,
        &mut state.tower_pids[tower],
    );
    let ramped = fan::apply_ramp(cfg, now, target, &mut state.ramps[tower]);
    let (speed, enabled) = fan::coerce_sub_minimum(cfg, ramped, run_s);

    let cmd = &mut out.towers[tower];
    cmd.vfd_enable = enabled;
    cmd.fan_speed_v = speed;
    cmd.isolation_valve = ValveCommand::Open;
}

/// Enforces minimum-runtime and shutdown rules on running towers the
/// commander did not claim this cycle.
///
/// - Inside the minimum runtime: forced back on at the ramp floor, unless a
///   hard-shutdown condition holds.
/// - Past the minimum with ΔT below the release band or the HP supply under
///   its hard minimum: stopped, opening the minimum-off cooldown.
/// - Past the minimum otherwise: kept on at the ramp floor, so the plant
///   does not oscillate around the setpoint.
pub fn enforce_runtime(
    cfg: &PlantConfig,
    now: SystemTime,
    readings: &SensorReadings,
    decision: &StagingDecision,
    state: &mut EngineState,
    out: &mut CommandSnapshot,
    selected: &PerTower<bool>,
) {
    for tower in Tower::ALL {
        if selected[tower] || !state.towers[tower].is_running() {
            continue;
        }
        let run_s = state.run_seconds(tower, now).unwrap_or(0.0);
        let release = decision.delta_t < cfg.staging.release_delta_t
            || readings.hp_supply_f < cfg.staging.hp_supply_min_f;
        // A tower pulled from the available set stops regardless of runtime.
        let unavailable = !cfg.equipment.tower_available[tower];

        if decision.hard_shutdown || unavailable || (run_s >= cfg.timing.min_runtime_s && release) {
            stop(state, out, tower, now);
            continue;
        }

        // Either still inside the minimum runtime, or past it with
        // conditions that still warrant cooling: hold the tower on.
        if run_s < cfg.timing.min_runtime_s {
            debug!(%tower, run_s, "minimum runtime hold");
        }
        let floor = fan::apply_ramp(cfg, now, cfg.fan.min_voltage, &mut state.ramps[tower]);
        let cmd = &mut out.towers[tower];
        cmd.vfd_enable = true;
        cmd.fan_speed_v = floor;
        cmd.isolation_valve = ValveCommand::Open;
    }
}

/// Stops a running tower and opens its minimum-off cooldown.
fn stop(state: &mut EngineState, out: &mut CommandSnapshot, tower: Tower, now: SystemTime) {
    info!(%tower, "stopping tower");
    state.towers[tower] = TowerRun::OffCooldown { since: now };
    state.ramps[tower] = None;
    let cmd = &mut out.towers[tower];
    cmd.vfd_enable = false;
    cmd.fan_speed_v = 0.0;
    cmd.isolation_valve = ValveCommand::Close;
}
