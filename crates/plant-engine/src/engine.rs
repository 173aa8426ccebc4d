//! The Control Cycle
//!
//! [`Engine::step`] composes the sub-components in their contractual order:
//! sanitize → safety gate → lead rotation → staging → pumps → tower
//! commander → runtime enforcer → valves → heaters → monitoring → manual
//! merge. The order matters: the enforcer must be able to reverse a
//! commanded shutdown, and operator overrides must land after the warning
//! clamps.
//!
//! The pipeline runs on a clone of the carried state, committed only on
//! success. If anything inside panics, the caller gets the fully-safe
//! output and the state it passed in, untouched, so recovery can resume on
//! the next cycle.

use crate::config::PlantConfig;
use crate::output::CommandSnapshot;
use crate::snapshot::{RawSnapshot, UiCommands};
use crate::state::{seconds_between, EngineState};
use crate::{heaters, monitor, overrides, pumps, rotation, safety, sanitize, staging, towers, valves};
use std::panic::{self, AssertUnwindSafe};
use std::time::SystemTime;
use tracing::error;

/// Largest believable gap between cycles for runtime accrual, seconds.
/// Anything longer (host suspend, clock step) accrues as one nominal cycle.
const MAX_CYCLE_GAP_S: f64 = 60.0;

/// The supervisory control engine.
///
/// Holds only the read-only configuration; all mutable state is the
/// caller's [`EngineState`].
#[derive(Debug, Clone)]
pub struct Engine {
    config: PlantConfig,
}

impl Engine {
    /// Creates an engine over the given configuration.
    pub fn new(config: PlantConfig) -> Self {
        Self { config }
    }

    /// The engine's configuration.
    pub fn config(&self) -> &PlantConfig {
        &self.config
    }

    /// Runs one control cycle.
    ///
    /// Pure in the supervisory sense: the outputs depend only on `now`, the
    /// snapshots, and the carried state. Never blocks, never panics out.
    pub fn step(
        &self,
        now: SystemTime,
        raw: &RawSnapshot,
        ui: &UiCommands,
        state: &mut EngineState,
    ) -> CommandSnapshot {
        let mut working = state.clone();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            self.step_inner(now, raw, ui, &mut working)
        }));
        match result {
            Ok(snapshot) => {
                *state = working;
                snapshot
            }
            Err(_) => {
                error!("control cycle panicked; forcing fail-safe outputs");
                CommandSnapshot::fail_safe(&self.config, now)
            }
        }
    }

    fn step_inner(
        &self,
        now: SystemTime,
        raw: &RawSnapshot,
        ui: &UiCommands,
        state: &mut EngineState,
    ) -> CommandSnapshot {
        let cfg = &self.config;

        state.tick_count += 1;
        let dt_s = state
            .last_tick
            .map(|prev| seconds_between(prev, now))
            .filter(|&dt| dt <= MAX_CYCLE_GAP_S)
            .unwrap_or(cfg.timing.cycle_period_s);
        state.last_tick = Some(now);

        let readings = sanitize::sanitize(cfg, raw, &mut state.last_good_temps, state.tick_count);

        // Safety gate: any critical fault short-circuits the cycle. Tower
        // timers are left untouched so minimum-off accounting survives.
        let faults = safety::critical_faults(cfg, &readings);
        if !faults.is_empty() {
            return CommandSnapshot::safe_shutdown(
                cfg,
                readings,
                state.lead_tower,
                state.heaters_on,
                &faults,
                now,
            );
        }

        rotation::rotate_lead(cfg, now, state);

        let decision = staging::decide(cfg, &readings, state);
        let mut out = CommandSnapshot::baseline(cfg, readings, state.lead_tower, state.heaters_on, now);
        out.cooling_demand_pct = decision.demand_pct;
        out.loop_delta_t_f = decision.delta_t;

        pumps::supervise(cfg, now, &readings, &mut state.pumps, dt_s, &mut out);

        let selected = towers::command_towers(cfg, now, &readings, &decision, state, &mut out);
        towers::enforce_runtime(cfg, now, &readings, &decision, state, &mut out, &selected);

        valves::control(cfg, &readings, ui, &mut state.valve_pid, &mut out);
        heaters::control(cfg, readings.outdoor_f, &mut state.heaters_on, &mut out);

        monitor::pass(cfg, &readings, state, &mut out);
        overrides::merge(cfg, ui, &mut out);

        out.refresh_active_towers();
        out
    }
}
