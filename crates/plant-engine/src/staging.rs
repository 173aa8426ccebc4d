//! Staging Decider
//!
//! Turns ΔT (HP supply minus setpoint) into a demanded tower count and a
//! cooling-demand percentage. Hard cold-shutdown conditions win over
//! everything; after that, running towers bias the decision toward
//! continuing (hysteresis), and the plain threshold table handles the rest.

use crate::config::PlantConfig;
use crate::ids::Tower;
use crate::snapshot::SensorReadings;
use crate::state::EngineState;
use tracing::debug;

/// The staging outcome for one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StagingDecision {
    /// How many towers should run.
    pub demanded: usize,
    /// Cooling demand, percent.
    pub demand_pct: f64,
    /// HP supply minus setpoint, °F.
    pub delta_t: f64,
    /// `[lead, lag1, lag2]` duty order.
    pub duty_order: [Tower; 3],
    /// A hard limit tripped: everything must stop, minimum runtimes
    /// notwithstanding.
    pub hard_shutdown: bool,
}

/// Decides the demanded tower count and demand percentage.
///
/// Evaluated top-down, first match wins:
/// 1. cold shutdown (ΔT below the cold limit, or either hard supply
///    minimum violated) → 0 towers;
/// 2. continuation: towers already running and ΔT still above the continue
///    band → at least the running count stays on, with demand following
///    `28 + 3·ΔT`;
/// 3. the threshold table.
///
/// In the continuation case the demanded count is the larger of the running
/// count and the threshold table's answer, so escalation still works while
/// towers are held on.
pub fn decide(cfg: &PlantConfig, readings: &SensorReadings, state: &EngineState) -> StagingDecision {
    let delta_t = readings.hp_supply_f - readings.setpoint_f;
    let duty_order = Tower::duty_order(state.lead_tower);

    let hard_shutdown = delta_t < cfg.staging.cold_shutdown_delta_t
        || readings.hp_supply_f < cfg.staging.hp_supply_min_f
        || readings.tower_supply_f < cfg.staging.tower_supply_min_f;

    if hard_shutdown {
        debug!(
            delta_t,
            hp_supply = readings.hp_supply_f,
            tower_supply = readings.tower_supply_f,
            "hard shutdown conditions hold"
        );
        return StagingDecision {
            demanded: 0,
            demand_pct: 0.0,
            delta_t,
            duty_order,
            hard_shutdown: true,
        };
    }

    let (table_count, table_pct) = threshold_table(cfg, delta_t);
    let running = state.running_count();

    let (demanded, demand_pct) = if running > 0 && delta_t >= cfg.staging.continue_delta_t {
        let demanded = table_count.max(running).max(1);
        let pct = (28.0 + 3.0 * delta_t).clamp(28.0, 100.0);
        (demanded, pct)
    } else {
        (table_count, table_pct)
    };

    StagingDecision {
        demanded,
        demand_pct,
        delta_t,
        duty_order,
        hard_shutdown: false,
    }
}

/// The plain ΔT → (count, demand %) table.
fn threshold_table(cfg: &PlantConfig, delta_t: f64) -> (usize, f64) {
    let s = &cfg.staging;
    if delta_t >= s.stage4_delta_t {
        (3, 100.0)
    } else if delta_t >= s.stage3_delta_t {
        (3, 75.0)
    } else if delta_t >= s.stage2_delta_t {
        (2, 60.0)
    } else if delta_t >= s.stage1_delta_t {
        let pct = (28.0 + 2.0 * (delta_t - s.stage1_delta_t)).clamp(28.0, 50.0);
        (1, pct)
    } else {
        (0, 0.0)
    }
}
