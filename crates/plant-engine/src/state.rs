//! Carried Engine State
//!
//! Everything the engine remembers between cycles lives in [`EngineState`].
//! The caller owns it, passes it by mutable reference into each tick, and
//! may persist it (all types serialize). Nothing in here is shared; the
//! engine never retains a reference after returning.
//!
//! Tower run phases use tagged variants instead of nullable timer pairs, so
//! "a tower is either idle, running since t, or cooling down since t" is a
//! structural fact rather than a discipline.

use crate::ids::{PerPump, PerTower, Pump, Tower};
use crate::sanitize::LastGoodTemps;
use pid::PidState;
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};

/// The run phase of one tower.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TowerRun {
    /// Off, free to start.
    Idle,
    /// Commanded on; `since` anchors the minimum-runtime hold.
    Running { since: SystemTime },
    /// Recently stopped; `since` anchors the minimum-off cooldown.
    OffCooldown { since: SystemTime },
}

impl TowerRun {
    /// Whether the tower is in its running phase.
    pub fn is_running(&self) -> bool {
        matches!(self, TowerRun::Running { .. })
    }

    /// The start instant, if running.
    pub fn running_since(&self) -> Option<SystemTime> {
        match self {
            TowerRun::Running { since } => Some(*since),
            _ => None,
        }
    }

    /// The stop instant, if cooling down.
    pub fn cooldown_since(&self) -> Option<SystemTime> {
        match self {
            TowerRun::OffCooldown { since } => Some(*since),
            _ => None,
        }
    }
}

/// VFD ramp-filter memory for one running tower.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RampState {
    /// The speed currently commanded, volts.
    pub current_v: f64,
    /// When the speed last moved.
    pub last_change: SystemTime,
}

/// An in-progress pump changeover.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PumpChangeover {
    /// The pump taking over.
    pub new_pump: Pump,
    /// When the overlap window opened.
    pub started: SystemTime,
}

/// Pump supervisor memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PumpSupervisorState {
    /// The pump currently carrying the loop.
    pub active: Pump,
    /// Anchor of the weekly rotation.
    pub rotation_started: SystemTime,
    /// Set while an overlap changeover is in progress.
    pub changeover: Option<PumpChangeover>,
    /// Failovers since boot.
    pub failover_count: u32,
    /// When the last failover was scheduled, for debouncing.
    pub last_failover: Option<SystemTime>,
    /// Accumulated runtime per pump, hours.
    pub runtime_hours: PerPump<f64>,
}

impl PumpSupervisorState {
    fn new(now: SystemTime) -> Self {
        Self {
            active: Pump::One,
            rotation_started: now,
            changeover: None,
            failover_count: 0,
            last_failover: None,
            runtime_hours: PerPump::uniform(0.0),
        }
    }
}

/// The full carried state threaded through successive `step` calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineState {
    /// The primary-duty tower.
    pub lead_tower: Tower,
    /// Anchor of the weekly lead rotation.
    pub lead_rotation_started: SystemTime,
    /// Run phase per tower.
    pub towers: PerTower<TowerRun>,
    /// Ramp memory per tower; `None` while a tower is off.
    pub ramps: PerTower<Option<RampState>>,
    /// Fan PID memory per tower.
    pub tower_pids: PerTower<PidState>,
    /// Tempering-valve PID memory.
    pub valve_pid: PidState,
    /// Pump supervisor memory.
    pub pumps: PumpSupervisorState,
    /// Last accepted loop temperatures.
    pub last_good_temps: LastGoodTemps,
    /// Last commanded freeze-protection heater state.
    pub heaters_on: bool,
    /// When the previous cycle ran, for runtime accrual.
    pub last_tick: Option<SystemTime>,
    /// Monotone cycle counter; drives deterministic log decimation.
    pub tick_count: u64,
}

impl EngineState {
    /// A fresh state anchored at `now`: lead tower 1, pump 1 active, all
    /// towers idle, PID memories at rest, rotation clocks starting.
    ///
    /// PID `last_output` fields are seeded from the configured minimums so
    /// the first fallback or slew step starts from a sane position.
    pub fn new(now: SystemTime, cfg: &crate::config::PlantConfig) -> Self {
        Self {
            lead_tower: Tower::One,
            lead_rotation_started: now,
            towers: PerTower::uniform(TowerRun::Idle),
            ramps: PerTower::uniform(None),
            tower_pids: PerTower::uniform(PidState::resting_at(cfg.fan.min_voltage)),
            valve_pid: PidState::resting_at(cfg.valve.min_voltage),
            pumps: PumpSupervisorState::new(now),
            last_good_temps: LastGoodTemps::default(),
            heaters_on: false,
            last_tick: None,
            tick_count: 0,
        }
    }

    /// Number of towers currently in their running phase.
    pub fn running_count(&self) -> usize {
        Tower::ALL
            .iter()
            .filter(|&&t| self.towers[t].is_running())
            .count()
    }

    /// Seconds a tower has been running at `now`, if it is running.
    pub fn run_seconds(&self, tower: Tower, now: SystemTime) -> Option<f64> {
        self.towers[tower]
            .running_since()
            .map(|since| seconds_between(since, now))
    }

    /// Seconds a tower has been cooling down at `now`, if it is.
    pub fn cooldown_seconds(&self, tower: Tower, now: SystemTime) -> Option<f64> {
        self.towers[tower]
            .cooldown_since()
            .map(|since| seconds_between(since, now))
    }
}

/// Elapsed seconds from `earlier` to `later`, saturating at zero if the
/// clock stepped backwards.
pub fn seconds_between(earlier: SystemTime, later: SystemTime) -> f64 {
    later
        .duration_since(earlier)
        .unwrap_or(Duration::ZERO)
        .as_secs_f64()
}
