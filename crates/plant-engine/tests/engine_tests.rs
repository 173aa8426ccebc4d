//! End-to-end scenario tests: literal inputs through `Engine::step`, exact
//! expected outputs, synthetic carried state.

use float_cmp::approx_eq;
use plant_engine::state::TowerRun;
use plant_engine::{
    AlarmStatus, Engine, EngineState, PlantConfig, Pump, RawSnapshot, Tower, UiCommands,
    ValveCommand,
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn at(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

/// A healthy snapshot: legacy channel map, pump 1 drawing normal current,
/// no vibration, mild loop temperatures except the HP supply.
fn healthy_snapshot(hp_supply_f: f64, outdoor_f: f64) -> RawSnapshot {
    let mut raw = RawSnapshot::new();
    raw.set("CH1", 75.0) // tower supply
        .set("CH2", 85.0) // tower return
        .set("CH9", 85.0) // HP return
        .set("CH10", hp_supply_f) // HP supply
        .set("outdoorTemp", outdoor_f)
        .set("userSetpoint", 75.0)
        .set("CH8", 20.0) // pump 1 current
        .set("CH5", 20.0) // pump 2 current
        .set("CH6", 20.0); // pump 3 current
    raw
}

fn fresh(cfg: &PlantConfig, now: SystemTime) -> (Engine, EngineState) {
    (Engine::new(cfg.clone()), EngineState::new(now, cfg))
}

#[test]
fn warm_startup_demand_stages_lead_tower() {
    let cfg = PlantConfig::default();
    let (engine, mut state) = fresh(&cfg, at(0));

    // Outdoor 80, HP supply 90 -> dT = 15.
    let raw = healthy_snapshot(90.0, 80.0);
    let out = engine.step(at(1000), &raw, &UiCommands::none(), &mut state);

    let t1 = &out.towers[Tower::One];
    assert!(t1.vfd_enable);
    assert!(approx_eq!(f64, t1.fan_speed_v, 2.6, epsilon = 1e-9), "startup floor");
    assert_eq!(t1.isolation_valve, ValveCommand::Open);
    assert_eq!(state.towers[Tower::One], TowerRun::Running { since: at(1000) });

    assert!(!out.towers[Tower::Two].vfd_enable);
    assert!(!out.towers[Tower::Three].vfd_enable);
    assert_eq!(out.active_towers, 1);
    assert!(approx_eq!(f64, out.cooling_demand_pct, 38.0, epsilon = 1e-9));

    // Warm weather: both valves parked closed.
    assert!(approx_eq!(f64, out.bypass_valve_v, 2.0, epsilon = 1e-9));
    assert!(approx_eq!(f64, out.tempering_valve_v, 2.0, epsilon = 1e-9));
    assert_eq!(out.alarm, AlarmStatus::Normal);
}

#[test]
fn stage_escalation_brings_all_towers_at_floor() {
    let cfg = PlantConfig::default();
    let (engine, mut state) = fresh(&cfg, at(0));

    // HP supply 105 -> dT = 30 -> all three towers.
    let raw = healthy_snapshot(105.0, 80.0);
    let out = engine.step(at(1000), &raw, &UiCommands::none(), &mut state);

    for tower in Tower::ALL {
        let cmd = &out.towers[tower];
        assert!(cmd.vfd_enable, "{tower} should be enabled");
        assert!(
            approx_eq!(f64, cmd.fan_speed_v, 2.6, epsilon = 1e-9),
            "{tower} at startup floor on first cycle"
        );
        assert_eq!(cmd.isolation_valve, ValveCommand::Open);
        assert!(state.towers[tower].is_running());
    }
    assert_eq!(out.active_towers, 3);
    assert!(approx_eq!(f64, out.cooling_demand_pct, 75.0, epsilon = 1e-9));
}

#[test]
fn minimum_runtime_holds_tower_through_demand_dip() {
    let cfg = PlantConfig::default();
    let (engine, mut state) = fresh(&cfg, at(0));
    state.towers[Tower::One] = TowerRun::Running { since: at(880) };

    // dT = 2: no fresh demand, but 120 s of runtime is far short of 420 s.
    let raw = healthy_snapshot(77.0, 80.0);
    let out = engine.step(at(1000), &raw, &UiCommands::none(), &mut state);

    let t1 = &out.towers[Tower::One];
    assert!(t1.vfd_enable);
    assert!(approx_eq!(f64, t1.fan_speed_v, 2.6, epsilon = 1e-9));
    assert_eq!(t1.isolation_valve, ValveCommand::Open);
    // Start mark preserved.
    assert_eq!(state.towers[Tower::One], TowerRun::Running { since: at(880) });
}

#[test]
fn cold_shutdown_after_minimum_runtime() {
    let cfg = PlantConfig::default();
    let (engine, mut state) = fresh(&cfg, at(0));
    state.towers[Tower::One] = TowerRun::Running { since: at(500) };

    // HP supply 60 is below the 65 °F hard limit.
    let raw = healthy_snapshot(60.0, 80.0);
    let out = engine.step(at(1000), &raw, &UiCommands::none(), &mut state);

    let t1 = &out.towers[Tower::One];
    assert!(!t1.vfd_enable);
    assert!(approx_eq!(f64, t1.fan_speed_v, 0.0, epsilon = 1e-9));
    assert_eq!(t1.isolation_valve, ValveCommand::Close);
    assert_eq!(state.towers[Tower::One], TowerRun::OffCooldown { since: at(1000) });
    assert!(approx_eq!(f64, out.cooling_demand_pct, 0.0, epsilon = 1e-9));
}

#[test]
fn off_cooldown_blocks_restart_and_staging_moves_on() {
    let cfg = PlantConfig::default();
    let (engine, mut state) = fresh(&cfg, at(0));
    state.towers[Tower::One] = TowerRun::OffCooldown { since: at(940) };

    // dT = 20 -> two towers demanded; tower 1 is 60 s into its 180 s cooldown.
    let raw = healthy_snapshot(95.0, 80.0);
    let out = engine.step(at(1000), &raw, &UiCommands::none(), &mut state);

    assert!(!out.towers[Tower::One].vfd_enable);
    assert_eq!(out.blocked_by_cooldown, vec![Tower::One]);
    // The demand is met from the remaining towers.
    assert!(out.towers[Tower::Two].vfd_enable);
    assert!(out.towers[Tower::Three].vfd_enable);
    assert_eq!(out.active_towers, 2);
    // Cooldown mark untouched.
    assert_eq!(state.towers[Tower::One], TowerRun::OffCooldown { since: at(940) });
}

#[test]
fn pump_failover_runs_overlap_then_hands_off() {
    let cfg = PlantConfig::default();
    let (engine, mut state) = fresh(&cfg, at(0));
    state.pumps.last_failover = Some(at(940));

    // Pump 1 active but drawing 2 A: failed.
    let mut raw = healthy_snapshot(75.0, 80.0);
    raw.set("CH8", 2.0);

    // Tick 1: failover scheduled, both pumps commanded.
    let out = engine.step(at(1000), &raw, &UiCommands::none(), &mut state);
    assert!(out.pumps[Pump::One]);
    assert!(out.pumps[Pump::Two]);
    assert!(!out.pumps[Pump::Three]);
    assert_eq!(state.pumps.failover_count, 1);
    assert_eq!(state.pumps.active, Pump::One);
    assert!(state.pumps.changeover.is_some());

    // Tick 2, 6 s later: overlap has just elapsed; both still commanded for
    // this cycle, and the incoming pump becomes active for the next.
    let out = engine.step(at(1006), &raw, &UiCommands::none(), &mut state);
    assert!(out.pumps[Pump::One]);
    assert!(out.pumps[Pump::Two]);
    assert_eq!(state.pumps.active, Pump::Two);
    assert!(state.pumps.changeover.is_none());

    // Tick 3: single-pump operation on the new active.
    let out = engine.step(at(1012), &raw, &UiCommands::none(), &mut state);
    assert!(!out.pumps[Pump::One]);
    assert!(out.pumps[Pump::Two]);
    assert!(!out.pumps[Pump::Three]);
}
