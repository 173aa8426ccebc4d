//! Invariant sweep: drive the engine through a deterministic grid of
//! operating conditions for many consecutive cycles and check the output
//! invariants after every single tick.

use plant_engine::state::TowerRun;
use plant_engine::{
    AlarmStatus, CommandSnapshot, Engine, EngineState, PlantConfig, Pump, RawSnapshot, Tower,
    UiCommands,
};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

fn at(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

fn snapshot(hp_supply_f: f64, outdoor_f: f64, vibration: f64, pump1_a: f64) -> RawSnapshot {
    let mut raw = RawSnapshot::new();
    raw.set("CH1", 72.0)
        .set("CH2", 82.0)
        .set("CH9", 84.0)
        .set("CH10", hp_supply_f)
        .set("outdoorTemp", outdoor_f)
        .set("userSetpoint", 75.0)
        .set("CH8", pump1_a)
        .set("CH5", 20.0)
        .set("CH6", 20.0)
        .set("WTV801_1", vibration);
    raw
}

/// Checks every §8-style output invariant for one tick.
fn check_invariants(
    cfg: &PlantConfig,
    out: &CommandSnapshot,
    state: &EngineState,
    now: SystemTime,
    label: &str,
) {
    // Fan speed is 0 or within the drive's usable span.
    for tower in Tower::ALL {
        let v = out.towers[tower].fan_speed_v;
        assert!(
            v == 0.0 || (cfg.fan.min_voltage - 1e-9..=cfg.fan.max_voltage + 1e-9).contains(&v),
            "{label}: {tower} speed {v} in the forbidden gap"
        );
    }

    // Pump enables: one, or two during a changeover.
    let pumps_on = Pump::ALL.iter().filter(|&&p| out.pumps[p]).count();
    assert!(
        pumps_on == 1 || pumps_on == 2,
        "{label}: {pumps_on} pumps enabled"
    );

    // Valve outputs inside their 2-10 V span.
    for v in [out.bypass_valve_v, out.tempering_valve_v] {
        assert!(
            (cfg.valve.min_voltage - 1e-9..=cfg.valve.max_voltage + 1e-9).contains(&v),
            "{label}: valve output {v} out of span"
        );
    }

    // Minimum runtime: a running tower inside its first 420 s is commanded
    // on, unless the safety gate or a hard shutdown intervened.
    let hard_or_critical = out.alarm == AlarmStatus::Critical
        || out.readings.hp_supply_f < cfg.staging.hp_supply_min_f
        || out.readings.tower_supply_f < cfg.staging.tower_supply_min_f
        || out.loop_delta_t_f < cfg.staging.cold_shutdown_delta_t;
    for tower in Tower::ALL {
        if let TowerRun::Running { since } = state.towers[tower] {
            let run_s = now
                .duration_since(since)
                .unwrap_or(Duration::ZERO)
                .as_secs_f64();
            if run_s < cfg.timing.min_runtime_s && !hard_or_critical {
                assert!(
                    out.towers[tower].vfd_enable,
                    "{label}: {tower} inside minimum runtime but commanded off"
                );
            }
        }
        // Minimum off time: a cooling-down tower stays off.
        if let TowerRun::OffCooldown { since } = state.towers[tower] {
            let off_s = now
                .duration_since(since)
                .unwrap_or(Duration::ZERO)
                .as_secs_f64();
            if off_s < cfg.timing.min_off_time_s {
                assert!(
                    !out.towers[tower].vfd_enable,
                    "{label}: {tower} inside off cooldown but commanded on"
                );
            }
        }
    }

    // Warm weather parks both valves (no overrides in this sweep).
    if out.readings.outdoor_f >= cfg.valve.cold_regime_below_f && out.alarm != AlarmStatus::Critical
    {
        assert_eq!(out.bypass_valve_v, cfg.valve.min_voltage, "{label}: bypass");
        assert_eq!(out.tempering_valve_v, cfg.valve.min_voltage, "{label}: tempering");
    }

    // Deep cold keeps the tempering valve at or above its band floor.
    if out.readings.outdoor_f < 35.0 && out.alarm != AlarmStatus::Critical {
        assert!(
            out.tempering_valve_v >= cfg.valve.floor_below_35_v - 1e-9,
            "{label}: tempering {} under the deep-cold floor",
            out.tempering_valve_v
        );
    }
}

/// Heater transitions: off->on only below 35 °F, on->off only above 45 °F.
fn check_heater_transition(prev: bool, next: bool, outdoor_f: f64, label: &str) {
    if !prev && next {
        assert!(outdoor_f < 35.0, "{label}: heaters switched on at {outdoor_f}");
    }
    if prev && !next {
        assert!(outdoor_f > 45.0, "{label}: heaters switched off at {outdoor_f}");
    }
}

#[test]
fn invariants_hold_across_operating_grid() {
    let cfg = PlantConfig::default();
    let engine = Engine::new(cfg.clone());

    // Every combination of demand regime, weather band, vibration severity,
    // and pump health, each run for 40 consecutive 7 s cycles.
    let hp_supplies = [58.0, 70.0, 76.0, 88.0, 97.0, 107.0, 113.0];
    let outdoors = [20.0, 33.0, 38.0, 44.0, 60.0, 90.0];
    let vibrations = [0.5, 5.0, 8.0];
    let pump_currents = [20.0, 2.0];

    for &hp in &hp_supplies {
        for &outdoor in &outdoors {
            for &vib in &vibrations {
                for &pump_a in &pump_currents {
                    let label = format!("hp={hp} outdoor={outdoor} vib={vib} pump={pump_a}");
                    let mut state = EngineState::new(at(0), &cfg);
                    let raw = snapshot(hp, outdoor, vib, pump_a);
                    let mut prev_heaters = state.heaters_on;

                    for tick in 0..40u64 {
                        let now = at(100 + tick * 7);
                        let out = engine.step(now, &raw, &UiCommands::none(), &mut state);

                        if out.alarm != AlarmStatus::Critical {
                            check_invariants(&cfg, &out, &state, now, &label);
                        }
                        check_heater_transition(
                            prev_heaters,
                            state.heaters_on,
                            out.readings.outdoor_f,
                            &label,
                        );
                        prev_heaters = state.heaters_on;
                    }
                }
            }
        }
    }
}

#[test]
fn ramp_limits_hold_between_consecutive_cycles() {
    let cfg = PlantConfig::default();
    let engine = Engine::new(cfg.clone());
    let mut state = EngineState::new(at(0), &cfg);

    // Strong demand so the PID pushes the fans up from the startup floor.
    let raw = snapshot(107.0, 60.0, 0.5, 20.0);
    let mut prev_speed = [0.0f64; 3];

    for tick in 0..600u64 {
        let now = at(100 + tick * 7);
        let out = engine.step(now, &raw, &UiCommands::none(), &mut state);
        for tower in Tower::ALL {
            let v = out.towers[tower].fan_speed_v;
            let prev = prev_speed[tower.index()];
            if prev > 0.0 && v > 0.0 {
                assert!(
                    (v - prev).abs() <= cfg.fan.ramp_step_v + 1e-9,
                    "tick {tick}: {tower} jumped {prev} -> {v}"
                );
            }
            prev_speed[tower.index()] = v;
        }
    }

    // After ten minutes of saturated demand the lead fan must have ramped
    // well above the startup floor.
    assert!(prev_speed[0] > cfg.fan.min_voltage + 0.2);
}
