//! Integration tests for the host: configuration overlay, telemetry
//! formatting, and offline replay of a synthetic cycle file.

use plant_host::{config, replay, reporter};
use plant_engine::{
    ChannelMap, Engine, EngineState, PlantConfig, Pump, RawSnapshot, Tower, UiCommands,
};
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, UNIX_EPOCH};

/// Creates a uniquely-named scratch file under the system temp directory.
fn scratch_path(name: &str) -> PathBuf {
    let unique = format!(
        "plant-host-test-{}-{}",
        std::process::id(),
        name
    );
    std::env::temp_dir().join(unique)
}

#[test]
fn config_overlay_applies_site_settings() {
    let path = scratch_path("plant.cfg");
    std::fs::write(
        &path,
        r#"
[plant]
setpoint = 72.5
channel_map = optimized
cycle_period_s = 5

[towers]
tower2_available = false
tower3_id = CT-NORTH

[pumps]
pump3_available = false

[bypasses]
vibration = true
"#,
    )
    .unwrap();

    let (cfg, host) = config::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(cfg.default_setpoint_f, 72.5);
    assert_eq!(cfg.channel_map, ChannelMap::Optimized);
    assert_eq!(host.cycle_period_s, 5.0);
    assert_eq!(host.report_period_s, 45.0, "unset keys keep defaults");

    assert!(cfg.equipment.tower_available[Tower::One]);
    assert!(!cfg.equipment.tower_available[Tower::Two]);
    assert_eq!(cfg.equipment.tower_ids[Tower::Three], "CT-NORTH");
    assert!(!cfg.equipment.pump_available[Pump::Three]);
    assert!(cfg.bypasses.vibration);
    assert!(!cfg.bypasses.current);
}

#[test]
fn config_rejects_unknown_channel_map() {
    let path = scratch_path("bad.cfg");
    std::fs::write(&path, "[plant]\nchannel_map = sideways\n").unwrap();
    let result = config::load(&path);
    std::fs::remove_file(&path).ok();
    assert!(result.is_err());
}

#[test]
fn telemetry_line_carries_tower_fields_and_zones() {
    let cfg = PlantConfig::default();
    let engine = Engine::new(cfg.clone());
    let mut state = EngineState::new(UNIX_EPOCH, &cfg);

    let mut raw = RawSnapshot::new();
    raw.set("CH1", 75.0)
        .set("CH2", 85.0)
        .set("CH9", 85.0)
        .set("CH10", 95.0)
        .set("outdoorTemp", 80.0)
        .set("CH8", 20.0)
        .set("CH5", 20.0)
        .set("CH6", 20.0)
        .set("WTV801_2", 5.0); // zone C vibration on tower 2

    let now = UNIX_EPOCH + Duration::from_secs(1000);
    let out = engine.step(now, &raw, &UiCommands::none(), &mut state);
    let line = reporter::format_line(&out);

    assert!(line.starts_with("metrics,source=plant-supervisor "));
    assert!(line.contains("tower1FanSpeed=2.60"));
    assert!(line.contains("tower2VibrationZone=\"C\""));
    assert!(line.contains("tower1VibrationZone=\"A\""));
    assert!(line.contains("hpSupplyTemp=95.00"));
    assert!(line.contains("loopDeltaT=20.00"));
    assert!(line.ends_with(&format!(" {}", 1000u128 * 1_000_000_000)));
}

#[test]
fn replay_consumes_a_cycle_file() {
    let path = scratch_path("cycles.jsonl");
    let mut file = std::fs::File::create(&path).unwrap();
    for tick in 0..5 {
        writeln!(
            file,
            r#"{{"t": {}, "channels": {{"CH10": "95", "CH1": "75", "CH2": "85", "CH9": "85", "outdoorTemp": "80", "CH8": "20", "CH5": "20", "CH6": "20"}}}}"#,
            tick * 7
        )
        .unwrap();
    }
    drop(file);

    let args = replay::ReplayArgs {
        cycle_file: path.clone(),
        config_path: PathBuf::from("unused.cfg"),
        full: false,
    };
    let result = replay::run(args, PlantConfig::default());
    std::fs::remove_file(&path).ok();
    result.unwrap();
}
