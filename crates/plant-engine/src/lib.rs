//! # Cooling-Plant Supervisory Engine
//!
//! `plant-engine` is the control core for a three-tower evaporative cooling
//! plant serving a heat-pump loop. Each supervisory cycle it ingests a raw
//! sensor snapshot, operator commands, and the carried state, and returns a
//! complete output command snapshot:
//!
//! ```no_run
//! use plant_engine::{Engine, EngineState, PlantConfig, RawSnapshot, UiCommands};
//! use std::time::SystemTime;
//!
//! let config = PlantConfig::default();
//! let engine = Engine::new(config.clone());
//! let mut state = EngineState::new(SystemTime::now(), &config);
//!
//! let mut raw = RawSnapshot::new();
//! raw.set("CH10", 90.0).set("outdoorTemp", 80.0);
//!
//! let out = engine.step(SystemTime::now(), &raw, &UiCommands::none(), &mut state);
//! println!("demand {:.0}%, alarm {:?}", out.cooling_demand_pct, out.alarm);
//! ```
//!
//! ## Guarantees
//!
//! - **Deterministic**: outputs depend only on the inputs and carried state;
//!   the engine never reads the clock or performs I/O.
//! - **Safe under any input**: implausible sensor values are substituted,
//!   critical faults short-circuit to a safe shutdown, and an internal
//!   failure yields the fail-safe output with the state untouched.
//! - **Equipment protection**: minimum runtimes, off cooldowns, VFD ramp
//!   limits, pump changeover overlap, and freeze protection are enforced
//!   regardless of demand.

pub mod config;
pub mod engine;
pub mod fan;
pub mod fault;
pub mod heaters;
pub mod ids;
pub mod monitor;
pub mod output;
pub mod overrides;
pub mod pumps;
pub mod rotation;
pub mod safety;
pub mod sanitize;
pub mod snapshot;
pub mod staging;
pub mod state;
pub mod towers;
pub mod valves;

// Re-export the types that make up the engine's public contract.
pub use config::{ChannelMap, PlantConfig};
pub use engine::Engine;
pub use fault::Fault;
pub use ids::{AlarmStatus, ControlMode, PerPump, PerTower, Pump, Tower};
pub use output::{CommandSnapshot, TowerOutput, ValveCommand};
pub use snapshot::{RawSnapshot, SensorReadings, TowerOverride, UiCommands};
pub use state::{EngineState, TowerRun};
