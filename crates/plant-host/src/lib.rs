//! Library surface of the plant host: configuration loading, the live
//! supervisory loop, offline replay, and the telemetry reporter. The binary
//! in `main.rs` is a thin CLI over these modules, and the integration tests
//! drive them directly.

pub mod config;
pub mod replay;
pub mod reporter;
pub mod runner;
