//! GreenButler: a greenhouse/incubator control daemon. The hardware-facing
//! components live in `greenbutler-driver`; this crate adds the threshold
//! engine, runtime configuration, and the orchestrator advanced by the
//! daemon's tick loop.

pub mod butler;
pub mod config;
pub mod control;
#[cfg(feature = "hardware")]
pub mod hw;
