//! Static, read-only description of how a discussion unfolds.

pub mod config;

pub use config::{EndConditions, PhaseConfig, PhaseType, ScenarioConfig};
