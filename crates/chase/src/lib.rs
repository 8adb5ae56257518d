//! Headless training harness for the Chase arena
//!
//! Drives one or more arenas with a built-in policy, collects episode
//! outcomes, and writes a RON report.

pub mod config;
pub mod policy;
pub mod report;
pub mod runner;

pub use config::{RunSettings, RunnerConfig};
pub use policy::{Policy, PolicyKind};
pub use report::{ArenaReport, RunReport};
