//! Runner configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. `chase.ron` in the working directory (if it exists), or an explicit file
//! 3. Environment variables prefixed with `CHASE_`
//!
//! CLI flags are applied on top by `main`.
//!
//! Example environment variable: `CHASE_SIM__AGENT__RAY_COUNT=12`

use std::path::Path;

use anyhow::{Context, Result};
use chase_sim::ArenaConfig;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::policy::PolicyKind;

/// Everything the runner needs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerConfig {
    #[serde(default)]
    pub run: RunSettings,

    #[serde(default)]
    pub sim: ArenaConfig,
}

/// How many arenas to run and for how long
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Finished episodes to collect per arena
    pub episodes: usize,
    /// Independent arenas evaluated in parallel
    pub arenas: usize,
    /// Base seed; arena `i` uses `seed + i`
    pub seed: u64,
    pub policy: PolicyKind,
    /// Show a progress bar
    pub progress: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            episodes: 100,
            arenas: 1,
            seed: 0,
            policy: PolicyKind::Greedy,
            progress: true,
        }
    }
}

impl RunnerConfig {
    /// Load configuration from defaults, file and environment
    ///
    /// With `path` the file must exist; without it `chase.ron` is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = Config::try_from(&RunnerConfig::default())
            .context("Failed to serialize default configuration")?;

        let file = match path {
            Some(path) => File::from(path).format(FileFormat::Ron).required(true),
            None => File::with_name("chase").format(FileFormat::Ron).required(false),
        };

        let builder = Config::builder()
            // Layer 1: Compiled defaults
            .add_source(defaults)
            // Layer 2: Config file
            .add_source(file)
            // Layer 3: Environment variables (CHASE_RUN__EPISODES, etc.)
            .add_source(
                Environment::with_prefix("CHASE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build().context("Failed to build configuration")?;

        let config: RunnerConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config
            .sim
            .validate()
            .context("Invalid arena configuration")?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = RunnerConfig::default();
        assert_eq!(config.run.episodes, 100);
        assert_eq!(config.run.arenas, 1);
        assert_eq!(config.sim.agent.max_steps, 1000);
    }

    #[test]
    fn test_file_layer_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".ron").tempfile().unwrap();
        writeln!(
            file,
            "(run: (episodes: 7, policy: \"random\"), sim: (agent: (ray_count: 4)))"
        )
        .unwrap();

        let config = RunnerConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.run.episodes, 7);
        assert_eq!(config.run.policy, PolicyKind::Random);
        assert_eq!(config.sim.agent.ray_count, 4);
        // Untouched values keep their defaults
        assert_eq!(config.sim.curriculum.max_obstacles, 7);
        assert_eq!(config.sim.arena.agent_spawns.len(), 2);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.ron");
        assert!(RunnerConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let mut file = tempfile::Builder::new().suffix(".ron").tempfile().unwrap();
        writeln!(file, "(sim: (curriculum: (starting_obstacles: 12)))").unwrap();
        let err = RunnerConfig::load(Some(file.path())).unwrap_err();
        assert!(format!("{err:#}").contains("starting_obstacles"));
    }
}
