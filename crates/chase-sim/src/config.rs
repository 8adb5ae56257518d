//! Arena configuration
//!
//! Every section has serde defaults, so a partial RON document only needs
//! the values it changes.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::curriculum::CurriculumConfig;
use crate::episode::AgentConfig;
use crate::error::ConfigError;
use crate::obstacle::ObstacleConfig;
use crate::reward::RewardConfig;
use crate::target::TargetConfig;
use crate::world::BodyRadii;

/// Complete configuration for one arena
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArenaConfig {
    #[serde(default)]
    pub arena: ArenaSettings,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub target: TargetConfig,

    #[serde(default)]
    pub obstacle: ObstacleConfig,

    #[serde(default)]
    pub curriculum: CurriculumConfig,

    #[serde(default)]
    pub rewards: RewardConfig,
}

/// Arena geometry and timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaSettings {
    /// Half extent of the floor; walls sit at ±half_size
    pub half_size: f32,
    /// Seconds per tick
    pub fixed_dt: f32,
    pub agent_count: usize,
    pub agent_radius: f32,
    pub obstacle_radius: f32,
    pub target_radius: f32,
    /// Agent spawn points on the XZ plane, one per agent
    pub agent_spawns: Vec<[f32; 2]>,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            half_size: 10.0,
            fixed_dt: 0.02,
            agent_count: 2,
            agent_radius: 0.5,
            obstacle_radius: 0.5,
            target_radius: 0.5,
            agent_spawns: vec![[-1.5, 0.0], [1.5, 0.0]],
        }
    }
}

impl ArenaSettings {
    pub fn radii(&self) -> BodyRadii {
        BodyRadii {
            agent: self.agent_radius,
            obstacle: self.obstacle_radius,
            target: self.target_radius,
        }
    }

    pub fn spawn(&self, index: usize) -> Option<Vec3> {
        self.agent_spawns
            .get(index)
            .map(|[x, z]| Vec3::new(*x, 0.0, *z))
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}

fn ordered(field: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    if min <= max {
        Ok(())
    } else {
        Err(ConfigError::InvertedRange { field, min, max })
    }
}

fn inside(field: &'static str, value: f32, half_size: f32) -> Result<(), ConfigError> {
    if value.abs() < half_size {
        Ok(())
    } else {
        Err(ConfigError::OutsideArena {
            field,
            value,
            half_size,
        })
    }
}

impl ArenaConfig {
    /// Check the structural constraints the simulation relies on
    ///
    /// Out-of-range obstacle counts and speeds are clamped at runtime and are
    /// not rejected here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let arena = &self.arena;
        let half = arena.half_size;

        positive("arena.half_size", half)?;
        positive("arena.fixed_dt", arena.fixed_dt)?;
        positive("arena.agent_radius", arena.agent_radius)?;
        positive("arena.obstacle_radius", arena.obstacle_radius)?;
        positive("arena.target_radius", arena.target_radius)?;

        if !(1..=2).contains(&arena.agent_count) {
            return Err(ConfigError::AgentCount(arena.agent_count));
        }
        if arena.agent_spawns.len() < arena.agent_count {
            return Err(ConfigError::MissingSpawn {
                count: arena.agent_count,
                spawns: arena.agent_spawns.len(),
            });
        }
        for [x, z] in arena.agent_spawns.iter().take(arena.agent_count) {
            inside("arena.agent_spawns", *x, half)?;
            inside("arena.agent_spawns", *z, half)?;
        }

        positive("agent.max_speed", self.agent.max_speed)?;
        positive("agent.ray_distance", self.agent.ray_distance)?;
        if self.agent.ray_count == 0 {
            return Err(ConfigError::NoRays);
        }
        if self.agent.max_steps == 0 {
            return Err(ConfigError::NoStepBudget);
        }
        inside("agent.target_spawn_extent", self.agent.target_spawn_extent, half)?;

        ordered("target.speed", self.target.min_speed, self.target.max_speed)?;
        positive("target.move_range", self.target.move_range)?;
        positive("target.arena_boundary", self.target.arena_boundary)?;

        positive("obstacle.move_range", self.obstacle.move_range)?;
        positive("obstacle.arena_boundary", self.obstacle.arena_boundary)?;

        let curriculum = &self.curriculum;
        if curriculum.starting_obstacles > curriculum.max_obstacles {
            return Err(ConfigError::ObstacleCount {
                starting: curriculum.starting_obstacles,
                max: curriculum.max_obstacles,
            });
        }
        ordered(
            "curriculum.start_speed",
            curriculum.start_min_speed,
            curriculum.start_max_speed,
        )?;
        ordered(
            "curriculum.end_speed",
            curriculum.end_min_speed,
            curriculum.end_max_speed,
        )?;
        if curriculum.randomize_every_n_episodes == 0 {
            return Err(ConfigError::NoRandomizationInterval);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(ArenaConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_rejects_inverted_speed_range() {
        let mut config = ArenaConfig::default();
        config.target.min_speed = 6.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedRange { field: "target.speed", .. })
        ));
    }

    #[test]
    fn test_rejects_obstacle_count_and_agent_count() {
        let mut config = ArenaConfig::default();
        config.curriculum.starting_obstacles = 9;
        assert_eq!(
            config.validate(),
            Err(ConfigError::ObstacleCount { starting: 9, max: 7 })
        );

        let mut config = ArenaConfig::default();
        config.arena.agent_count = 3;
        assert_eq!(config.validate(), Err(ConfigError::AgentCount(3)));
    }

    #[test]
    fn test_single_agent_needs_one_spawn() {
        let mut config = ArenaConfig::default();
        config.arena.agent_count = 1;
        config.arena.agent_spawns = vec![[0.0, -4.0]];
        assert_eq!(config.validate(), Ok(()));

        config.arena.agent_spawns.clear();
        assert_eq!(
            config.validate(),
            Err(ConfigError::MissingSpawn { count: 1, spawns: 0 })
        );
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config: ArenaConfig =
            ron::from_str("(agent: (ray_count: 12), curriculum: (max_obstacles: 5))").unwrap();
        assert_eq!(config.agent.ray_count, 12);
        assert_eq!(config.agent.max_steps, 1000);
        assert_eq!(config.curriculum.max_obstacles, 5);
        assert_eq!(config.arena.agent_spawns.len(), 2);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_error_messages() {
        let err = ConfigError::NonPositive {
            field: "arena.fixed_dt",
            value: 0.0,
        };
        assert_eq!(err.to_string(), "arena.fixed_dt must be positive, got 0");
    }
}
