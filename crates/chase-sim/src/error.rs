use thiserror::Error;

/// Rejected arena configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f32 },
    #[error("{field}: min {min} exceeds max {max}")]
    InvertedRange {
        field: &'static str,
        min: f32,
        max: f32,
    },
    #[error("starting_obstacles ({starting}) exceeds max_obstacles ({max})")]
    ObstacleCount { starting: usize, max: usize },
    #[error("agent_count must be 1 or 2, got {0}")]
    AgentCount(usize),
    #[error("{count} agents need {count} spawn points, got {spawns}")]
    MissingSpawn { count: usize, spawns: usize },
    #[error("ray_count must be at least 1")]
    NoRays,
    #[error("max_steps must be at least 1")]
    NoStepBudget,
    #[error("randomize_every_n_episodes must be at least 1")]
    NoRandomizationInterval,
    #[error("{field} ({value}) must lie inside the arena half size ({half_size})")]
    OutsideArena {
        field: &'static str,
        value: f32,
        half_size: f32,
    },
}
