//! Episode simulation core for the Chase arena
//!
//! This crate implements:
//! - Kinematic patrol motion for the target and dynamic obstacles
//! - A curriculum that escalates obstacle count and speed over episodes
//! - Per-agent observation encoding, reward shaping and episode lifecycle
//! - A deterministic arena host that runs the fixed per-tick order
//!
//! Physics, rendering and training are external; the core talks to its host
//! through the traits in [`traits`].

pub mod arena;
pub mod config;
pub mod curriculum;
pub mod episode;
pub mod error;
pub mod heuristic;
pub mod kinematics;
pub mod observation;
pub mod obstacle;
pub mod reward;
pub mod target;
pub mod traits;
pub mod types;
pub mod world;

// Re-export main types for convenience
pub use arena::Arena;
pub use config::{ArenaConfig, ArenaSettings};
pub use curriculum::{CurriculumConfig, CurriculumObstacleManager, CurriculumPhase, CurriculumState};
pub use episode::{AgentConfig, EpisodeController, EpisodeState, EpisodeSummary, StepResult};
pub use error::ConfigError;
pub use heuristic::ManualInput;
pub use observation::{observation_len, Observation};
pub use obstacle::{ObstacleCollision, ObstacleConfig, ObstacleMotionController};
pub use reward::{RewardBreakdown, RewardConfig, TerminalReason};
pub use target::{TargetConfig, TargetMotionController};
pub use traits::{EpisodeListener, SimRng, WorldQuery};
pub use types::{Action, AgentId, Axis, BodyCategory, BodyRef, CategoryMask, ObstacleId};
pub use world::WorldSnapshot;
