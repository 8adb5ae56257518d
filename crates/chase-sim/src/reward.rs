//! Reward shaping and terminal rewards

use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

/// Every shaping and terminal constant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    /// Multiplier on net distance gained toward the target
    pub approach_scale: f32,
    /// Approach shaping only fires on ticks divisible by this
    pub approach_interval: u32,

    pub wall_proximity_distance: f32,
    pub wall_proximity_penalty: f32,

    pub agent_proximity_distance: f32,
    pub agent_proximity_penalty: f32,
    pub agent_safe_band: (f32, f32),
    pub agent_safe_bonus: f32,
    pub collision_risk_threshold: f32,
    pub collision_risk_scale: f32,

    pub obstacle_danger_distance: f32,
    pub obstacle_danger_penalty: f32,
    pub obstacle_safe_band: (f32, f32),
    pub obstacle_safe_bonus: f32,

    pub jerk_threshold: f32,
    pub jerk_penalty: f32,

    pub existence_cost: f32,

    pub target_reached: f32,
    pub hit_wall: f32,
    pub agent_collision: f32,
    pub obstacle_collision: f32,
    pub timeout: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            approach_scale: 0.1,
            approach_interval: 5,
            wall_proximity_distance: 1.0,
            wall_proximity_penalty: -0.02,
            agent_proximity_distance: 1.5,
            agent_proximity_penalty: -0.02,
            agent_safe_band: (2.0, 4.0),
            agent_safe_bonus: 0.001,
            collision_risk_threshold: 0.5,
            collision_risk_scale: -0.1,
            obstacle_danger_distance: 1.5,
            obstacle_danger_penalty: -0.05,
            obstacle_safe_band: (2.0, 4.0),
            obstacle_safe_bonus: 0.004,
            jerk_threshold: 2.0,
            jerk_penalty: -0.002,
            existence_cost: -0.0002,
            target_reached: 3.0,
            hit_wall: -0.5,
            agent_collision: -0.25,
            obstacle_collision: -0.25,
            timeout: -0.5,
        }
    }
}

/// Why an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TerminalReason {
    TargetReached,
    HitWall,
    AgentCollision,
    ObstacleCollision,
    Timeout,
}

impl TerminalReason {
    pub const ALL: [TerminalReason; 5] = [
        TerminalReason::TargetReached,
        TerminalReason::HitWall,
        TerminalReason::AgentCollision,
        TerminalReason::ObstacleCollision,
        TerminalReason::Timeout,
    ];

    pub fn reward(&self, config: &RewardConfig) -> f32 {
        match self {
            TerminalReason::TargetReached => config.target_reached,
            TerminalReason::HitWall => config.hit_wall,
            TerminalReason::AgentCollision => config.agent_collision,
            TerminalReason::ObstacleCollision => config.obstacle_collision,
            TerminalReason::Timeout => config.timeout,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TerminalReason::TargetReached)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TerminalReason::TargetReached => "target_reached",
            TerminalReason::HitWall => "hit_wall",
            TerminalReason::AgentCollision => "agent_collision",
            TerminalReason::ObstacleCollision => "obstacle_collision",
            TerminalReason::Timeout => "timeout",
        }
    }
}

impl std::fmt::Display for TerminalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Measurements the shaping terms are computed from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapingInput {
    /// Step count after this tick's increment
    pub step: u32,
    /// Distance to target before the action was applied
    pub previous_distance: f32,
    /// Distance to target after the action was integrated
    pub current_distance: f32,
    pub nearest_wall_distance: f32,
    pub other_agent_distance: Option<f32>,
    pub collision_risk: f32,
    pub nearest_obstacle_distance: Option<f32>,
    /// Magnitude of the velocity change applied this tick
    pub velocity_change: f32,
}

/// Per-term contributions of one tick's shaping reward
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardBreakdown {
    pub approach: f32,
    pub wall_proximity: f32,
    pub agent_proximity: f32,
    pub collision_risk: f32,
    pub obstacle_proximity: f32,
    pub jerk: f32,
    pub existence: f32,
    pub terminal: f32,
    /// Penalties delivered by other bodies (e.g. a moving obstacle)
    pub external: f32,
}

impl RewardBreakdown {
    pub fn total(&self) -> f32 {
        self.approach
            + self.wall_proximity
            + self.agent_proximity
            + self.collision_risk
            + self.obstacle_proximity
            + self.jerk
            + self.existence
            + self.terminal
            + self.external
    }
}

impl AddAssign for RewardBreakdown {
    fn add_assign(&mut self, rhs: Self) {
        self.approach += rhs.approach;
        self.wall_proximity += rhs.wall_proximity;
        self.agent_proximity += rhs.agent_proximity;
        self.collision_risk += rhs.collision_risk;
        self.obstacle_proximity += rhs.obstacle_proximity;
        self.jerk += rhs.jerk;
        self.existence += rhs.existence;
        self.terminal += rhs.terminal;
        self.external += rhs.external;
    }
}

fn in_band(value: f32, band: (f32, f32)) -> bool {
    value > band.0 && value < band.1
}

/// Shaping reward for one running tick
pub fn shape(input: &ShapingInput, config: &RewardConfig) -> RewardBreakdown {
    let mut out = RewardBreakdown::default();
    let progressed = input.current_distance < input.previous_distance;

    if config.approach_interval > 0 && input.step % config.approach_interval == 0 {
        out.approach = (input.previous_distance - input.current_distance) * config.approach_scale;
    }

    if input.nearest_wall_distance < config.wall_proximity_distance {
        out.wall_proximity = config.wall_proximity_penalty;
    }

    if let Some(distance) = input.other_agent_distance {
        if distance < config.agent_proximity_distance {
            out.agent_proximity = config.agent_proximity_penalty;
        } else if in_band(distance, config.agent_safe_band) {
            out.agent_proximity = config.agent_safe_bonus;
        }

        if input.collision_risk > config.collision_risk_threshold {
            out.collision_risk = config.collision_risk_scale * input.collision_risk;
        }
    }

    if let Some(distance) = input.nearest_obstacle_distance {
        if distance < config.obstacle_danger_distance {
            out.obstacle_proximity = config.obstacle_danger_penalty;
        } else if in_band(distance, config.obstacle_safe_band) && progressed {
            out.obstacle_proximity = config.obstacle_safe_bonus;
        }
    }

    if input.velocity_change > config.jerk_threshold {
        out.jerk = config.jerk_penalty;
    }

    out.existence = config.existence_cost;
    out
}
