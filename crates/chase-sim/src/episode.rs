//! Per-agent episode lifecycle, action application, and reward accounting
//!
//! One `EpisodeController` owns one agent's body state and reward
//! accumulator. Other components never write into it directly: obstacle
//! penalties and contact events arrive through `on_obstacle_collision` and
//! `on_collision_event`.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::obstacle::ObstacleCollision;
use crate::observation::{self, BodyView, Observation, ObservationContext};
use crate::reward::{self, RewardBreakdown, RewardConfig, ShapingInput, TerminalReason};
use crate::target::TargetMotionController;
use crate::traits::{EpisodeListener, SimRng, WorldQuery};
use crate::types::{planar_distance, Action, AgentId, BodyCategory};

/// Agent body and sensing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Velocity change per unit of action
    pub move_speed: f32,
    /// Speed cap applied after each action
    pub max_speed: f32,
    pub ray_count: usize,
    pub ray_distance: f32,
    /// Step budget before a timeout ends the episode
    pub max_steps: u32,
    /// Target is relocated uniformly inside [-extent, extent] on episode begin
    pub target_spawn_extent: f32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            move_speed: 100.0,
            max_speed: 5.0,
            ray_count: 8,
            ray_distance: 5.0,
            max_steps: 1000,
            target_spawn_extent: 8.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EpisodeState {
    Idle,
    Running,
    Terminating,
}

/// Mutable body and bookkeeping state of one agent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub position: Vec3,
    pub velocity: Vec3,
    pub step_count: u32,
    /// Diagnostic only
    pub cumulative_reward: f32,
}

impl AgentState {
    fn at(position: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            step_count: 0,
            cumulative_reward: 0.0,
        }
    }

    pub fn view(&self) -> BodyView {
        BodyView {
            position: self.position,
            velocity: self.velocity,
        }
    }
}

/// What the harness receives for one tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub agent: AgentId,
    pub observation: Observation,
    pub reward: f32,
    pub done: bool,
    pub terminal: Option<TerminalReason>,
    pub breakdown: RewardBreakdown,
}

/// Record of one finished episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub agent: AgentId,
    /// 1-based episode index for this agent
    pub episode: u64,
    pub steps: u32,
    pub cumulative_reward: f32,
    pub outcome: TerminalReason,
}

/// World state an agent sees during its tick
#[derive(Debug, Clone, Copy)]
pub struct TickContext {
    pub target: Vec3,
    pub other: Option<BodyView>,
    pub dt: f32,
}

#[derive(Debug, Clone)]
pub struct EpisodeController {
    id: AgentId,
    config: AgentConfig,
    rewards: RewardConfig,
    /// Half extent of the arena floor
    half_size: f32,
    spawn: Vec3,
    state: EpisodeState,
    agent: AgentState,
    episodes_started: u64,
    /// Reward earned since the last drain
    pending: RewardBreakdown,
    terminal: Option<TerminalReason>,
    summary: Option<EpisodeSummary>,
}

impl EpisodeController {
    pub fn new(
        id: AgentId,
        spawn: Vec3,
        half_size: f32,
        config: AgentConfig,
        rewards: RewardConfig,
    ) -> Self {
        Self {
            id,
            config,
            rewards,
            half_size,
            spawn,
            state: EpisodeState::Idle,
            agent: AgentState::at(spawn),
            episodes_started: 0,
            pending: RewardBreakdown::default(),
            terminal: None,
            summary: None,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn state(&self) -> EpisodeState {
        self.state
    }

    pub fn agent(&self) -> &AgentState {
        &self.agent
    }

    pub fn position(&self) -> Vec3 {
        self.agent.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.agent.velocity
    }

    pub fn view(&self) -> BodyView {
        self.agent.view()
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn episodes_started(&self) -> u64 {
        self.episodes_started
    }

    pub fn is_running(&self) -> bool {
        self.state == EpisodeState::Running
    }

    /// Move the agent body without touching episode bookkeeping
    pub fn place(&mut self, position: Vec3) {
        self.agent.position = position;
    }

    /// Start a new episode
    ///
    /// Resets the agent to its spawn point, relocates the target, and
    /// notifies the listener (normally the curriculum manager).
    pub fn begin_episode<L, R>(
        &mut self,
        target: &mut TargetMotionController,
        listener: &mut L,
        rng: &mut R,
    ) where
        L: EpisodeListener + ?Sized,
        R: SimRng + ?Sized,
    {
        if self.state == EpisodeState::Terminating {
            self.state = EpisodeState::Idle;
        }

        self.agent = AgentState::at(self.spawn);
        self.pending = RewardBreakdown::default();
        self.terminal = None;

        let extent = self.config.target_spawn_extent;
        let target_pos = Vec3::new(
            rng.uniform(-extent, extent),
            0.0,
            rng.uniform(-extent, extent),
        );
        target.relocate(target_pos);

        listener.on_agent_episode_begin(rng);

        self.episodes_started += 1;
        self.state = EpisodeState::Running;
        log::info!(
            "Episode {} start: {} at ({:.2}, {:.2}), target at ({:.2}, {:.2})",
            self.episodes_started,
            self.id,
            self.agent.position.x,
            self.agent.position.z,
            target.position().x,
            target.position().z
        );
    }

    /// Build the observation for the current world state
    pub fn observe(&self, ctx: &TickContext, world: &impl WorldQuery) -> Observation {
        observation::encode(
            &ObservationContext {
                own: self.agent.view(),
                target: ctx.target,
                other: ctx.other,
                half_size: self.half_size,
                ray_count: self.config.ray_count,
                ray_distance: self.config.ray_distance,
            },
            world,
        )
    }

    /// Observe, apply `action`, and shape this tick's reward
    ///
    /// Reward delivered later in the same tick by contact events is folded in
    /// with `settle`.
    pub fn on_action_received(
        &mut self,
        action: Action,
        ctx: &TickContext,
        world: &impl WorldQuery,
    ) -> StepResult {
        let observation = self.observe(ctx, world);

        if self.state != EpisodeState::Running {
            return StepResult {
                agent: self.id,
                observation,
                reward: 0.0,
                done: true,
                terminal: None,
                breakdown: RewardBreakdown::default(),
            };
        }

        self.agent.step_count += 1;
        if self.agent.step_count >= self.config.max_steps {
            self.terminate(TerminalReason::Timeout);
            return self.drain(observation);
        }

        let previous_distance = planar_distance(self.agent.position, ctx.target);
        let previous_velocity = self.agent.velocity;

        let velocity = (previous_velocity + action.as_vec3() * self.config.move_speed)
            .clamp_length_max(self.config.max_speed);
        self.agent.velocity = velocity;
        let moved = self.agent.position + velocity * ctx.dt;
        self.agent.position = Vec3::new(
            moved.x.clamp(-self.half_size, self.half_size),
            moved.y,
            moved.z.clamp(-self.half_size, self.half_size),
        );

        let pos = self.agent.position;
        let current_distance = planar_distance(pos, ctx.target);
        let nearest_wall_distance =
            (self.half_size - pos.x.abs()).min(self.half_size - pos.z.abs());

        let other_agent_distance = ctx.other.map(|other| planar_distance(pos, other.position));
        let collision_risk = ctx
            .other
            .map(|other| observation::collision_risk(&self.agent.view(), &other))
            .unwrap_or(0.0);
        let nearest_obstacle_distance = world
            .nearest_obstacle(pos)
            .map(|obstacle| planar_distance(pos, obstacle.position));

        let input = ShapingInput {
            step: self.agent.step_count,
            previous_distance,
            current_distance,
            nearest_wall_distance,
            other_agent_distance,
            collision_risk,
            nearest_obstacle_distance,
            velocity_change: (velocity - previous_velocity).length(),
        };
        let shaped = reward::shape(&input, &self.rewards);
        self.credit(shaped);

        log::trace!(
            "{} step {}: pos ({:.2}, {:.2}) reward {:.4}",
            self.id,
            self.agent.step_count,
            pos.x,
            pos.z,
            shaped.total()
        );

        self.drain(observation)
    }

    /// Handle a trigger/collision contact; returns the terminal reason if it ended the episode
    pub fn on_collision_event(&mut self, category: BodyCategory) -> Option<TerminalReason> {
        if self.state != EpisodeState::Running {
            return None;
        }

        let reason = match category {
            BodyCategory::Target => TerminalReason::TargetReached,
            BodyCategory::Wall => TerminalReason::HitWall,
            BodyCategory::Agent => TerminalReason::AgentCollision,
            BodyCategory::Obstacle => TerminalReason::ObstacleCollision,
        };
        self.terminate(reason);
        Some(reason)
    }

    /// Penalty sent by a moving obstacle that struck this agent
    pub fn on_obstacle_collision(&mut self, event: &ObstacleCollision) {
        if event.agent != self.id || self.state != EpisodeState::Running {
            return;
        }
        log::debug!(
            "{} struck by obstacle {}: {:+.2}",
            self.id,
            event.obstacle,
            event.penalty
        );
        self.credit(RewardBreakdown {
            external: event.penalty,
            ..Default::default()
        });
    }

    /// Fold reward and termination delivered after `on_action_received` into `result`
    pub fn settle(&mut self, result: &mut StepResult) {
        let late = std::mem::take(&mut self.pending);
        result.reward += late.total();
        result.breakdown += late;
        if let Some(reason) = self.terminal {
            result.terminal = Some(reason);
            result.done = true;
        }
    }

    /// Summary of the episode that just ended, if any
    pub fn take_summary(&mut self) -> Option<EpisodeSummary> {
        self.summary.take()
    }

    fn credit(&mut self, reward: RewardBreakdown) {
        self.agent.cumulative_reward += reward.total();
        self.pending += reward;
    }

    fn terminate(&mut self, reason: TerminalReason) {
        self.credit(RewardBreakdown {
            terminal: reason.reward(&self.rewards),
            ..Default::default()
        });
        self.terminal = Some(reason);
        self.state = EpisodeState::Terminating;
        self.summary = Some(EpisodeSummary {
            agent: self.id,
            episode: self.episodes_started,
            steps: self.agent.step_count,
            cumulative_reward: self.agent.cumulative_reward,
            outcome: reason,
        });
        log::info!(
            "Episode {} end: {} {} after {} steps, total reward {:.3}",
            self.episodes_started,
            self.id,
            reason,
            self.agent.step_count,
            self.agent.cumulative_reward
        );
    }

    fn drain(&mut self, observation: Observation) -> StepResult {
        let breakdown = std::mem::take(&mut self.pending);
        StepResult {
            agent: self.id,
            observation,
            reward: breakdown.total(),
            done: self.terminal.is_some(),
            terminal: self.terminal,
            breakdown,
        }
    }
}
