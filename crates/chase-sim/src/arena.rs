//! Deterministic arena host
//!
//! Composes the target, the curriculum-managed obstacles, and one or two
//! agents around a seeded RNG, and runs the fixed per-tick order:
//!
//! 1. target and obstacles advance against the tick-start snapshot
//! 2. each agent observes the post-motion world, applies its action, and
//!    shapes its reward
//! 3. contacts that started this tick are delivered (target, wall, agent,
//!    obstacle), then late reward is folded into each agent's result

use std::collections::BTreeSet;

use glam::Vec3;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

use crate::config::ArenaConfig;
use crate::curriculum::{CurriculumObstacleManager, CurriculumState, SceneEvent};
use crate::episode::{EpisodeController, EpisodeSummary, StepResult, TickContext};
use crate::error::ConfigError;
use crate::observation::Observation;
use crate::target::TargetMotionController;
use crate::types::{planar_distance, Action, AgentId, BodyCategory, BodyRef, ObstacleId};
use crate::world::WorldSnapshot;

type Contact = (BodyRef, BodyRef);

fn contact(a: BodyRef, b: BodyRef) -> Contact {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Order in which an agent's new contacts are delivered
fn dispatch_rank(category: BodyCategory) -> u8 {
    match category {
        BodyCategory::Target => 0,
        BodyCategory::Wall => 1,
        BodyCategory::Agent => 2,
        BodyCategory::Obstacle => 3,
    }
}

/// One self-contained training arena
#[derive(Debug, Clone)]
pub struct Arena {
    config: ArenaConfig,
    rng: Xoshiro256StarStar,
    target: TargetMotionController,
    obstacles: CurriculumObstacleManager,
    agents: Vec<EpisodeController>,
    /// Contacts active at the end of the previous tick
    contacts: BTreeSet<Contact>,
    tick: u64,
    summaries: Vec<EpisodeSummary>,
}

impl Arena {
    /// Build an arena and begin the first episode for every agent
    pub fn new(config: ArenaConfig, seed: u64) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
        let mut target_config = config.target.clone();
        target_config.arena_boundary = target_config.arena_boundary.min(config.arena.half_size);
        let target = TargetMotionController::new(target_config, &mut rng);
        let obstacles = CurriculumObstacleManager::new(
            config.curriculum.clone(),
            config.obstacle.clone(),
            &mut rng,
        );

        let agents = config
            .arena
            .agent_spawns
            .iter()
            .take(config.arena.agent_count)
            .enumerate()
            .map(|(i, [x, z])| {
                EpisodeController::new(
                    AgentId(i as u8),
                    Vec3::new(*x, 0.0, *z),
                    config.arena.half_size,
                    config.agent.clone(),
                    config.rewards.clone(),
                )
            })
            .collect();

        let mut arena = Self {
            config,
            rng,
            target,
            obstacles,
            agents,
            contacts: BTreeSet::new(),
            tick: 0,
            summaries: Vec::new(),
        };

        for i in 0..arena.agents.len() {
            arena.begin_episode(AgentId(i as u8));
        }

        log::info!(
            "Arena ready: seed {}, {} agents, {} obstacles",
            seed,
            arena.agents.len(),
            arena.obstacles.obstacles().len()
        );
        Ok(arena)
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn agent(&self, id: AgentId) -> Option<&EpisodeController> {
        self.agents.get(id.index())
    }

    pub fn agents(&self) -> &[EpisodeController] {
        &self.agents
    }

    pub fn target(&self) -> &TargetMotionController {
        &self.target
    }

    pub fn obstacles(&self) -> &CurriculumObstacleManager {
        &self.obstacles
    }

    pub fn curriculum(&self) -> &CurriculumState {
        self.obstacles.state()
    }

    /// Start a new episode for one agent
    pub fn begin_episode(&mut self, id: AgentId) -> bool {
        let Some(agent) = self.agents.get_mut(id.index()) else {
            return false;
        };
        agent.begin_episode(&mut self.target, &mut self.obstacles, &mut self.rng);

        let me = BodyRef::Agent(id);
        self.contacts.retain(|(a, b)| *a != me && *b != me);
        self.forget_stale_obstacles();
        true
    }

    /// Frozen view of every body right now
    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            half_size: self.config.arena.half_size,
            radii: self.config.arena.radii(),
            target: self.target.position(),
            agents: self.agents.iter().map(|a| (a.id(), a.view())).collect(),
            obstacles: self.obstacles.snapshots(),
        }
    }

    /// Observation for one agent against the current world
    pub fn observation(&self, id: AgentId) -> Option<Observation> {
        let agent = self.agents.get(id.index())?;
        let world = self.snapshot();
        let ctx = TickContext {
            target: world.target,
            other: world.other_agent(id).copied(),
            dt: self.config.arena.fixed_dt,
        };
        Some(agent.observe(&ctx, &world))
    }

    /// Advance one tick; `actions[i]` drives agent `i`, missing entries idle
    pub fn step(&mut self, actions: &[Action]) -> Vec<StepResult> {
        let dt = self.config.arena.fixed_dt;
        self.tick += 1;

        let start = self.snapshot();
        self.target.tick(dt, &mut self.rng);
        for obstacle in self.obstacles.obstacles_mut() {
            obstacle.tick(dt, &start);
        }

        let moved = self.snapshot();
        let mut results: Vec<StepResult> = self
            .agents
            .iter_mut()
            .enumerate()
            .map(|(i, agent)| {
                let ctx = TickContext {
                    target: moved.target,
                    other: moved.other_agent(agent.id()).copied(),
                    dt,
                };
                let action = actions.get(i).copied().unwrap_or(Action::NONE);
                agent.on_action_received(action, &ctx, &moved)
            })
            .collect();

        self.deliver_contacts();

        for (agent, result) in self.agents.iter_mut().zip(results.iter_mut()) {
            agent.settle(result);
            if let Some(summary) = agent.take_summary() {
                self.summaries.push(summary);
            }
        }

        log::trace!(
            "Tick {}: rewards {:?}",
            self.tick,
            results.iter().map(|r| r.reward).collect::<Vec<_>>()
        );
        results
    }

    /// Contacts touching right now
    fn current_contacts(&self) -> BTreeSet<Contact> {
        let world = self.snapshot();
        let radii = world.radii;
        let mut touching = BTreeSet::new();

        for (id, view) in &world.agents {
            let me = BodyRef::Agent(*id);
            if WorldSnapshot::overlaps(view.position, world.target, radii.agent, radii.target) {
                touching.insert(contact(me, BodyRef::Target));
            }
            if world.wall_clearance(view.position, radii.agent) <= 0.0 {
                touching.insert(contact(me, BodyRef::Wall));
            }
            for (other_id, other) in &world.agents {
                if other_id > id
                    && WorldSnapshot::overlaps(
                        view.position,
                        other.position,
                        radii.agent,
                        radii.agent,
                    )
                {
                    touching.insert(contact(me, BodyRef::Agent(*other_id)));
                }
            }
            for obstacle in &world.obstacles {
                if WorldSnapshot::overlaps(
                    view.position,
                    obstacle.position,
                    radii.agent,
                    radii.obstacle,
                ) {
                    touching.insert(contact(me, BodyRef::Obstacle(obstacle.id)));
                }
            }
        }

        for (i, a) in world.obstacles.iter().enumerate() {
            // Obstacles are clamped to `obstacle.arena_boundary`, so this only fires
            // when that boundary lies beyond `half_size - obstacle_radius`
            if world.wall_clearance(a.position, radii.obstacle) <= 0.0 {
                touching.insert(contact(BodyRef::Obstacle(a.id), BodyRef::Wall));
            }
            for b in &world.obstacles[i + 1..] {
                if planar_distance(a.position, b.position) <= radii.obstacle * 2.0 {
                    touching.insert(contact(BodyRef::Obstacle(a.id), BodyRef::Obstacle(b.id)));
                }
            }
        }

        touching
    }

    /// Deliver contacts that began this tick
    fn deliver_contacts(&mut self) {
        let touching = self.current_contacts();
        let started: Vec<Contact> = touching.difference(&self.contacts).copied().collect();
        self.contacts = touching;

        // Agent-side events, per agent in dispatch order
        let mut agent_events: Vec<(AgentId, BodyRef)> = Vec::new();
        for (a, b) in &started {
            match (a, b) {
                (BodyRef::Agent(x), BodyRef::Agent(y)) => {
                    agent_events.push((*x, *b));
                    agent_events.push((*y, *a));
                }
                (other, BodyRef::Agent(id)) | (BodyRef::Agent(id), other) => {
                    agent_events.push((*id, *other));
                }
                _ => {}
            }
        }
        agent_events.sort_by_key(|(id, other)| (*id, dispatch_rank(other.category())));

        for (id, other) in agent_events {
            if let BodyRef::Obstacle(obstacle_id) = other {
                let penalty = self
                    .obstacles
                    .obstacle_mut(obstacle_id)
                    .and_then(|o| o.on_collision(BodyRef::Agent(id)));
                if let (Some(event), Some(agent)) = (penalty, self.agents.get_mut(id.index())) {
                    agent.on_obstacle_collision(&event);
                }
            }
            if let Some(agent) = self.agents.get_mut(id.index()) {
                agent.on_collision_event(other.category());
            }
        }

        // Obstacle-side reactions to walls and each other
        for (a, b) in &started {
            match (a, b) {
                (BodyRef::Wall, BodyRef::Obstacle(id)) => {
                    self.obstacle_collision(*id, BodyRef::Wall)
                }
                (BodyRef::Obstacle(x), BodyRef::Obstacle(y)) => {
                    self.obstacle_collision(*x, *b);
                    self.obstacle_collision(*y, *a);
                }
                _ => {}
            }
        }
    }

    fn obstacle_collision(&mut self, id: ObstacleId, other: BodyRef) {
        if let Some(obstacle) = self.obstacles.obstacle_mut(id) {
            obstacle.on_collision(other);
        }
    }

    /// Drop remembered contacts for obstacles that no longer exist
    fn forget_stale_obstacles(&mut self) {
        let live: BTreeSet<ObstacleId> =
            self.obstacles.obstacles().iter().map(|o| o.id()).collect();
        let alive = |body: &BodyRef| match body {
            BodyRef::Obstacle(id) => live.contains(id),
            _ => true,
        };
        self.contacts.retain(|(a, b)| alive(a) && alive(b));
    }

    /// Force an out-of-cycle curriculum randomization
    pub fn manual_randomize(&mut self) {
        self.obstacles.manual_randomize(&mut self.rng);
        self.forget_stale_obstacles();
    }

    /// Put one obstacle back at its spawn point
    pub fn reset_obstacle(&mut self, id: ObstacleId) -> bool {
        self.obstacles.reset_obstacle(id, &mut self.rng)
    }

    /// Put the target back at its spawn point
    pub fn reset_target(&mut self) {
        self.target.reset(&mut self.rng);
    }

    /// Teleport an agent; episode state is untouched
    pub fn place_agent(&mut self, id: AgentId, position: Vec3) -> bool {
        match self.agents.get_mut(id.index()) {
            Some(agent) => {
                agent.place(position);
                true
            }
            None => false,
        }
    }

    /// Teleport the target; its patrol continues from there
    pub fn place_target(&mut self, position: Vec3) {
        self.target.relocate(position);
    }

    /// Episodes finished since the last call
    pub fn take_summaries(&mut self) -> Vec<EpisodeSummary> {
        std::mem::take(&mut self.summaries)
    }

    pub fn take_scene_events(&mut self) -> Vec<SceneEvent> {
        self.obstacles.take_scene_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episode::EpisodeState;
    use crate::reward::TerminalReason;

    fn arena(seed: u64) -> Arena {
        Arena::new(ArenaConfig::default(), seed).unwrap()
    }

    #[test]
    fn test_new_begins_every_agent() {
        let arena = arena(1);
        assert_eq!(arena.agent_count(), 2);
        assert!(arena.agents().iter().all(|a| a.state() == EpisodeState::Running));
        assert_eq!(arena.curriculum().episode_count, 2);
        assert_eq!(arena.obstacles().obstacles().len(), 3);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = ArenaConfig::default();
        config.arena.fixed_dt = 0.0;
        assert!(matches!(
            Arena::new(config, 0),
            Err(ConfigError::NonPositive { field: "arena.fixed_dt", .. })
        ));
    }

    #[test]
    fn test_contact_pair_is_order_independent() {
        let a = BodyRef::Agent(AgentId(1));
        let b = BodyRef::Obstacle(ObstacleId(4));
        assert_eq!(contact(a, b), contact(b, a));
    }

    #[test]
    fn test_agent_collision_ends_both_episodes() {
        let mut arena = arena(2);
        arena.place_target(Vec3::new(0.0, 0.0, 8.0));
        arena.place_agent(AgentId(0), Vec3::new(-0.4, 0.0, -5.0));
        arena.place_agent(AgentId(1), Vec3::new(0.4, 0.0, -5.0));

        let results = arena.step(&[Action::NONE, Action::NONE]);
        for result in &results {
            assert!(result.done);
            assert_eq!(result.terminal, Some(TerminalReason::AgentCollision));
            assert_eq!(result.breakdown.terminal, -0.25);
        }
        assert_eq!(arena.take_summaries().len(), 2);
    }

    #[test]
    fn test_terminated_agent_restarts_on_begin() {
        let mut arena = arena(3);
        arena.place_agent(AgentId(0), Vec3::new(9.7, 0.0, 0.0));
        let results = arena.step(&[]);
        assert_eq!(results[0].terminal, Some(TerminalReason::HitWall));
        assert_eq!(arena.agent(AgentId(0)).unwrap().state(), EpisodeState::Terminating);

        // Still pinned against the wall, nothing new is reported
        let results = arena.step(&[]);
        assert_eq!(results[0].reward, 0.0);

        assert!(arena.begin_episode(AgentId(0)));
        let agent = arena.agent(AgentId(0)).unwrap();
        assert_eq!(agent.state(), EpisodeState::Running);
        assert_eq!(agent.position(), Vec3::new(-1.5, 0.0, 0.0));
    }

    #[test]
    fn test_reset_target_is_idempotent() {
        let mut arena = arena(4);
        for _ in 0..50 {
            arena.step(&[]);
        }
        arena.reset_target();
        let first = arena.target().position();
        arena.reset_target();
        assert_eq!(first, arena.target().position());
        assert_eq!(first, Vec3::new(0.0, 0.0, 6.0));
    }

    fn obstacle_touches_wall(arena: &Arena) -> bool {
        arena
            .contacts
            .iter()
            .any(|c| matches!(c, (BodyRef::Wall, BodyRef::Obstacle(_))))
    }

    #[test]
    fn test_obstacle_wall_contact_needs_boundary_past_wall() {
        let mut config = ArenaConfig::default();
        config.obstacle.move_range = 30.0;
        config.obstacle.avoid_other_obstacles = false;

        let mut default_bounds = Arena::new(config.clone(), 6).unwrap();
        for _ in 0..3000 {
            default_bounds.step(&[]);
            assert!(!obstacle_touches_wall(&default_bounds));
        }

        config.obstacle.arena_boundary = 10.0;
        let mut arena = Arena::new(config, 6).unwrap();
        let mut touched = false;
        for _ in 0..3000 {
            arena.step(&[]);
            touched |= obstacle_touches_wall(&arena);
            for obstacle in arena.obstacles().obstacles() {
                let p = obstacle.position();
                assert!(p.x.abs() <= 10.0 && p.z.abs() <= 10.0);
            }
        }
        assert!(touched);
    }

    #[test]
    fn test_manual_randomize_respawns_obstacles() {
        let mut arena = arena(5);
        arena.take_scene_events();
        arena.manual_randomize();
        let events = arena.take_scene_events();
        assert!(events.iter().any(|e| matches!(e, SceneEvent::Destroyed { .. })));
        assert!(events.iter().any(|e| matches!(e, SceneEvent::Spawned { .. })));
    }
}
