//! Moving obstacles
//!
//! Obstacles patrol along a single axis, turn around when another obstacle is
//! right in front of them, bounce off the arena boundary, and report contacts
//! with agents as explicit penalty events.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::kinematics::KinematicMotionUnit;
use crate::traits::{RayHit, SimRng, WorldQuery};
use crate::types::{AgentId, Axis, BodyRef, CategoryMask, ObstacleId};

/// Obstacle behaviour settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    /// Distance travelled before turning around
    pub move_range: f32,
    /// Reward credited to an agent that touches the obstacle
    pub collision_penalty: f32,
    /// Turn around when another obstacle is directly ahead
    pub avoid_other_obstacles: bool,
    /// Reflect at and clamp to `arena_boundary`
    pub stay_in_bounds: bool,
    /// Half extent of the region obstacles may occupy
    pub arena_boundary: f32,
    /// Look-ahead distance of the forward probe
    pub probe_distance: f32,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            move_range: 6.0,
            collision_penalty: -0.5,
            avoid_other_obstacles: true,
            stay_in_bounds: true,
            arena_boundary: 9.0,
            probe_distance: 1.5,
        }
    }
}

/// Read-only view of an obstacle taken at tick start
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSnapshot {
    pub id: ObstacleId,
    pub position: Vec3,
    pub axis: Axis,
    pub direction: f32,
    pub speed: f32,
}

impl ObstacleSnapshot {
    pub fn velocity(&self) -> Vec3 {
        self.axis.unit() * self.direction * self.speed
    }

    /// Speed along the travel axis, signed by direction
    pub fn signed_speed(&self) -> f32 {
        self.direction * self.speed
    }
}

/// Penalty an obstacle hands to an agent it ran into
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleCollision {
    pub agent: AgentId,
    pub obstacle: ObstacleId,
    pub penalty: f32,
}

/// What an obstacle did during one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Moved forward normally
    Advanced,
    /// Moved forward and exhausted its range, so it turned around
    TurnedAtRange,
    /// Another obstacle was ahead; turned around instead of moving
    AvoidedObstacle,
    /// The next position was outside the boundary; turned around instead of moving
    ReflectedAtBoundary,
}

/// Motion controller for one obstacle
#[derive(Debug, Clone)]
pub struct ObstacleMotionController {
    id: ObstacleId,
    motion: KinematicMotionUnit,
    /// Set after an avoidance reversal, cleared once the path ahead is clear
    reversing: bool,
    config: ObstacleConfig,
}

impl ObstacleMotionController {
    /// Create an obstacle at `start` with a random initial direction
    pub fn new<R: SimRng + ?Sized>(
        id: ObstacleId,
        start: Vec3,
        axis: Axis,
        speed: f32,
        config: ObstacleConfig,
        rng: &mut R,
    ) -> Self {
        let motion = KinematicMotionUnit::new(start, axis, speed, config.move_range, rng.sign());
        let mut obstacle = Self {
            id,
            motion,
            reversing: false,
            config,
        };
        obstacle.enforce_bounds();
        obstacle
    }

    pub fn id(&self) -> ObstacleId {
        self.id
    }

    pub fn position(&self) -> Vec3 {
        self.motion.position()
    }

    pub fn axis(&self) -> Axis {
        self.motion.axis()
    }

    pub fn direction(&self) -> f32 {
        self.motion.direction()
    }

    pub fn speed(&self) -> f32 {
        self.motion.speed()
    }

    pub fn is_reversing(&self) -> bool {
        self.reversing
    }

    pub fn motion(&self) -> &KinematicMotionUnit {
        &self.motion
    }

    pub fn snapshot(&self) -> ObstacleSnapshot {
        ObstacleSnapshot {
            id: self.id,
            position: self.motion.position(),
            axis: self.motion.axis(),
            direction: self.motion.direction(),
            speed: self.motion.speed(),
        }
    }

    /// Advance one tick against a world snapshot
    ///
    /// Avoidance is checked before boundary reflection; whichever fires first
    /// consumes the tick. The position is clamped into bounds afterwards
    /// regardless of what happened.
    pub fn tick(&mut self, dt: f32, world: &impl WorldQuery) -> MoveOutcome {
        let outcome = self.step(dt, world);
        self.enforce_bounds();

        log::trace!(
            "{} {:?} at ({:.2}, {:.2}) dir {:+.0}",
            self.id,
            outcome,
            self.motion.position().x,
            self.motion.position().z,
            self.motion.direction()
        );

        outcome
    }

    fn step(&mut self, dt: f32, world: &impl WorldQuery) -> MoveOutcome {
        if self.config.avoid_other_obstacles && self.obstacle_ahead(world) {
            if !self.reversing {
                self.motion.reverse();
                self.reversing = true;
                return MoveOutcome::AvoidedObstacle;
            }
        } else {
            self.reversing = false;
        }

        if self.config.stay_in_bounds {
            let next = self.motion.next_position(dt);
            if self.motion.axis().component(next).abs() >= self.config.arena_boundary {
                self.motion.reverse();
                return MoveOutcome::ReflectedAtBoundary;
            }
        }

        if self.motion.advance(dt) {
            MoveOutcome::TurnedAtRange
        } else {
            MoveOutcome::Advanced
        }
    }

    /// Probe along the heading; only another obstacle counts, walls and agents do not
    fn obstacle_ahead(&self, world: &impl WorldQuery) -> bool {
        let me = BodyRef::Obstacle(self.id);
        matches!(
            world.raycast(
                self.motion.position(),
                self.motion.heading(),
                self.config.probe_distance,
                CategoryMask::SOLID,
                Some(me),
            ),
            Some(RayHit { body: BodyRef::Obstacle(other), .. }) if other != self.id
        )
    }

    fn enforce_bounds(&mut self) {
        if self.config.stay_in_bounds {
            self.motion.clamp_to(self.config.arena_boundary);
        }
    }

    /// React to a collision that started this tick
    ///
    /// Walls and other obstacles turn the obstacle around. An agent receives the
    /// configured penalty, returned as an event for the agent's controller.
    pub fn on_collision(&mut self, other: BodyRef) -> Option<ObstacleCollision> {
        match other {
            BodyRef::Agent(agent) => Some(ObstacleCollision {
                agent,
                obstacle: self.id,
                penalty: self.config.collision_penalty,
            }),
            BodyRef::Wall | BodyRef::Obstacle(_) => {
                self.motion.reverse();
                None
            }
            BodyRef::Target => None,
        }
    }

    /// Back to the spawn position with a new random direction
    pub fn reset<R: SimRng + ?Sized>(&mut self, rng: &mut R) {
        self.motion.reset(rng.sign());
        self.reversing = false;
        self.enforce_bounds();
    }
}
