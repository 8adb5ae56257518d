//! Single-axis patrol motion shared by obstacles and the target
//!
//! Bodies use kinematic position-based movement: no forces, no integration
//! error, and identical results for identical inputs.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::types::Axis;

/// Back-and-forth motion along one axis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KinematicMotionUnit {
    position: Vec3,
    /// Spawn position restored by `reset`
    home: Vec3,
    axis: Axis,
    /// +1.0 or -1.0
    direction: f32,
    speed: f32,
    /// Distance to travel before turning around
    range: f32,
    /// Distance covered since the last reversal
    traveled: f32,
}

impl KinematicMotionUnit {
    pub fn new(home: Vec3, axis: Axis, speed: f32, range: f32, direction: f32) -> Self {
        Self {
            position: home,
            home,
            axis,
            direction: direction.signum(),
            speed: speed.max(0.0),
            range,
            traveled: 0.0,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn home(&self) -> Vec3 {
        self.home
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    pub fn direction(&self) -> f32 {
        self.direction
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    pub fn range(&self) -> f32 {
        self.range
    }

    pub fn traveled(&self) -> f32 {
        self.traveled
    }

    /// Unit vector the body is currently heading along
    pub fn heading(&self) -> Vec3 {
        self.axis.unit() * self.direction
    }

    pub fn velocity(&self) -> Vec3 {
        self.heading() * self.speed
    }

    /// Velocity along the travel axis, signed by direction
    pub fn signed_speed(&self) -> f32 {
        self.direction * self.speed
    }

    /// Where the body would be after advancing `dt` seconds
    pub fn next_position(&self, dt: f32) -> Vec3 {
        self.position + self.velocity() * dt
    }

    /// Flip the direction sign and restart the range count
    pub fn reverse(&mut self) {
        self.direction = -self.direction;
        self.traveled = 0.0;
    }

    /// Move one step without any range check
    pub fn translate(&mut self, dt: f32) {
        self.position = self.next_position(dt);
        self.traveled += self.speed * dt;
    }

    /// Move one step; returns true if the range was exhausted and the body turned
    pub fn advance(&mut self, dt: f32) -> bool {
        self.translate(dt);

        if self.traveled >= self.range {
            self.reverse();
            true
        } else {
            false
        }
    }

    /// Clamp the planar coordinates into [-bound, bound]; returns true if clamped
    pub fn clamp_to(&mut self, bound: f32) -> bool {
        let clamped = Vec3::new(
            self.position.x.clamp(-bound, bound),
            self.position.y,
            self.position.z.clamp(-bound, bound),
        );
        let changed = clamped != self.position;
        self.position = clamped;
        changed
    }

    /// Restore the spawn position with a fresh direction
    pub fn reset(&mut self, direction: f32) {
        self.position = self.home;
        self.direction = direction.signum();
        self.traveled = 0.0;
    }

    /// Teleport to `position` and restart the range count from there
    pub fn relocate(&mut self, position: Vec3) {
        self.position = position;
        self.traveled = 0.0;
    }
}
