//! The moving target agents chase
//!
//! Patrols along one axis and periodically picks a new random speed so agents
//! cannot learn a fixed intercept timing.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::kinematics::KinematicMotionUnit;
use crate::traits::SimRng;
use crate::types::Axis;

/// Target motion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub min_speed: f32,
    pub max_speed: f32,
    /// Distance travelled before turning around
    pub move_range: f32,
    pub axis: Axis,
    /// Seconds between speed resamples
    pub speed_change_interval: f32,
    /// Half extent the target is kept inside
    pub arena_boundary: f32,
    /// Spawn position on the XZ plane
    pub spawn: [f32; 2],
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            min_speed: 1.0,
            max_speed: 5.0,
            move_range: 8.0,
            axis: Axis::X,
            speed_change_interval: 3.0,
            arena_boundary: 9.0,
            spawn: [0.0, 6.0],
        }
    }
}

/// Motion controller for the target
#[derive(Debug, Clone)]
pub struct TargetMotionController {
    motion: KinematicMotionUnit,
    /// Patrol center; the target turns once it is `move_range` away from here
    anchor: Vec3,
    /// Seconds since the speed was last resampled
    speed_timer: f32,
    config: TargetConfig,
}

impl TargetMotionController {
    pub fn new<R: SimRng + ?Sized>(config: TargetConfig, rng: &mut R) -> Self {
        let home = Vec3::new(config.spawn[0], 0.0, config.spawn[1]);
        let speed = rng.uniform(config.min_speed, config.max_speed);
        let motion = KinematicMotionUnit::new(home, config.axis, speed, config.move_range, 1.0);
        Self {
            motion,
            anchor: home,
            speed_timer: 0.0,
            config,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.motion.position()
    }

    pub fn velocity(&self) -> Vec3 {
        self.motion.velocity()
    }

    pub fn speed(&self) -> f32 {
        self.motion.speed()
    }

    pub fn direction(&self) -> f32 {
        self.motion.direction()
    }

    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    pub fn speed_timer(&self) -> f32 {
        self.speed_timer
    }

    pub fn motion(&self) -> &KinematicMotionUnit {
        &self.motion
    }

    /// Advance one tick; returns the new speed if it was resampled
    pub fn tick<R: SimRng + ?Sized>(&mut self, dt: f32, rng: &mut R) -> Option<f32> {
        let resampled = self.update_speed(dt, rng);

        self.motion.translate(dt);
        let axis = self.motion.axis();
        let offset = axis.component(self.motion.position() - self.anchor);
        if offset * self.motion.direction() >= self.config.move_range {
            self.motion.reverse();
        }

        if self.motion.clamp_to(self.config.arena_boundary) {
            // Pressed against the boundary: head back inside
            let outward = axis.component(self.motion.position()) * self.motion.direction();
            if outward > 0.0 {
                self.motion.reverse();
            }
        }

        resampled
    }

    fn update_speed<R: SimRng + ?Sized>(&mut self, dt: f32, rng: &mut R) -> Option<f32> {
        self.speed_timer += dt;
        if self.speed_timer < self.config.speed_change_interval {
            return None;
        }

        let speed = rng.uniform(self.config.min_speed, self.config.max_speed);
        self.motion.set_speed(speed);
        self.speed_timer = 0.0;
        log::debug!("Target speed changed to: {:.2}", speed);
        Some(speed)
    }

    /// Move the target for a new episode; it patrols around the new position
    pub fn relocate(&mut self, position: Vec3) {
        self.motion.relocate(position);
        self.motion.clamp_to(self.config.arena_boundary);
        self.anchor = self.motion.position();
    }

    /// Back to the spawn position with a fresh direction and speed
    pub fn reset<R: SimRng + ?Sized>(&mut self, rng: &mut R) {
        self.motion.reset(rng.sign());
        self.motion
            .set_speed(rng.uniform(self.config.min_speed, self.config.max_speed));
        self.anchor = self.motion.home();
        self.speed_timer = 0.0;
    }
}
