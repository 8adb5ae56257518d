//! Collaborator traits for arena-world interaction
//!
//! These traits define the interface between the simulation core and its host,
//! so the episode logic has no dependency on a particular physics engine,
//! scene graph or random source.

use glam::Vec3;

use crate::obstacle::ObstacleSnapshot;
use crate::types::{BodyRef, CategoryMask};

/// Result of a ray-cast query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance from the ray origin to the hit surface
    pub distance: f32,
    /// Body that was struck
    pub body: BodyRef,
}

/// Read-only spatial queries against the world
pub trait WorldQuery {
    /// Cast a ray and return the first body admitted by `mask`
    ///
    /// `ignore` excludes one body (typically the caster itself). Bodies that
    /// contain the ray origin are not reported.
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: CategoryMask,
        ignore: Option<BodyRef>,
    ) -> Option<RayHit>;

    /// Nearest obstacle to `from`, if any obstacle exists
    ///
    /// Implementations scan the full population; populations are small (at
    /// most a handful of bodies), a spatial index is only worth it if that
    /// changes.
    fn nearest_obstacle(&self, from: Vec3) -> Option<ObstacleSnapshot>;
}

/// Random number source used by the simulation
///
/// Blanket-implemented for every `rand::Rng`, so seeded generators such as
/// `Xoshiro256StarStar` give reproducible episodes.
pub trait SimRng {
    /// Uniform boolean
    fn coin(&mut self) -> bool;

    /// Uniform f32 in [0.0, 1.0)
    fn unit(&mut self) -> f32;

    /// Uniform f32 in [min, max]; returns `min` when the range is empty
    fn uniform(&mut self, min: f32, max: f32) -> f32 {
        if max <= min {
            return min;
        }
        min + (max - min) * self.unit()
    }

    /// Uniform integer in [min, max] (inclusive); returns `min` when empty
    fn pick(&mut self, min: usize, max: usize) -> usize;

    /// +1.0 or -1.0 with equal probability
    fn sign(&mut self) -> f32 {
        if self.coin() {
            1.0
        } else {
            -1.0
        }
    }
}

impl<T: ?Sized + rand::Rng> SimRng for T {
    fn coin(&mut self) -> bool {
        rand::Rng::r#gen(self)
    }

    fn unit(&mut self) -> f32 {
        rand::Rng::r#gen(self)
    }

    fn pick(&mut self, min: usize, max: usize) -> usize {
        if max <= min {
            return min;
        }
        rand::Rng::gen_range(self, min..=max)
    }
}

/// Receives a notification every time an agent begins an episode
pub trait EpisodeListener {
    fn on_agent_episode_begin<R: SimRng + ?Sized>(&mut self, rng: &mut R);
}
