//! Common types shared by every arena component
//!
//! Bodies live on the XZ plane; the Y coordinate is carried along untouched so
//! direction and velocity observations keep their three-component layout.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Identifier of a learning agent within one arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub u8);

impl AgentId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Agent({})", self.0)
    }
}

/// Identifier of a spawned obstacle
///
/// Allocated by the curriculum manager that owns the obstacle, so replaying an
/// arena with the same seed yields the same ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObstacleId(pub u32);

impl ObstacleId {
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ObstacleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Obstacle({})", self.0)
    }
}

/// Travel axis of a patrolling body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Axis {
    #[default]
    X,
    Z,
}

impl Axis {
    /// Unit vector along this axis
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Z => Vec3::Z,
        }
    }

    /// Coordinate of `v` along this axis
    pub fn component(self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Z => v.z,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Z => "z",
        }
    }
}

/// Category tag carried by trigger and collision events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BodyCategory {
    Target,
    Wall,
    Agent,
    Obstacle,
}

bitflags::bitflags! {
    /// Layer filter for ray-cast queries
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CategoryMask: u8 {
        const TARGET = 1 << 0;
        const WALL = 1 << 1;
        const AGENT = 1 << 2;
        const OBSTACLE = 1 << 3;
        /// Everything with a solid collider (the target is a trigger volume)
        const SOLID = Self::WALL.bits() | Self::AGENT.bits() | Self::OBSTACLE.bits();
    }
}

impl CategoryMask {
    pub fn admits(self, category: BodyCategory) -> bool {
        self.contains(CategoryMask::from(category))
    }
}

impl From<BodyCategory> for CategoryMask {
    fn from(category: BodyCategory) -> Self {
        match category {
            BodyCategory::Target => CategoryMask::TARGET,
            BodyCategory::Wall => CategoryMask::WALL,
            BodyCategory::Agent => CategoryMask::AGENT,
            BodyCategory::Obstacle => CategoryMask::OBSTACLE,
        }
    }
}

/// A concrete body that a query or contact refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BodyRef {
    Target,
    Wall,
    Agent(AgentId),
    Obstacle(ObstacleId),
}

impl BodyRef {
    pub fn category(&self) -> BodyCategory {
        match self {
            BodyRef::Target => BodyCategory::Target,
            BodyRef::Wall => BodyCategory::Wall,
            BodyRef::Agent(_) => BodyCategory::Agent,
            BodyRef::Obstacle(_) => BodyCategory::Obstacle,
        }
    }
}

/// Continuous two-signal control supplied by the training harness
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Action {
    pub x: f32,
    pub z: f32,
}

impl Action {
    pub const NONE: Action = Action { x: 0.0, z: 0.0 };

    pub fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }

    /// Build from a raw action buffer; missing entries read as zero
    pub fn from_slice(values: &[f32]) -> Self {
        Self {
            x: values.first().copied().unwrap_or(0.0),
            z: values.get(1).copied().unwrap_or(0.0),
        }
    }

    /// Planar force direction (unscaled)
    pub fn as_vec3(&self) -> Vec3 {
        Vec3::new(self.x, 0.0, self.z)
    }
}

/// Distance between two bodies on the XZ plane
pub fn planar_distance(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_component() {
        let v = Vec3::new(1.5, 0.5, -2.0);
        assert_eq!(Axis::X.component(v), 1.5);
        assert_eq!(Axis::Z.component(v), -2.0);
        assert_eq!(Axis::Z.unit(), Vec3::Z);
    }

    #[test]
    fn test_category_mask_solid_excludes_target() {
        assert!(CategoryMask::SOLID.admits(BodyCategory::Obstacle));
        assert!(CategoryMask::SOLID.admits(BodyCategory::Wall));
        assert!(!CategoryMask::SOLID.admits(BodyCategory::Target));
    }

    #[test]
    fn test_action_from_short_slice() {
        assert_eq!(Action::from_slice(&[0.5]), Action::new(0.5, 0.0));
        assert_eq!(Action::from_slice(&[]), Action::NONE);
    }

    #[test]
    fn test_planar_distance_ignores_height() {
        let a = Vec3::new(0.0, 0.5, 0.0);
        let b = Vec3::new(3.0, 0.0, 4.0);
        assert!((planar_distance(a, b) - 5.0).abs() < 1e-6);
    }
}
