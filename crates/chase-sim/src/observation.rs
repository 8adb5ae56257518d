//! Observation encoding
//!
//! The vector is rebuilt from scratch every tick. Its order is part of the
//! contract with the policy network's input layer:
//!
//! | offset       | len | content                                          |
//! |--------------|-----|--------------------------------------------------|
//! | 0            | 3   | unit direction to target                         |
//! | 3            | 1   | distance to target / 20                          |
//! | 4            | 3   | own velocity / 10                                |
//! | 7            | 4   | distance to north, south, east, west wall / half |
//! | 11           | 2   | own x, z / half                                  |
//! | 13           | 8   | other agent block, zeros when absent             |
//! | 21           | N   | ray probes, `1 - hit / range` or 0               |
//! | 21 + N       | 4   | nearest obstacle block, `(0, 0, 1, 0)` if none   |

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::traits::WorldQuery;
use crate::types::{planar_distance, CategoryMask};

/// Distances are divided by this before entering the vector
pub const DISTANCE_SCALE: f32 = 20.0;
/// Agent velocities are divided by this
pub const VELOCITY_SCALE: f32 = 10.0;
/// Obstacle speed estimates are divided by this
pub const OBSTACLE_SPEED_SCALE: f32 = 5.0;

/// Collision risk is only evaluated inside this radius
pub const RISK_RADIUS: f32 = 5.0;
/// Risk is nonzero only closer than this
pub const RISK_DISTANCE: f32 = 3.0;
/// Relative-velocity alignment below this counts as closing
pub const CLOSING_DOT: f32 = -0.5;

const TARGET_BLOCK: usize = 3 + 1 + 3 + 4 + 2;
const OTHER_AGENT_BLOCK: usize = 8;
const NEAREST_OBSTACLE_BLOCK: usize = 4;

/// Observation length for a given ray count
pub fn observation_len(ray_count: usize) -> usize {
    TARGET_BLOCK + OTHER_AGENT_BLOCK + ray_count + NEAREST_OBSTACLE_BLOCK
}

/// Position and velocity of a body as seen at tick start
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyView {
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Everything besides world queries that an agent observes
#[derive(Debug, Clone, Copy)]
pub struct ObservationContext {
    pub own: BodyView,
    pub target: Vec3,
    pub other: Option<BodyView>,
    /// Half extent of the arena floor
    pub half_size: f32,
    pub ray_count: usize,
    pub ray_distance: f32,
}

/// Fixed-length observation vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    values: Vec<f32>,
    ray_count: usize,
}

impl Observation {
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn ray_count(&self) -> usize {
        self.ray_count
    }

    pub fn target_direction(&self) -> Vec3 {
        Vec3::new(self.values[0], self.values[1], self.values[2])
    }

    /// Distance to target in world units
    pub fn target_distance(&self) -> f32 {
        self.values[3] * DISTANCE_SCALE
    }

    /// North, south, east, west wall distances (normalized)
    pub fn wall_distances(&self) -> [f32; 4] {
        [self.values[7], self.values[8], self.values[9], self.values[10]]
    }

    /// Other agent block: direction (3), distance (1), velocity (3), risk (1)
    pub fn other_agent(&self) -> &[f32] {
        &self.values[TARGET_BLOCK..TARGET_BLOCK + OTHER_AGENT_BLOCK]
    }

    pub fn collision_risk(&self) -> f32 {
        self.values[TARGET_BLOCK + OTHER_AGENT_BLOCK - 1]
    }

    pub fn rays(&self) -> &[f32] {
        let start = TARGET_BLOCK + OTHER_AGENT_BLOCK;
        &self.values[start..start + self.ray_count]
    }

    /// Nearest obstacle block: direction x, z, distance, signed speed
    pub fn nearest_obstacle(&self) -> [f32; 4] {
        let start = TARGET_BLOCK + OTHER_AGENT_BLOCK + self.ray_count;
        [
            self.values[start],
            self.values[start + 1],
            self.values[start + 2],
            self.values[start + 3],
        ]
    }
}

/// Direction of probe `index` out of `count`, evenly spread over 360°
///
/// Angle zero points along +Z and angles turn toward +X.
pub fn probe_direction(index: usize, count: usize) -> Vec3 {
    let angle = (index as f32 / count.max(1) as f32) * std::f32::consts::TAU;
    Vec3::new(angle.sin(), 0.0, angle.cos())
}

/// Closing-trajectory risk in [0, 1]
///
/// Relative velocity is the other body's velocity seen from `own`; a strongly
/// negative alignment with the direction to the other body means the gap is
/// shrinking.
pub fn collision_risk(own: &BodyView, other: &BodyView) -> f32 {
    let to_other = other.position - own.position;
    let distance = planar_distance(own.position, other.position);
    if distance >= RISK_RADIUS {
        return 0.0;
    }

    let relative_velocity = other.velocity - own.velocity;
    let alignment = relative_velocity
        .normalize_or_zero()
        .dot(to_other.normalize_or_zero());

    if alignment < CLOSING_DOT && distance < RISK_DISTANCE {
        (1.0 - distance / RISK_DISTANCE).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Build the observation vector for one agent
pub fn encode(ctx: &ObservationContext, world: &impl WorldQuery) -> Observation {
    let mut values = Vec::with_capacity(observation_len(ctx.ray_count));
    let pos = ctx.own.position;
    let half = ctx.half_size;

    // Target
    let to_target = ctx.target - pos;
    push_vec3(&mut values, to_target.normalize_or_zero());
    values.push(planar_distance(pos, ctx.target) / DISTANCE_SCALE);

    // Own motion
    push_vec3(&mut values, ctx.own.velocity / VELOCITY_SCALE);

    // Walls: north, south, east, west
    values.push((half - pos.z) / half);
    values.push((half + pos.z) / half);
    values.push((half - pos.x) / half);
    values.push((half + pos.x) / half);

    // Own position
    values.push(pos.x / half);
    values.push(pos.z / half);

    // Other agent
    match &ctx.other {
        Some(other) => {
            push_vec3(&mut values, (other.position - pos).normalize_or_zero());
            values.push(planar_distance(pos, other.position) / DISTANCE_SCALE);
            push_vec3(&mut values, other.velocity / VELOCITY_SCALE);
            values.push(collision_risk(&ctx.own, other));
        }
        None => values.extend_from_slice(&[0.0; OTHER_AGENT_BLOCK]),
    }

    // Obstacle probes
    for i in 0..ctx.ray_count {
        let direction = probe_direction(i, ctx.ray_count);
        let value = world
            .raycast(pos, direction, ctx.ray_distance, CategoryMask::OBSTACLE, None)
            .map(|hit| 1.0 - hit.distance / ctx.ray_distance)
            .unwrap_or(0.0);
        values.push(value.clamp(0.0, 1.0));
    }

    // Nearest obstacle
    match world.nearest_obstacle(pos) {
        Some(obstacle) => {
            let to_obstacle = obstacle.position - pos;
            let dir = to_obstacle.normalize_or_zero();
            values.push(dir.x);
            values.push(dir.z);
            values.push(planar_distance(pos, obstacle.position) / DISTANCE_SCALE);
            values.push(obstacle.signed_speed() / OBSTACLE_SPEED_SCALE);
        }
        None => values.extend_from_slice(&[0.0, 0.0, 1.0, 0.0]),
    }

    Observation {
        values,
        ray_count: ctx.ray_count,
    }
}

fn push_vec3(values: &mut Vec<f32>, v: Vec3) {
    values.extend_from_slice(&[v.x, v.y, v.z]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::obstacle::ObstacleSnapshot;
    use crate::traits::RayHit;
    use crate::types::{Axis, BodyRef, ObstacleId};

    /// World with no obstacles at all
    struct EmptyWorld;

    impl WorldQuery for EmptyWorld {
        fn raycast(
            &self,
            _origin: Vec3,
            _direction: Vec3,
            _max_distance: f32,
            _mask: CategoryMask,
            _ignore: Option<BodyRef>,
        ) -> Option<RayHit> {
            None
        }

        fn nearest_obstacle(&self, _from: Vec3) -> Option<ObstacleSnapshot> {
            None
        }
    }

    /// One obstacle straight ahead on +Z
    struct ObstacleAheadWorld;

    impl WorldQuery for ObstacleAheadWorld {
        fn raycast(
            &self,
            _origin: Vec3,
            direction: Vec3,
            max_distance: f32,
            _mask: CategoryMask,
            _ignore: Option<BodyRef>,
        ) -> Option<RayHit> {
            (direction.z > 0.99 && max_distance >= 2.0).then_some(RayHit {
                distance: 2.0,
                body: BodyRef::Obstacle(ObstacleId(0)),
            })
        }

        fn nearest_obstacle(&self, _from: Vec3) -> Option<ObstacleSnapshot> {
            Some(ObstacleSnapshot {
                id: ObstacleId(0),
                position: Vec3::new(0.0, 0.0, 2.5),
                axis: Axis::X,
                direction: -1.0,
                speed: 2.0,
            })
        }
    }

    fn context(other: Option<BodyView>) -> ObservationContext {
        ObservationContext {
            own: BodyView {
                position: Vec3::new(2.0, 0.0, -5.0),
                velocity: Vec3::new(1.0, 0.0, 0.0),
            },
            target: Vec3::new(2.0, 0.0, 5.0),
            other,
            half_size: 10.0,
            ray_count: 8,
            ray_distance: 5.0,
        }
    }

    #[test]
    fn test_length_matches_layout() {
        let obs = encode(&context(None), &EmptyWorld);
        assert_eq!(obs.len(), 3 + 1 + 3 + 4 + 2 + 8 + 8 + 4);
        assert_eq!(obs.len(), observation_len(8));
    }

    #[test]
    fn test_target_and_wall_values() {
        let obs = encode(&context(None), &EmptyWorld);
        assert_eq!(obs.target_direction(), Vec3::Z);
        assert!((obs.target_distance() - 10.0).abs() < 1e-5);
        let walls = obs.wall_distances();
        assert!((walls[0] - 1.5).abs() < 1e-6);
        assert!((walls[1] - 0.5).abs() < 1e-6);
        assert!((walls[2] - 0.8).abs() < 1e-6);
        assert!((walls[3] - 1.2).abs() < 1e-6);
        assert!((obs.as_slice()[4] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_absent_agent_and_obstacles_use_sentinels() {
        let obs = encode(&context(None), &EmptyWorld);
        assert!(obs.other_agent().iter().all(|v| *v == 0.0));
        assert!(obs.rays().iter().all(|v| *v == 0.0));
        assert_eq!(obs.nearest_obstacle(), [0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_ray_and_nearest_obstacle_values() {
        let mut ctx = context(None);
        ctx.own.position = Vec3::ZERO;
        let obs = encode(&ctx, &ObstacleAheadWorld);
        // Probe 0 points along +Z
        assert!((obs.rays()[0] - 0.6).abs() < 1e-6);
        assert!(obs.rays()[1..].iter().all(|v| *v == 0.0));
        let block = obs.nearest_obstacle();
        assert!((block[1] - 1.0).abs() < 1e-6);
        assert!((block[2] - 2.5 / 20.0).abs() < 1e-6);
        assert!((block[3] + 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_probe_directions_cover_circle() {
        let dirs: Vec<Vec3> = (0..4).map(|i| probe_direction(i, 4)).collect();
        assert!((dirs[0] - Vec3::Z).length() < 1e-6);
        assert!((dirs[1] - Vec3::X).length() < 1e-6);
        assert!((dirs[2] + Vec3::Z).length() < 1e-6);
        assert!((dirs[3] + Vec3::X).length() < 1e-6);
    }

    #[test]
    fn test_collision_risk_closing() {
        let own = BodyView {
            position: Vec3::ZERO,
            velocity: Vec3::new(2.0, 0.0, 0.0),
        };
        let other = BodyView {
            position: Vec3::new(1.5, 0.0, 0.0),
            velocity: Vec3::new(-2.0, 0.0, 0.0),
        };
        let risk = collision_risk(&own, &other);
        assert!((risk - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_collision_risk_separating_or_far() {
        let own = BodyView {
            position: Vec3::ZERO,
            velocity: Vec3::new(-2.0, 0.0, 0.0),
        };
        let other = BodyView {
            position: Vec3::new(1.5, 0.0, 0.0),
            velocity: Vec3::new(2.0, 0.0, 0.0),
        };
        assert_eq!(collision_risk(&own, &other), 0.0);

        let far = BodyView {
            position: Vec3::new(5.0, 0.0, 0.0),
            velocity: Vec3::new(-5.0, 0.0, 0.0),
        };
        assert_eq!(collision_risk(&own, &far), 0.0);

        // Stationary proximity carries no risk
        let still = BodyView {
            position: Vec3::new(0.5, 0.0, 0.0),
            velocity: Vec3::ZERO,
        };
        assert_eq!(collision_risk(&BodyView::default(), &still), 0.0);
    }

    #[test]
    fn test_other_agent_block() {
        let other = BodyView {
            position: Vec3::new(2.0, 0.0, -3.0),
            velocity: Vec3::new(0.0, 0.0, 5.0),
        };
        let obs = encode(&context(Some(other)), &EmptyWorld);
        let block = obs.other_agent();
        assert!((block[2] - 1.0).abs() < 1e-6);
        assert!((block[3] - 0.1).abs() < 1e-6);
        assert!((block[6] - 0.5).abs() < 1e-6);
        assert!((0.0..=1.0).contains(&block[7]));
    }
}
