//! Geometric world snapshot used as the default `WorldQuery`
//!
//! Every body is a circle on the XZ plane and the arena is bounded by four
//! straight walls at `±half_size`. The snapshot is taken once at the start of
//! a tick so every controller reads the same positions.

use glam::{Vec2, Vec3};

use crate::observation::BodyView;
use crate::obstacle::ObstacleSnapshot;
use crate::traits::{RayHit, WorldQuery};
use crate::types::{planar_distance, AgentId, BodyCategory, BodyRef, CategoryMask};

/// Collider radii per body kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyRadii {
    pub agent: f32,
    pub obstacle: f32,
    pub target: f32,
}

/// Frozen positions of every body in one arena
#[derive(Debug, Clone)]
pub struct WorldSnapshot {
    pub half_size: f32,
    pub radii: BodyRadii,
    pub target: Vec3,
    pub agents: Vec<(AgentId, BodyView)>,
    pub obstacles: Vec<ObstacleSnapshot>,
}

fn planar(v: Vec3) -> Vec2 {
    Vec2::new(v.x, v.z)
}

/// Entry distance of a ray into a circle, `None` on a miss or if the origin is inside
fn ray_circle(origin: Vec2, direction: Vec2, center: Vec2, radius: f32) -> Option<f32> {
    let m = origin - center;
    let c = m.length_squared() - radius * radius;
    if c <= 0.0 {
        return None;
    }
    let b = m.dot(direction);
    if b > 0.0 {
        return None;
    }
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    Some(-b - disc.sqrt())
}

/// Distance along the ray to the first wall plane
fn ray_walls(origin: Vec2, direction: Vec2, half_size: f32) -> Option<f32> {
    let mut best: Option<f32> = None;
    for (o, d) in [(origin.x, direction.x), (origin.y, direction.y)] {
        if d.abs() < f32::EPSILON {
            continue;
        }
        let wall = half_size * d.signum();
        let t = (wall - o) / d;
        if t >= 0.0 && best.map_or(true, |b| t < b) {
            best = Some(t);
        }
    }
    best
}

impl WorldSnapshot {
    /// Circles a ray can strike, paired with the body they belong to
    fn circles(&self) -> impl Iterator<Item = (BodyRef, Vec3, f32)> + '_ {
        let target = std::iter::once((BodyRef::Target, self.target, self.radii.target));
        let agents = self
            .agents
            .iter()
            .map(|(id, view)| (BodyRef::Agent(*id), view.position, self.radii.agent));
        let obstacles = self
            .obstacles
            .iter()
            .map(|o| (BodyRef::Obstacle(o.id), o.position, self.radii.obstacle));
        target.chain(agents).chain(obstacles)
    }

    pub fn agent(&self, id: AgentId) -> Option<&BodyView> {
        self.agents.iter().find(|(a, _)| *a == id).map(|(_, v)| v)
    }

    /// The first agent other than `id`
    pub fn other_agent(&self, id: AgentId) -> Option<&BodyView> {
        self.agents.iter().find(|(a, _)| *a != id).map(|(_, v)| v)
    }

    /// Gap between a circle of `radius` at `position` and the nearest wall
    pub fn wall_clearance(&self, position: Vec3, radius: f32) -> f32 {
        (self.half_size - position.x.abs()).min(self.half_size - position.z.abs()) - radius
    }

    pub fn overlaps(a: Vec3, b: Vec3, ra: f32, rb: f32) -> bool {
        planar_distance(a, b) <= ra + rb
    }
}

impl WorldQuery for WorldSnapshot {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: CategoryMask,
        ignore: Option<BodyRef>,
    ) -> Option<RayHit> {
        let o = planar(origin);
        let d = planar(direction).normalize_or_zero();
        if d == Vec2::ZERO {
            return None;
        }

        let mut best: Option<RayHit> = None;
        let mut consider = |distance: f32, body: BodyRef| {
            if distance <= max_distance && best.map_or(true, |b| distance < b.distance) {
                best = Some(RayHit { distance, body });
            }
        };

        for (body, center, radius) in self.circles() {
            if Some(body) == ignore || !mask.admits(body.category()) {
                continue;
            }
            if let Some(t) = ray_circle(o, d, planar(center), radius) {
                consider(t, body);
            }
        }

        if mask.admits(BodyCategory::Wall) && ignore != Some(BodyRef::Wall) {
            if let Some(t) = ray_walls(o, d, self.half_size) {
                consider(t, BodyRef::Wall);
            }
        }

        best
    }

    fn nearest_obstacle(&self, from: Vec3) -> Option<ObstacleSnapshot> {
        self.obstacles
            .iter()
            .min_by(|a, b| {
                planar_distance(from, a.position).total_cmp(&planar_distance(from, b.position))
            })
            .copied()
    }
}
