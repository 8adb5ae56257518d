//! Built-in action sources standing in for a trained policy

use chase_sim::{Action, ManualInput, Observation};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use serde::{Deserialize, Serialize};

/// Obstacles closer than this (normalized distance) push the greedy policy away
const AVOID_DISTANCE: f32 = 2.5 / 20.0;

/// Which built-in policy drives the agents
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum PolicyKind {
    /// Head for the target, sidestepping close obstacles
    #[default]
    Greedy,
    /// Uniform random actions
    Random,
    /// Never move
    Idle,
}

impl PolicyKind {
    pub fn name(&self) -> &'static str {
        match self {
            PolicyKind::Greedy => "greedy",
            PolicyKind::Random => "random",
            PolicyKind::Idle => "idle",
        }
    }

    pub fn build(&self, seed: u64) -> Box<dyn Policy> {
        match self {
            PolicyKind::Greedy => Box::new(GreedyPolicy),
            PolicyKind::Random => Box::new(RandomPolicy::new(seed)),
            PolicyKind::Idle => Box::new(IdlePolicy),
        }
    }
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Maps an observation to an action
pub trait Policy: Send {
    fn act(&mut self, observation: &Observation) -> Action;
}

/// Steers straight at the target and away from the nearest obstacle
pub struct GreedyPolicy;

impl Policy for GreedyPolicy {
    fn act(&mut self, observation: &Observation) -> Action {
        let to_target = observation.target_direction();
        let [ox, oz, distance, _] = observation.nearest_obstacle();

        let (mut x, mut z) = (to_target.x, to_target.z);
        if distance < AVOID_DISTANCE {
            let push = 1.0 - distance / AVOID_DISTANCE;
            x -= ox * push * 2.0;
            z -= oz * push * 2.0;
        }

        // Keeps the per-tick velocity change at the jerk threshold
        ManualInput::new(x * 0.02, z * 0.02).to_action()
    }
}

pub struct RandomPolicy {
    rng: Xoshiro256StarStar,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Xoshiro256StarStar::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn act(&mut self, _observation: &Observation) -> Action {
        Action::new(
            self.rng.gen_range(-1.0..=1.0),
            self.rng.gen_range(-1.0..=1.0),
        )
    }
}

pub struct IdlePolicy;

impl Policy for IdlePolicy {
    fn act(&mut self, _observation: &Observation) -> Action {
        ManualInput::default().to_action()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chase_sim::{AgentId, Arena, ArenaConfig};
    use glam::Vec3;

    fn observation() -> Observation {
        let mut arena = Arena::new(ArenaConfig::default(), 11).unwrap();
        arena.place_target(Vec3::new(-1.5, 0.0, 6.0));
        arena.observation(AgentId(0)).unwrap()
    }

    #[test]
    fn test_greedy_heads_for_target() {
        let obs = observation();
        let action = GreedyPolicy.act(&obs);
        let dir = obs.target_direction();
        if obs.nearest_obstacle()[2] >= AVOID_DISTANCE {
            assert!(action.x * dir.x + action.z * dir.z > 0.0);
        }
        assert!(action.x.abs() <= 1.0 && action.z.abs() <= 1.0);
    }

    #[test]
    fn test_random_is_seeded() {
        let obs = observation();
        let mut a = RandomPolicy::new(5);
        let mut b = RandomPolicy::new(5);
        for _ in 0..10 {
            assert_eq!(a.act(&obs), b.act(&obs));
        }
    }

    #[test]
    fn test_idle_never_moves() {
        assert_eq!(IdlePolicy.act(&observation()), Action::NONE);
    }

    #[test]
    fn test_kind_builds_matching_policy() {
        let obs = observation();
        let mut idle = PolicyKind::Idle.build(0);
        assert_eq!(idle.act(&obs), Action::NONE);
        assert_eq!(PolicyKind::Random.to_string(), "random");
    }
}
