//! End-to-end arena scenarios run through the public API

use chase_sim::curriculum::CurriculumPhase;
use chase_sim::observation::BodyView;
use chase_sim::obstacle::{MoveOutcome, ObstacleSnapshot};
use chase_sim::world::{BodyRadii, WorldSnapshot};
use chase_sim::{
    observation_len, Action, AgentId, Arena, ArenaConfig, Axis, CurriculumConfig,
    CurriculumObstacleManager, EpisodeState, ObstacleConfig, ObstacleId, ObstacleMotionController,
    TerminalReason,
};
use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

/// One agent parked near the south wall, no obstacles, target kept away
fn quiet_config() -> ArenaConfig {
    let mut config = ArenaConfig::default();
    config.arena.agent_count = 1;
    config.arena.agent_spawns = vec![[0.0, -9.0]];
    config.agent.target_spawn_extent = 5.0;
    config.curriculum.starting_obstacles = 0;
    config.curriculum.max_obstacles = 0;
    config
}

fn random_actions(rng: &mut Xoshiro256StarStar, agents: usize) -> Vec<Action> {
    (0..agents)
        .map(|_| Action::new(rng.gen_range(-1.0..=1.0), rng.gen_range(-1.0..=1.0)))
        .collect()
}

/// Step with random actions, restarting agents as their episodes end
fn rollout(seed: u64, ticks: usize) -> Vec<f32> {
    let mut arena = Arena::new(ArenaConfig::default(), seed).unwrap();
    let mut driver = Xoshiro256StarStar::seed_from_u64(seed ^ 0xA5A5);
    let mut rewards = Vec::with_capacity(ticks * 2);

    for _ in 0..ticks {
        let actions = random_actions(&mut driver, arena.agent_count());
        for result in arena.step(&actions) {
            rewards.push(result.reward);
            if result.done {
                arena.begin_episode(result.agent);
            }
        }
    }
    rewards
}

#[test]
fn agent_next_to_target_scores_and_ends() {
    let mut arena = Arena::new(ArenaConfig::default(), 42).unwrap();
    arena.place_target(Vec3::new(5.0, 0.0, 5.0));
    arena.place_agent(AgentId(0), Vec3::new(5.05, 0.0, 5.0));

    let results = arena.step(&[Action::NONE, Action::NONE]);
    let first = &results[0];
    assert!(first.done);
    assert_eq!(first.terminal, Some(TerminalReason::TargetReached));
    assert_eq!(first.breakdown.terminal, 3.0);
    assert!(first.reward > 2.9);

    let summaries = arena.take_summaries();
    assert!(summaries
        .iter()
        .any(|s| s.agent == AgentId(0) && s.outcome == TerminalReason::TargetReached));
}

#[test]
fn step_budget_forces_timeout() {
    let mut arena = Arena::new(quiet_config(), 7).unwrap();

    for step in 1..1000u32 {
        let results = arena.step(&[Action::NONE]);
        assert!(!results[0].done, "episode ended early at step {step}");
        assert_eq!(arena.agent(AgentId(0)).unwrap().agent().step_count, step);
    }

    let results = arena.step(&[Action::NONE]);
    assert!(results[0].done);
    assert_eq!(results[0].terminal, Some(TerminalReason::Timeout));
    assert_eq!(results[0].reward, -0.5);
    assert_eq!(
        arena.agent(AgentId(0)).unwrap().state(),
        EpisodeState::Terminating
    );
}

#[test]
fn observation_length_and_ranges() {
    for rays in [1usize, 8, 16] {
        let mut config = ArenaConfig::default();
        config.agent.ray_count = rays;
        let mut arena = Arena::new(config, rays as u64).unwrap();
        let mut driver = Xoshiro256StarStar::seed_from_u64(99);

        for _ in 0..300 {
            let actions = random_actions(&mut driver, 2);
            for result in arena.step(&actions) {
                let obs = &result.observation;
                assert_eq!(obs.len(), observation_len(rays));
                assert_eq!(obs.len(), 3 + 1 + 3 + 4 + 2 + 8 + rays + 4);
                assert!(obs.as_slice().iter().all(|v| v.is_finite()));
                assert!(obs.rays().iter().all(|v| (0.0..=1.0).contains(v)));
                assert!((0.0..=1.0).contains(&obs.collision_risk()));
                if result.done {
                    arena.begin_episode(result.agent);
                }
            }
        }
    }
}

#[test]
fn replay_yields_identical_rewards() {
    let first = rollout(1234, 600);
    let second = rollout(1234, 600);
    assert_eq!(first, second);

    let other = rollout(4321, 600);
    assert_ne!(first, other);
}

#[test]
fn spawn_spacing_holds_in_most_trials() {
    let config = CurriculumConfig {
        starting_obstacles: 5,
        max_obstacles: 5,
        ..Default::default()
    };

    let trials = 200;
    let mut spaced = 0;
    for seed in 0..trials {
        let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
        let manager =
            CurriculumObstacleManager::new(config.clone(), ObstacleConfig::default(), &mut rng);
        let positions: Vec<Vec3> = manager.obstacles().iter().map(|o| o.position()).collect();
        assert_eq!(positions.len(), 5);

        let ok = positions.iter().enumerate().all(|(i, a)| {
            positions[i + 1..]
                .iter()
                .all(|b| Vec3::new(a.x - b.x, 0.0, a.z - b.z).length() >= 2.0)
        });
        if ok {
            spaced += 1;
        }
    }
    assert!(spaced as f32 / trials as f32 >= 0.95);
}

#[test]
fn curriculum_stays_within_bounds() {
    let config = CurriculumConfig {
        randomize_every_n_episodes: 3,
        ..Default::default()
    };
    let mut rng = Xoshiro256StarStar::seed_from_u64(5);
    let mut manager =
        CurriculumObstacleManager::new(config.clone(), ObstacleConfig::default(), &mut rng);

    for _ in 0..60 {
        if manager.on_episode_begin(&mut rng) {
            let state = manager.state();
            assert!(state.obstacle_count >= config.starting_obstacles);
            assert!(state.obstacle_count <= config.max_obstacles);
            assert!(state.speed.min >= config.start_min_speed);
            assert!(state.speed.max <= config.end_max_speed);
            assert_eq!(manager.obstacles().len(), state.obstacle_count);
            for obstacle in manager.obstacles() {
                assert!(state.speed.contains(obstacle.speed()));
            }
        }
    }
    assert_eq!(manager.state().phase, CurriculumPhase::Hard);
}

#[test]
fn obstacle_reverses_when_another_is_ahead() {
    let mut rng = Xoshiro256StarStar::seed_from_u64(8);
    let mut obstacle = ObstacleMotionController::new(
        ObstacleId(0),
        Vec3::ZERO,
        Axis::X,
        2.0,
        ObstacleConfig::default(),
        &mut rng,
    );
    let heading = obstacle.direction();
    let ahead = ObstacleSnapshot {
        id: ObstacleId(1),
        position: Vec3::new(heading * 1.0, 0.0, 0.0),
        axis: Axis::Z,
        direction: 1.0,
        speed: 0.0,
    };
    let world = WorldSnapshot {
        half_size: 10.0,
        radii: BodyRadii {
            agent: 0.5,
            obstacle: 0.5,
            target: 0.5,
        },
        target: Vec3::new(0.0, 0.0, 8.0),
        agents: vec![(
            AgentId(0),
            BodyView {
                position: Vec3::new(-6.0, 0.0, -6.0),
                velocity: Vec3::ZERO,
            },
        )],
        obstacles: vec![obstacle.snapshot(), ahead],
    };

    let outcome = obstacle.tick(0.02, &world);
    assert_eq!(outcome, MoveOutcome::AvoidedObstacle);
    assert_eq!(obstacle.direction(), -heading);
    assert_eq!(obstacle.position(), Vec3::ZERO);
}

#[test]
fn reset_obstacle_twice_lands_on_spawn() {
    let mut arena = Arena::new(ArenaConfig::default(), 21).unwrap();
    for _ in 0..100 {
        arena.step(&[]);
    }

    let id = arena.obstacles().obstacles()[0].id();
    let home = arena.obstacles().obstacles()[0].motion().home();

    assert!(arena.reset_obstacle(id));
    let first = arena.obstacles().obstacles()[0].position();
    assert!(arena.reset_obstacle(id));
    let second = arena.obstacles().obstacles()[0].position();

    assert_eq!(first, second);
    assert_eq!(first, home);
    assert!(!arena.reset_obstacle(ObstacleId(9999)));
}
