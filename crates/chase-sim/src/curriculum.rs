//! Curriculum-driven obstacle population
//!
//! Owns every obstacle in an arena. Difficulty escalates with the total number
//! of episodes seen: every `randomize_every_n_episodes` episodes the phase is
//! recomputed and the whole population is respawned with the phase's obstacle
//! count and speed range.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::obstacle::{ObstacleConfig, ObstacleMotionController, ObstacleSnapshot};
use crate::traits::{EpisodeListener, SimRng};
use crate::types::{planar_distance, Axis, ObstacleId};

/// Spawn candidates are drawn from at most this half extent
const SPAWN_AREA_LIMIT: f32 = 8.0;

/// Curriculum and spawn settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CurriculumConfig {
    /// Escalate difficulty with episode count; otherwise stay on the starting setup
    pub use_curriculum: bool,
    pub starting_obstacles: usize,
    pub max_obstacles: usize,
    pub start_min_speed: f32,
    pub start_max_speed: f32,
    pub end_min_speed: f32,
    pub end_max_speed: f32,
    /// Episodes between full respawns
    pub randomize_every_n_episodes: u32,
    /// Pick a random travel axis per obstacle (X only when false)
    pub randomize_axis: bool,
    /// Half extent of the spawn square (capped at 8)
    pub spawn_area_size: f32,
    /// Obstacles keep at least this distance from the arena center
    pub center_clearance: f32,
    /// Obstacles in one batch keep at least this distance from each other
    pub min_spacing: f32,
    pub max_spawn_attempts: u32,
    /// Episode count at which Medium starts
    pub medium_phase_episode: u64,
    /// Episode count at which Hard starts
    pub hard_phase_episode: u64,
}

impl Default for CurriculumConfig {
    fn default() -> Self {
        Self {
            use_curriculum: true,
            starting_obstacles: 3,
            max_obstacles: 7,
            start_min_speed: 1.0,
            start_max_speed: 2.0,
            end_min_speed: 2.0,
            end_max_speed: 4.0,
            randomize_every_n_episodes: 100,
            randomize_axis: true,
            spawn_area_size: 8.0,
            center_clearance: 3.0,
            min_spacing: 2.0,
            max_spawn_attempts: 20,
            medium_phase_episode: 10,
            hard_phase_episode: 20,
        }
    }
}

/// Named difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurriculumPhase {
    Easy,
    Medium,
    Hard,
}

impl CurriculumPhase {
    /// Phase for a total episode count
    pub fn for_episode(episode_count: u64, config: &CurriculumConfig) -> Self {
        if episode_count < config.medium_phase_episode {
            CurriculumPhase::Easy
        } else if episode_count < config.hard_phase_episode {
            CurriculumPhase::Medium
        } else {
            CurriculumPhase::Hard
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CurriculumPhase::Easy => "easy",
            CurriculumPhase::Medium => "medium",
            CurriculumPhase::Hard => "hard",
        }
    }

    /// Inclusive obstacle-count range before clamping
    pub fn obstacle_range(&self, config: &CurriculumConfig) -> (usize, usize) {
        match self {
            CurriculumPhase::Easy => (config.starting_obstacles, config.starting_obstacles),
            CurriculumPhase::Medium => {
                let mid = (config.starting_obstacles + config.max_obstacles) / 2;
                (mid.saturating_sub(1), mid)
            }
            CurriculumPhase::Hard => (config.max_obstacles.saturating_sub(1), config.max_obstacles),
        }
    }

    /// Speed range for this phase; Medium sits halfway between start and end
    pub fn speed_range(&self, config: &CurriculumConfig) -> SpeedRange {
        match self {
            CurriculumPhase::Easy => {
                SpeedRange::new(config.start_min_speed, config.start_max_speed)
            }
            CurriculumPhase::Medium => SpeedRange::new(
                lerp(config.start_min_speed, config.end_min_speed, 0.5),
                lerp(config.start_max_speed, config.end_max_speed, 0.5),
            ),
            CurriculumPhase::Hard => SpeedRange::new(config.end_min_speed, config.end_max_speed),
        }
    }
}

impl std::fmt::Display for CurriculumPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Closed speed interval obstacles draw from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedRange {
    pub min: f32,
    pub max: f32,
}

impl SpeedRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Clamp both ends into the span between `lo` and `hi` and keep min <= max
    ///
    /// The bounds may arrive crossed (start speeds above end speeds).
    pub fn clamped(&self, lo: f32, hi: f32) -> Self {
        let (lo, hi) = (lo.min(hi), lo.max(hi));
        let min = self.min.clamp(lo, hi);
        let max = self.max.clamp(lo, hi).max(min);
        Self { min, max }
    }

    pub fn contains(&self, speed: f32) -> bool {
        speed >= self.min && speed <= self.max
    }
}

/// Mutable curriculum bookkeeping, changed only at episode boundaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurriculumState {
    /// Total episodes started over the arena's lifetime
    pub episode_count: u64,
    pub episodes_since_randomization: u32,
    pub obstacle_count: usize,
    pub speed: SpeedRange,
    pub phase: CurriculumPhase,
}

/// Obstacle lifecycle notification for the host scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneEvent {
    Spawned { id: ObstacleId, position: Vec3 },
    Destroyed { id: ObstacleId },
}

/// Owns the obstacle population and the curriculum schedule
#[derive(Debug, Clone)]
pub struct CurriculumObstacleManager {
    config: CurriculumConfig,
    obstacle_config: ObstacleConfig,
    state: CurriculumState,
    obstacles: Vec<ObstacleMotionController>,
    next_id: u32,
    scene_events: Vec<SceneEvent>,
}

impl CurriculumObstacleManager {
    /// Create the manager and spawn the starting population
    pub fn new<R: SimRng + ?Sized>(
        config: CurriculumConfig,
        obstacle_config: ObstacleConfig,
        rng: &mut R,
    ) -> Self {
        let phase = CurriculumPhase::Easy;
        let state = CurriculumState {
            episode_count: 0,
            episodes_since_randomization: 0,
            obstacle_count: config.starting_obstacles,
            speed: SpeedRange::new(config.start_min_speed, config.start_max_speed),
            phase,
        };

        let mut manager = Self {
            config,
            obstacle_config,
            state,
            obstacles: Vec::new(),
            next_id: 0,
            scene_events: Vec::new(),
        };
        manager.spawn_obstacles(rng);

        log::info!(
            "Obstacle manager started with {} obstacles (speed {:.1}-{:.1})",
            manager.state.obstacle_count,
            manager.state.speed.min,
            manager.state.speed.max
        );

        manager
    }

    pub fn state(&self) -> &CurriculumState {
        &self.state
    }

    pub fn config(&self) -> &CurriculumConfig {
        &self.config
    }

    pub fn obstacles(&self) -> &[ObstacleMotionController] {
        &self.obstacles
    }

    pub fn obstacles_mut(&mut self) -> &mut [ObstacleMotionController] {
        &mut self.obstacles
    }

    pub fn obstacle_mut(&mut self, id: ObstacleId) -> Option<&mut ObstacleMotionController> {
        self.obstacles.iter_mut().find(|o| o.id() == id)
    }

    pub fn snapshots(&self) -> Vec<ObstacleSnapshot> {
        self.obstacles.iter().map(|o| o.snapshot()).collect()
    }

    /// Drain spawn/destroy notifications recorded since the last call
    pub fn take_scene_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.scene_events)
    }

    /// Count an episode start; respawns when the randomization interval is reached
    ///
    /// Returns true if the population was respawned.
    pub fn on_episode_begin<R: SimRng + ?Sized>(&mut self, rng: &mut R) -> bool {
        self.state.episode_count += 1;
        self.state.episodes_since_randomization += 1;

        if self.state.episodes_since_randomization >= self.config.randomize_every_n_episodes {
            self.randomize_environment(rng);
            self.state.episodes_since_randomization = 0;
            true
        } else {
            false
        }
    }

    /// Out-of-cycle randomization; the interval counter is left alone
    pub fn manual_randomize<R: SimRng + ?Sized>(&mut self, rng: &mut R) {
        self.randomize_environment(rng);
    }

    fn randomize_environment<R: SimRng + ?Sized>(&mut self, rng: &mut R) {
        if self.config.use_curriculum {
            self.update_difficulty(rng);
        }

        self.clear_obstacles();
        self.spawn_obstacles(rng);

        log::info!(
            "Environment randomized (episode {}): phase {}, {} obstacles, speed {:.1}-{:.1}",
            self.state.episode_count,
            self.state.phase,
            self.state.obstacle_count,
            self.state.speed.min,
            self.state.speed.max
        );
    }

    fn update_difficulty<R: SimRng + ?Sized>(&mut self, rng: &mut R) {
        let phase = CurriculumPhase::for_episode(self.state.episode_count, &self.config);
        let (low, high) = phase.obstacle_range(&self.config);

        self.state.phase = phase;
        self.state.obstacle_count = rng
            .pick(low, high)
            .clamp(self.config.starting_obstacles, self.config.max_obstacles);
        self.state.speed = phase
            .speed_range(&self.config)
            .clamped(self.config.start_min_speed, self.config.end_max_speed);
    }

    fn spawn_obstacles<R: SimRng + ?Sized>(&mut self, rng: &mut R) {
        let mut placed: Vec<Vec3> = Vec::with_capacity(self.state.obstacle_count);

        for _ in 0..self.state.obstacle_count {
            let position = self.sample_spawn_position(&placed, rng);
            placed.push(position);
            self.spawn_single_obstacle(position, rng);
        }

        log::debug!("Spawned {} obstacles", self.obstacles.len());
    }

    /// Rejection-sample a spawn point away from the center and from `placed`
    ///
    /// Gives up after `max_spawn_attempts` and keeps the last candidate, so
    /// spawning never blocks even when the area is crowded.
    pub fn sample_spawn_position<R: SimRng + ?Sized>(&self, placed: &[Vec3], rng: &mut R) -> Vec3 {
        let extent = self.config.spawn_area_size.min(SPAWN_AREA_LIMIT);
        let mut candidate = Vec3::ZERO;

        for _ in 0..self.config.max_spawn_attempts.max(1) {
            candidate = Vec3::new(rng.uniform(-extent, extent), 0.0, rng.uniform(-extent, extent));

            if planar_distance(candidate, Vec3::ZERO) < self.config.center_clearance {
                continue;
            }

            let crowded = placed
                .iter()
                .any(|p| planar_distance(candidate, *p) < self.config.min_spacing);
            if !crowded {
                return candidate;
            }
        }

        candidate
    }

    fn spawn_single_obstacle<R: SimRng + ?Sized>(&mut self, position: Vec3, rng: &mut R) {
        let speed = rng.uniform(self.state.speed.min, self.state.speed.max);
        let axis = if self.config.randomize_axis && !rng.coin() {
            Axis::Z
        } else {
            Axis::X
        };

        let id = ObstacleId(self.next_id);
        self.next_id += 1;

        let obstacle = ObstacleMotionController::new(
            id,
            position,
            axis,
            speed,
            self.obstacle_config.clone(),
            rng,
        );

        log::debug!(
            "Spawned {} at ({:.1}, {:.1}) axis {} speed {:.2}",
            id,
            obstacle.position().x,
            obstacle.position().z,
            axis.name(),
            speed
        );

        self.scene_events.push(SceneEvent::Spawned {
            id,
            position: obstacle.position(),
        });
        self.obstacles.push(obstacle);
    }

    fn clear_obstacles(&mut self) {
        for obstacle in self.obstacles.drain(..) {
            self.scene_events.push(SceneEvent::Destroyed { id: obstacle.id() });
        }
    }

    /// Restore one obstacle to its spawn state; false if the id is unknown
    pub fn reset_obstacle<R: SimRng + ?Sized>(&mut self, id: ObstacleId, rng: &mut R) -> bool {
        match self.obstacle_mut(id) {
            Some(obstacle) => {
                obstacle.reset(rng);
                true
            }
            None => false,
        }
    }
}

impl EpisodeListener for CurriculumObstacleManager {
    fn on_agent_episode_begin<R: SimRng + ?Sized>(&mut self, rng: &mut R) {
        self.on_episode_begin(rng);
    }
}
