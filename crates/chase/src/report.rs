//! Run reports
//!
//! Aggregates finished episodes per arena and writes the result as RON.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chase_sim::{CurriculumPhase, EpisodeSummary, TerminalReason};
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};

/// Outcome statistics for one arena
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaReport {
    pub arena: usize,
    pub seed: u64,
    pub episodes: usize,
    pub ticks: u64,
    /// Episode count per terminal reason
    pub outcomes: BTreeMap<TerminalReason, usize>,
    pub success_rate: f32,
    pub mean_reward: f32,
    pub mean_steps: f32,
    pub final_phase: CurriculumPhase,
    pub final_obstacles: usize,
}

impl ArenaReport {
    pub fn from_summaries(
        arena: usize,
        seed: u64,
        ticks: u64,
        summaries: &[EpisodeSummary],
        final_phase: CurriculumPhase,
        final_obstacles: usize,
    ) -> Self {
        let mut outcomes = BTreeMap::new();
        for summary in summaries {
            *outcomes.entry(summary.outcome).or_insert(0) += 1;
        }

        let n = summaries.len().max(1) as f32;
        let successes = summaries.iter().filter(|s| s.outcome.is_success()).count();

        Self {
            arena,
            seed,
            episodes: summaries.len(),
            ticks,
            outcomes,
            success_rate: successes as f32 / n,
            mean_reward: summaries.iter().map(|s| s.cumulative_reward).sum::<f32>() / n,
            mean_steps: summaries.iter().map(|s| s.steps as f32).sum::<f32>() / n,
            final_phase,
            final_obstacles,
        }
    }
}

/// Totals across every arena of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub policy: String,
    pub total_episodes: usize,
    pub success_rate: f32,
    pub mean_reward: f32,
    pub arenas: Vec<ArenaReport>,
}

impl RunReport {
    pub fn new(policy: &str, arenas: Vec<ArenaReport>) -> Self {
        let total_episodes: usize = arenas.iter().map(|a| a.episodes).sum();
        let weight = total_episodes.max(1) as f32;
        let weighted = |f: fn(&ArenaReport) -> f32| {
            arenas.iter().map(|a| f(a) * a.episodes as f32).sum::<f32>() / weight
        };

        Self {
            policy: policy.to_string(),
            total_episodes,
            success_rate: weighted(|a| a.success_rate),
            mean_reward: weighted(|a| a.mean_reward),
            arenas,
        }
    }

    /// Log a short summary
    pub fn log_summary(&self) {
        log::info!(
            "Run complete: {} episodes, success rate {:.1}%, mean reward {:.3}",
            self.total_episodes,
            self.success_rate * 100.0,
            self.mean_reward
        );
        for arena in &self.arenas {
            log::info!(
                "  Arena {} (seed {}): {} episodes, {:.1}% success, phase {}, {} obstacles",
                arena.arena,
                arena.seed,
                arena.episodes,
                arena.success_rate * 100.0,
                arena.final_phase,
                arena.final_obstacles
            );
        }
    }

    pub fn write_ron(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create report directory")?;
        }
        let text = ron::ser::to_string_pretty(self, PrettyConfig::default())
            .context("Failed to serialize report")?;
        fs::write(path, text).with_context(|| format!("Failed to write report {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chase_sim::AgentId;

    fn summary(outcome: TerminalReason, reward: f32, steps: u32) -> EpisodeSummary {
        EpisodeSummary {
            agent: AgentId(0),
            episode: 1,
            steps,
            cumulative_reward: reward,
            outcome,
        }
    }

    #[test]
    fn test_arena_aggregates() {
        let summaries = vec![
            summary(TerminalReason::TargetReached, 3.0, 100),
            summary(TerminalReason::HitWall, -1.0, 50),
            summary(TerminalReason::TargetReached, 2.0, 150),
            summary(TerminalReason::Timeout, -2.0, 1000),
        ];
        let report =
            ArenaReport::from_summaries(0, 9, 1300, &summaries, CurriculumPhase::Medium, 4);
        assert_eq!(report.episodes, 4);
        assert_eq!(report.outcomes[&TerminalReason::TargetReached], 2);
        assert_eq!(report.success_rate, 0.5);
        assert_eq!(report.mean_reward, 0.5);
        assert_eq!(report.mean_steps, 325.0);
    }

    #[test]
    fn test_empty_arena_has_zero_rates() {
        let report = ArenaReport::from_summaries(0, 0, 0, &[], CurriculumPhase::Easy, 3);
        assert_eq!(report.success_rate, 0.0);
        assert!(report.outcomes.is_empty());
    }

    #[test]
    fn test_run_report_weights_by_episodes() {
        let a = ArenaReport::from_summaries(
            0,
            0,
            10,
            &[summary(TerminalReason::TargetReached, 3.0, 10)],
            CurriculumPhase::Easy,
            3,
        );
        let b = ArenaReport::from_summaries(
            1,
            1,
            10,
            &[
                summary(TerminalReason::HitWall, -0.5, 5),
                summary(TerminalReason::HitWall, -0.5, 5),
                summary(TerminalReason::HitWall, -0.5, 5),
            ],
            CurriculumPhase::Easy,
            3,
        );
        let run = RunReport::new("greedy", vec![a, b]);
        assert_eq!(run.total_episodes, 4);
        assert_eq!(run.success_rate, 0.25);
    }

    #[test]
    fn test_write_ron_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.ron");
        let run = RunReport::new(
            "idle",
            vec![ArenaReport::from_summaries(
                0,
                3,
                1000,
                &[summary(TerminalReason::Timeout, -0.7, 1000)],
                CurriculumPhase::Easy,
                3,
            )],
        );
        run.write_ron(&path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let back: RunReport = ron::from_str(&text).unwrap();
        assert_eq!(back, run);
    }
}
