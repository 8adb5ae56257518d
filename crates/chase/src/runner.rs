//! Headless episode runner
//!
//! Each arena is fully independent (own RNG, own curriculum), so arenas are
//! evaluated in parallel with rayon while every tick inside an arena stays
//! strictly sequential.

use anyhow::{Context, Result};
use chase_sim::{Action, AgentId, Arena, EpisodeSummary};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::config::RunnerConfig;
use crate::policy::Policy;
use crate::report::{ArenaReport, RunReport};

/// Progress bar style shared by all runs
fn progress_style() -> Result<ProgressStyle> {
    Ok(ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .context("Invalid progress template")?
        .progress_chars("█▓░"))
}

/// Run `config.run.arenas` arenas until each has finished `config.run.episodes` episodes
pub fn run(config: &RunnerConfig) -> Result<RunReport> {
    let settings = &config.run;
    let total = (settings.episodes * settings.arenas) as u64;

    let pb = if settings.progress {
        let pb = ProgressBar::new(total);
        pb.set_style(progress_style()?);
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    } else {
        ProgressBar::hidden()
    };
    pb.set_message(format!("policy {}", settings.policy));

    log::info!(
        "Running {} arena(s) x {} episodes with the {} policy",
        settings.arenas,
        settings.episodes,
        settings.policy
    );

    let arenas: Vec<ArenaReport> = (0..settings.arenas)
        .into_par_iter()
        .map(|index| run_arena(config, index, &pb))
        .collect::<Result<_>>()?;

    pb.finish_with_message("done");

    Ok(RunReport::new(settings.policy.name(), arenas))
}

/// Drive one arena until enough episodes have finished
pub fn run_arena(config: &RunnerConfig, index: usize, pb: &ProgressBar) -> Result<ArenaReport> {
    let seed = config.run.seed.wrapping_add(index as u64);
    let mut arena = Arena::new(config.sim.clone(), seed)
        .with_context(|| format!("Failed to create arena {}", index))?;

    let mut policies: Vec<Box<dyn Policy>> = (0..arena.agent_count())
        .map(|agent| config.run.policy.build(seed.wrapping_mul(31).wrapping_add(agent as u64)))
        .collect();

    let wanted = config.run.episodes;
    let mut summaries: Vec<EpisodeSummary> = Vec::with_capacity(wanted);

    while summaries.len() < wanted {
        let actions: Vec<_> = policies
            .iter_mut()
            .enumerate()
            .map(|(i, policy)| match arena.observation(AgentId(i as u8)) {
                Some(obs) => policy.act(&obs),
                None => Action::NONE,
            })
            .collect();

        for result in arena.step(&actions) {
            if result.done {
                arena.begin_episode(result.agent);
            }
        }

        for summary in arena.take_summaries() {
            if summaries.len() < wanted {
                log::debug!(
                    "Arena {}: {} episode {} {} ({:.3})",
                    index,
                    summary.agent,
                    summary.episode,
                    summary.outcome,
                    summary.cumulative_reward
                );
                summaries.push(summary);
                pb.inc(1);
            }
        }
    }

    let curriculum = arena.curriculum();
    Ok(ArenaReport::from_summaries(
        index,
        seed,
        arena.tick(),
        &summaries,
        curriculum.phase,
        curriculum.obstacle_count,
    ))
}
