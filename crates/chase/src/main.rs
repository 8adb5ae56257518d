use std::path::PathBuf;

use anyhow::Result;
use chase::{runner, PolicyKind, RunnerConfig};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// RON config file (default: ./chase.ron if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Finished episodes to collect per arena
    #[arg(long)]
    episodes: Option<usize>,

    /// Number of independent arenas to run in parallel
    #[arg(long)]
    arenas: Option<usize>,

    /// Base random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Policy driving the agents
    #[arg(long, value_enum)]
    policy: Option<PolicyKind>,

    /// Write the run report to this RON file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    quiet: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    log::info!("Starting Chase runner");

    let mut config = RunnerConfig::load(args.config.as_deref())?;

    // Layer 4: CLI flags
    if let Some(episodes) = args.episodes {
        config.run.episodes = episodes;
    }
    if let Some(arenas) = args.arenas {
        config.run.arenas = arenas.max(1);
    }
    if let Some(seed) = args.seed {
        config.run.seed = seed;
    }
    if let Some(policy) = args.policy {
        config.run.policy = policy;
    }
    if args.quiet {
        config.run.progress = false;
    }

    let report = runner::run(&config)?;
    report.log_summary();

    if let Some(path) = args.report {
        report.write_ron(&path)?;
        log::info!("Report written to {}", path.display());
    }

    Ok(())
}
