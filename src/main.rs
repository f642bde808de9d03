//! Arc Duel - Headless Runner
//!
//! Runs learning duels back to back and prints one report per match.
//! Agent tables are saved after every match so training resumes across runs.

use std::path::PathBuf;

use arc_duel::core::config::{load_agent_config, load_duel_config, DuelConfig};
use arc_duel::core::error::{DuelError, Result};
use arc_duel::core::types::Role;
use arc_duel::learning::persistence::{BlobStore, FileBlobStore, MemoryBlobStore};
use arc_duel::simulation::{DuelSession, MatchReport};
use clap::Parser;
use serde::Serialize;

/// Headless duel runner - hero vs knight, both learning online
#[derive(Parser, Debug)]
#[command(name = "arc-duel")]
#[command(about = "Run learning duels and report match outcomes")]
struct Args {
    /// Number of matches to run back to back
    #[arg(long, default_value_t = 10)]
    matches: u32,

    /// Random seed for deterministic runs
    #[arg(long)]
    seed: Option<u64>,

    /// Simulation step in milliseconds
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Duel config TOML (defaults are used when omitted)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for saved agent tables; in-memory only when omitted
    #[arg(long)]
    store_dir: Option<PathBuf>,

    /// Directory holding <agent>.toml hyperparameter files
    #[arg(long, default_value = "data/agents")]
    agent_dir: PathBuf,

    /// Output format: json or text
    #[arg(long, default_value = "json")]
    format: String,

    /// Enable debug logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// JSON output structure
#[derive(Serialize)]
struct RunSummary {
    seed: u64,
    matches: u32,
    hero_wins: u32,
    knight_wins: u32,
    draws: u32,
    reports: Vec<MatchReport>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        "arc_duel=debug"
    } else {
        "arc_duel=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if args.format != "json" && args.format != "text" {
        return Err(DuelError::InvalidConfig(format!(
            "unknown output format '{}'",
            args.format
        )));
    }

    let mut config = match &args.config {
        Some(path) => load_duel_config(path)?,
        None => DuelConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(tick_ms) = args.tick_ms {
        config.tick_ms = tick_ms;
    }
    config.validate().map_err(DuelError::InvalidConfig)?;

    let hero_config = load_agent_config(&args.agent_dir, Role::Protagonist.id());
    let knight_config = load_agent_config(&args.agent_dir, Role::Antagonist.id());

    let store: Box<dyn BlobStore> = match &args.store_dir {
        Some(dir) => {
            tracing::info!("Persisting agent tables under {:?}", dir);
            Box::new(FileBlobStore::new(dir.clone()))
        }
        None => Box::new(MemoryBlobStore::new()),
    };

    let seed = config.seed;
    let mut session = DuelSession::new(config, hero_config, knight_config, store);
    let mut reports = Vec::with_capacity(args.matches as usize);

    for i in 0..args.matches {
        if i > 0 {
            session.restart_match()?;
        }
        let report = session.run_match()?;
        if args.format == "text" {
            println!("{}", report.summary());
        }
        reports.push(report);
    }

    let summary = summarize(seed, reports);
    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "hero {} / knight {} / draws {}",
            summary.hero_wins, summary.knight_wins, summary.draws
        );
    }

    Ok(())
}

fn summarize(seed: u64, reports: Vec<MatchReport>) -> RunSummary {
    let count = |role: Option<Role>| {
        reports
            .iter()
            .filter(|r| r.result.winner() == role)
            .count() as u32
    };
    RunSummary {
        seed,
        matches: reports.len() as u32,
        hero_wins: count(Some(Role::Protagonist)),
        knight_wins: count(Some(Role::Antagonist)),
        draws: count(None),
        reports,
    }
}
