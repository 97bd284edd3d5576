//! Tumble simulator CLI
//!
//! Usage:
//!   tumble-sim --rounds 1000000 --seed 42
//!   tumble-sim --config games/sweet.yaml --bonus-tier standard --json

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use rf_tumble::{ConfigLoader, EngineConfig, TumbleEngine};
use rf_tumble_sim::{SimConfig, SimStats, Simulator};

#[derive(Parser)]
#[command(name = "tumble-sim", about = "Batch simulator for the tumble engine")]
struct Cli {
    /// Engine configuration (JSON or YAML); built-in game when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Rounds to play
    #[arg(short, long, visible_alias = "spins", default_value_t = 100_000)]
    rounds: u64,

    /// Bet per spin
    #[arg(short, long, default_value_t = 1.0)]
    bet: f64,

    /// Master seed (random when omitted)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Worker threads (defaults to the CPU count)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Buy this bonus tier every round
    #[arg(long)]
    bonus_tier: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    game: &'a str,
    config: &'a SimConfig,
    rtp: f64,
    hit_rate: f64,
    trigger_frequency: Option<f64>,
    avg_cascade_depth: f64,
    elapsed_ms: u128,
    stats: &'a SimStats,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let engine_config = match &cli.config {
        Some(path) => ConfigLoader::new()
            .from_path(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => EngineConfig::sweet_bonanza(),
    };
    let engine = TumbleEngine::new(engine_config).context("Invalid engine configuration")?;
    let game = engine.config().name.clone();

    let sim_config = SimConfig {
        rounds: cli.rounds,
        bet: cli.bet,
        seed: cli.seed.unwrap_or_else(rand::random),
        threads: cli.threads,
        bonus_tier: cli.bonus_tier,
    };

    let started = Instant::now();
    let stats = Simulator::new(Arc::new(engine))
        .run(&sim_config)
        .context("Simulation failed")?;
    let elapsed_ms = started.elapsed().as_millis();

    let report = Report {
        game: &game,
        config: &sim_config,
        rtp: stats.rtp(),
        hit_rate: stats.hit_rate(),
        trigger_frequency: stats.trigger_frequency(),
        avg_cascade_depth: stats.avg_cascade_depth(),
        elapsed_ms,
        stats: &stats,
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &Report<'_>) {
    let stats = report.stats;
    println!("{}: {} rounds (seed {})", report.game, stats.rounds, report.config.seed);
    println!("  RTP              {:>10.3}%", report.rtp);
    println!("  Hit rate         {:>10.2}%", report.hit_rate);
    match report.trigger_frequency {
        Some(freq) => println!("  Trigger every    {:>10.1} rounds", freq),
        None => println!("  Trigger every    {:>10}", "never"),
    }
    println!("  Free spins       {:>10}", stats.free_spins);
    println!("  Retriggers       {:>10}", stats.retriggers);
    println!("  Big wins         {:>10}", stats.big_wins);
    println!("  Max win          {:>10.1}x", stats.max_win_ratio);
    println!("  Cascade depth    {:>10.3}", report.avg_cascade_depth);
    println!("  Capped spins     {:>10}", stats.capped_spins);
    println!("  Elapsed          {:>10} ms", report.elapsed_ms);
}
