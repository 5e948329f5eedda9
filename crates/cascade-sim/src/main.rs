//! Cascade engine simulator
//!
//! Usage:
//!   cascade-sim simulate --spins 100000 --seeds 8   - Parallel RTP run
//!   cascade-sim replay --seed 42 --spins 5          - Spin-by-spin JSON
//!   cascade-sim offers --bet 1.0                    - Bonus buy prices
//!   cascade-sim config --format yaml                - Dump the reference config

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use cascade_core::SeededRandom;
use cascade_engine::{CascadeGame, GameConfig, SimulationReport, TierId, simulate};
use clap::{Parser, Subcommand, ValueEnum};
use rayon::prelude::*;

#[derive(Parser)]
#[command(name = "cascade-sim", about = "Cascade engine simulator")]
struct Cli {
    /// Game config file (.json, .yaml or .yml); defaults to the reference game
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure RTP over many spins, one worker per seed
    Simulate {
        /// Paid spins per seed
        #[arg(short, long, default_value_t = 100_000)]
        spins: u64,
        /// Number of seeds
        #[arg(long, default_value_t = 8)]
        seeds: u64,
        /// First seed
        #[arg(long, default_value_t = 1)]
        seed_base: u64,
        /// Bet per paid spin
        #[arg(short, long, default_value_t = 1.0)]
        bet: f64,
        /// Worker threads (0 = rayon default)
        #[arg(short, long, default_value_t = 0)]
        threads: usize,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replay one seed spin by spin as JSON lines
    Replay {
        #[arg(long)]
        seed: u64,
        #[arg(short, long, default_value_t = 1)]
        spins: u32,
        #[arg(short, long, default_value_t = 1.0)]
        bet: f64,
        /// Buy this bonus tier before the first spin
        #[arg(long)]
        buy: Option<u8>,
    },
    /// Print bonus buy offers
    Offers {
        #[arg(short, long, default_value_t = 1.0)]
        bet: f64,
    },
    /// Print the active config
    Config {
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Yaml,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Simulate {
            spins,
            seeds,
            seed_base,
            bet,
            threads,
            json,
        } => run_simulation(config, spins, seeds, seed_base, bet, threads, json),
        Commands::Replay { seed, spins, bet, buy } => run_replay(config, seed, spins, bet, buy),
        Commands::Offers { bet } => print_offers(config, bet),
        Commands::Config { format } => print_config(&config, format),
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<GameConfig> {
    match path {
        Some(path) => {
            let config = GameConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?;
            log::info!("Loaded config '{}' from {}", config.game_id, path.display());
            Ok(config)
        }
        None => Ok(GameConfig::default()),
    }
}

fn run_simulation(
    config: GameConfig,
    spins: u64,
    seeds: u64,
    seed_base: u64,
    bet: f64,
    threads: usize,
    json: bool,
) -> Result<()> {
    if seeds == 0 {
        bail!("--seeds must be at least 1");
    }
    let game = CascadeGame::new(config).context("Invalid game config")?;

    let mut builder = rayon::ThreadPoolBuilder::new();
    if threads > 0 {
        builder = builder.num_threads(threads);
    }
    let pool = builder.build().context("Failed to build thread pool")?;

    log::info!("Simulating {spins} spins x {seeds} seeds at bet {bet}");
    let start = Instant::now();

    let reports = pool.install(|| {
        (seed_base..seed_base + seeds)
            .into_par_iter()
            .map(|seed| simulate(&game, seed, spins, bet))
            .collect::<Result<Vec<_>, _>>()
    })?;

    let report = SimulationReport::merge(reports).context("No simulation results")?;
    let elapsed = start.elapsed();

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let stats = &report.stats;
    println!("Game:            {}", game.config().game_id);
    println!("Seeds:           {:?}", report.seeds);
    println!(
        "Spins:           {} ({} paid, {} free)",
        stats.total_spins, stats.base_spins, stats.free_spins
    );
    println!("Total bet:       {:.2}", stats.total_bet);
    println!("Total win:       {:.2}", stats.total_win);
    println!("RTP:             {:.3}% (target {:.2}%)", stats.rtp(), report.target_rtp * 100.0);
    println!("Deviation:       {:+.3}%", report.deviation() * 100.0);
    println!("Hit rate:        {:.2}%", stats.hit_rate());
    println!("Cascade chains:  {} ({} cascades)", stats.cascade_chains, stats.total_cascades);
    println!("Feature rounds:  {} (won {:.2})", stats.feature_rounds, stats.feature_win);
    println!(
        "Bonuses:         {} triggered, {} completed, {} retriggers",
        stats.bonuses_triggered, stats.bonuses_completed, stats.retriggers
    );
    println!("Max win:         {:.2}x", stats.max_win_ratio);
    println!(
        "Elapsed:         {:.2}s ({:.0} spins/s)",
        elapsed.as_secs_f64(),
        stats.total_spins as f64 / elapsed.as_secs_f64().max(1e-9)
    );
    Ok(())
}

fn run_replay(config: GameConfig, seed: u64, spins: u32, bet: f64, buy: Option<u8>) -> Result<()> {
    let game = CascadeGame::new(config).context("Invalid game config")?;
    let mut state = game.new_state();
    let mut rng = SeededRandom::new(seed);

    if let Some(tier) = buy {
        let session = game.start_bonus_mode(&mut state, TierId(tier))?;
        log::info!("Bought tier {} with {} spins", session.tier, session.spins_remaining);
    }

    for _ in 0..spins {
        let result = game.spin(&mut state, &mut rng, bet)?;
        println!("{}", result.to_json()?);
    }
    log::info!("Replayed {spins} spins from seed {seed} ({} draws)", rng.draws());
    Ok(())
}

fn print_offers(config: GameConfig, bet: f64) -> Result<()> {
    let game = CascadeGame::new(config).context("Invalid game config")?;
    for offer in game.bonus_buy_offers(bet) {
        println!(
            "Tier {} {:<18} {:>3} spins  cost {:.2}",
            offer.tier, offer.name, offer.spins, offer.cost
        );
    }
    Ok(())
}

fn print_config(config: &GameConfig, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", config.to_json()?),
        Format::Yaml => print!("{}", serde_yml::to_string(config)?),
    }
    Ok(())
}
