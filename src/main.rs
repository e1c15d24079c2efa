//! Storm Arena headless host
//!
//! Plays one round at 60 Hz simulated time with a simple autopilot standing
//! in for the human, then books the result into the saved progression.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec2;
use storm_arena::consts::TICK_MS;
use storm_arena::persistence::{JsonFileStore, ProgressStore};
use storm_arena::sim::{RoundOutcome, TickInput, World, can_detect, tick};
use storm_arena::{SimConfig, UpgradeKind};

/// Ten simulated minutes
const DEFAULT_MAX_TICKS: u64 = 60 * 60 * 10;
const DEFAULT_SAVE_PATH: &str = "storm-arena-progress.json";

#[derive(Parser, Debug)]
#[command(author, version, about = "Storm Arena headless round", long_about = None)]
struct Cli {
    /// Map seed, taken from the clock when absent
    #[arg(long)]
    seed: Option<u64>,

    /// Progression record to load and update
    #[arg(long, default_value = DEFAULT_SAVE_PATH)]
    save: PathBuf,

    /// JSON balance overrides
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop an undecided round after this many ticks
    #[arg(long, default_value_t = DEFAULT_MAX_TICKS)]
    max_ticks: u64,

    /// Upgrade to buy before the round, repeatable
    #[arg(long, value_enum)]
    buy: Vec<UpgradeKind>,
}

fn load_config(path: Option<&Path>) -> Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    SimConfig::from_json(&json).with_context(|| format!("parsing config {}", path.display()))
}

/// Stand-in for a human: stay in the zone, shoot the nearest visible bot
fn autopilot(world: &World) -> TickInput {
    let me = &world.player.body;

    let target = world
        .bots
        .iter()
        .map(|b| &b.body)
        .filter(|b| b.is_alive())
        .filter(|b| can_detect(me.pos, b.pos, &world.bushes, world.config.reveal_distance))
        .min_by(|a, b| a.pos.distance(me.pos).total_cmp(&b.pos.distance(me.pos)));

    let intent = if world.storm.is_outside(me.pos) {
        world.storm.center - me.pos
    } else if let Some(bot) = target {
        let offset = bot.pos - me.pos;
        if offset.length() > world.config.bot.ideal_combat_distance {
            offset
        } else {
            offset.perp()
        }
    } else {
        Vec2::ZERO
    };

    TickInput {
        intent,
        aim: target.map(|b| b.pos),
        fire: target.is_some_and(|b| b.pos.distance(me.pos) < world.config.bot.detection_range),
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let mut store = JsonFileStore::new(&cli.save);
    let mut progress = store.load_or_default();

    for kind in &cli.buy {
        match progress.buy(*kind) {
            Ok(level) => println!("Bought {} upgrade, now level {level}", kind.as_str()),
            Err(e) => println!("Could not buy {} upgrade: {e}", kind.as_str()),
        }
    }

    let seed = cli.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos() as u64)
    });
    let reward = config.victory_reward;
    let mut world = World::new(config, &progress.loadout(), seed);
    log::info!("Round starting with seed {seed}");

    let mut outcome = RoundOutcome::Ongoing;
    while !outcome.is_over() && world.tick_count < cli.max_ticks {
        let input = autopilot(&world);
        outcome = tick(&mut world, &input, TICK_MS);
    }

    match outcome {
        RoundOutcome::Victory => println!("Victory! +{reward} coins"),
        RoundOutcome::Defeat => println!(
            "Defeat with {} of {} bots left",
            world.alive_bots(),
            world.bots.len()
        ),
        RoundOutcome::Ongoing => {
            log::warn!("Round stopped at the {} tick cap", cli.max_ticks);
            println!("Round unfinished, nothing recorded");
        }
    }

    if outcome.is_over() {
        progress.record_round(outcome == RoundOutcome::Victory, reward);
    }
    store
        .save(&progress)
        .with_context(|| format!("saving progress to {}", cli.save.display()))?;
    println!(
        "Coins: {}  Games: {}  Deaths: {}",
        progress.coins, progress.games_played, progress.deaths
    );
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<()> {
    env_logger::init();
    run(Cli::parse())
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The simulation is driven by an embedding host on the web
}
