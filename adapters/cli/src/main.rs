#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a Path Defence stage headlessly.

mod build_order;

use std::{path::PathBuf, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use path_defence_config::{load_game, load_stage};
use path_defence_core::{CellCoord, Currency, Event, SpawnOrder};
use path_defence_session::{EventSink, Session};
use path_defence_world::Outcome;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use build_order::{parse_cell, PlacementOrder};

/// Runs a stage without a window and prints a summary.
#[derive(Debug, Parser)]
#[command(name = "path-defence", version)]
struct Cli {
    /// Game document with settings, enemies and towers.
    #[arg(long, default_value = "assets/game.toml")]
    game: PathBuf,
    /// Stage document with the grid, walk path and waves.
    #[arg(long, default_value = "assets/stages/meadow.toml")]
    stage: PathBuf,
    /// Maximum number of ticks to simulate.
    #[arg(long, default_value_t = 6_000)]
    ticks: u64,
    /// Length of one tick in milliseconds.
    #[arg(long, default_value_t = 16)]
    dt_ms: u64,
    /// Tower to purchase before the first wave, as `kind@x,y`.
    #[arg(long = "place", value_name = "KIND@X,Y")]
    placements: Vec<PlacementOrder>,
    /// Cell whose tower is upgraded once placements are processed.
    #[arg(long = "upgrade", value_name = "X,Y", value_parser = parse_cell)]
    upgrades: Vec<CellCoord>,
    /// Pops spawn queues in a random order driven by this seed.
    #[arg(long, value_name = "SEED")]
    spawn_seed: Option<u64>,
}

/// Logs notifications and keeps the counters printed in the summary.
#[derive(Debug, Default)]
struct Tally {
    kills: u32,
    leaks: u32,
    rejected: u32,
    waves_completed: u32,
}

impl EventSink for Tally {
    fn notify(&mut self, event: &Event) {
        match event {
            Event::EnemyKilled { kind, reward, .. } => {
                self.kills += 1;
                debug!(%kind, reward, "enemy killed");
            }
            Event::EnemyReachedEnd { kind, damage, .. } => {
                self.leaks += 1;
                info!(%kind, damage, "enemy reached the end of the path");
            }
            Event::WaveCompleted { wave } => {
                self.waves_completed += 1;
                info!(wave = wave.get(), "wave cleared");
            }
            Event::TowerPlacementRejected { kind, cell, reason } => {
                self.rejected += 1;
                warn!(%kind, ?cell, %reason, "placement rejected");
            }
            Event::TowerUpgradeRejected { cell, reason } => {
                self.rejected += 1;
                warn!(?cell, %reason, "upgrade rejected");
            }
            Event::PlayerGameOver => info!("game over"),
            Event::Victory => info!("victory"),
            _ => {}
        }
    }
}

/// Entry point for the Path Defence command-line interface.
fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    ensure!(cli.dt_ms > 0, "--dt-ms must be positive");

    let mut game = load_game(&cli.game)
        .with_context(|| format!("failed to load game document {}", cli.game.display()))?;
    if let Some(seed) = cli.spawn_seed {
        game.settings.spawn_order = SpawnOrder::Random { seed };
    }
    let stage = load_stage(&cli.stage)
        .with_context(|| format!("failed to load stage document {}", cli.stage.display()))?;
    let stage_name = stage.name.clone();

    let mut session = Session::new(game, stage);
    for order in cli.placements {
        session.request_placement(order.kind, order.cell);
    }
    for cell in cli.upgrades {
        session.request_upgrade(cell);
    }

    let dt = Duration::from_millis(cli.dt_ms);
    let mut tally = Tally::default();
    let mut outcome = session.outcome();
    while session.ticks() < cli.ticks && !outcome.is_finished() {
        outcome = session.tick(dt, &mut tally);
    }

    let elapsed = dt.saturating_mul(u32::try_from(session.ticks()).unwrap_or(u32::MAX));
    println!("stage: {stage_name}");
    println!(
        "outcome: {}",
        match outcome {
            Outcome::InProgress => "in progress",
            Outcome::Victory => "victory",
            Outcome::GameOver => "game over",
        }
    );
    println!(
        "ticks: {} ({:.1}s simulated)",
        session.ticks(),
        elapsed.as_secs_f64()
    );
    println!(
        "wave: {}",
        session
            .current_wave()
            .map_or_else(|| "none".to_owned(), |wave| wave.get().to_string())
    );
    println!("waves cleared: {}", tally.waves_completed);
    println!("player health: {}", session.player_health());
    println!("gold: {}", session.balance(&Currency::gold()));
    println!("towers: {}", session.towers().iter().count());
    println!("kills: {}, leaks: {}", tally.kills, tally.leaks);
    if tally.rejected > 0 {
        println!("rejected build requests: {}", tally.rejected);
    }

    Ok(())
}
