//! Chess Club CLI - Command-line interface
//!
//! Commands:
//! - player: Manage the player registry
//! - tournament: Create tournaments, run rounds, print and export reports

mod export;
mod player_cmd;
mod tournament_cmd;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use chessclub_core::JsonStore;
use chessclub_tournament::{Club, ClubConfig};

use player_cmd::PlayerArgs;
use tournament_cmd::TournamentArgs;

#[derive(Parser)]
#[command(name = "chessclub")]
#[command(about = "Chess club tournament manager")]
struct Cli {
    /// Directory holding players.json and tournaments/
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Random seed for pairings
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage players
    Player(PlayerArgs),
    /// Manage tournaments and their rounds
    Tournament(TournamentArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = ClubConfig::default();
    if let Some(dir) = cli.data_dir {
        config = config.with_data_dir(dir);
    }
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    tracing::debug!("Data directory: {}", config.data_dir.display());
    let store = JsonStore::new(config.data_dir.clone());
    let mut club = Club::new(store, config);

    match cli.command {
        Commands::Player(args) => player_cmd::run(args, &mut club),
        Commands::Tournament(args) => tournament_cmd::run(args, &mut club),
    }
}
