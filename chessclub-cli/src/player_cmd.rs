//! Player command - manage the club's player registry
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - dispatch
//! - Level 2: add(), list(), edit(), delete()
//! - Level 4: formatting utilities

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};

use chessclub_core::{Player, PlayerEdit, Store};
use chessclub_tournament::Club;

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct PlayerArgs {
    #[command(subcommand)]
    pub command: PlayerCommand,
}

#[derive(Subcommand)]
pub enum PlayerCommand {
    /// Add a player to the registry
    Add {
        /// National id, two capital letters and five digits (AB12345)
        id: String,

        #[arg(long)]
        last_name: String,

        #[arg(long)]
        first_name: String,

        /// DD/MM/YYYY or YYYY-MM-DD
        #[arg(long, value_name = "DATE")]
        birth_date: String,
    },

    /// List registry players by name
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Edit a player; changes reach every tournament roster
    Edit {
        id: String,

        #[arg(long, value_name = "ID")]
        new_id: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long, value_name = "DATE")]
        birth_date: Option<String>,
    },

    /// Delete a player without recorded results
    Delete { id: String },
}

// ============================================================================
// LEVEL 1: ORCHESTRATION
// ============================================================================

pub fn run<S: Store>(args: PlayerArgs, club: &mut Club<S>) -> Result<()> {
    match args.command {
        PlayerCommand::Add {
            id,
            last_name,
            first_name,
            birth_date,
        } => add(club, &id, &last_name, &first_name, &birth_date),
        PlayerCommand::List { json } => list(club, json),
        PlayerCommand::Edit {
            id,
            new_id,
            last_name,
            first_name,
            birth_date,
        } => {
            let edit = PlayerEdit {
                id: new_id,
                last_name,
                first_name,
                birth_date,
            };
            edit_player(club, &id, &edit)
        }
        PlayerCommand::Delete { id } => delete(club, &id),
    }
}

// ============================================================================
// LEVEL 2: PHASES
// ============================================================================

fn add<S: Store>(
    club: &mut Club<S>,
    id: &str,
    last_name: &str,
    first_name: &str,
    birth_date: &str,
) -> Result<()> {
    let player = Player::new(id, last_name, first_name, birth_date)?;
    let line = format_player(&player);
    club.add_player(player)
        .with_context(|| format!("Failed to add player {id}"))?;
    println!("Added {line}");
    Ok(())
}

fn list<S: Store>(club: &Club<S>, json: bool) -> Result<()> {
    let players = club.players().context("Failed to load players")?;
    if json {
        println!("{}", serde_json::to_string_pretty(&players)?);
        return Ok(());
    }

    if players.is_empty() {
        println!("No players registered");
        return Ok(());
    }
    println!("{:<8} {:<20} {:<20} {}", "ID", "Last name", "First name", "Born");
    for player in &players {
        println!("{}", format_player(player));
    }
    Ok(())
}

fn edit_player<S: Store>(club: &mut Club<S>, id: &str, edit: &PlayerEdit) -> Result<()> {
    if edit.is_empty() {
        bail!("Nothing to change for player {id}");
    }
    let (player, synced) = club
        .edit_player(id, edit)
        .with_context(|| format!("Failed to edit player {id}"))?;
    println!("Updated {}", format_player(&player));
    if synced > 0 {
        println!("Synced into {synced} tournament(s)");
    }
    Ok(())
}

fn delete<S: Store>(club: &mut Club<S>, id: &str) -> Result<()> {
    let removed = club
        .delete_player(id)
        .with_context(|| format!("Failed to delete player {id}"))?;
    println!("Deleted player {id}");
    if removed > 0 {
        println!("Removed from {removed} roster(s)");
    }
    Ok(())
}

// ============================================================================
// LEVEL 4: FORMATTING
// ============================================================================

fn format_player(player: &Player) -> String {
    format!(
        "{:<8} {:<20} {:<20} {}",
        player.id.as_str(),
        player.last_name,
        player.first_name,
        player.birth_date.format("%d/%m/%Y")
    )
}
