//! Tournament command - details, roster, rounds and standings
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - dispatch
//! - Level 2: one function per subcommand
//! - Level 3: print_round(), print_standings()
//! - Level 4: formatting utilities

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use chessclub_core::{Match, Outcome, PlayerId, Round, Store, Tournament, TournamentEdit};
use chessclub_tournament::{Club, Standing};

use crate::export::{export_tournament, ExportFormat};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct TournamentArgs {
    #[command(subcommand)]
    pub command: TournamentCommand,
}

#[derive(Subcommand)]
pub enum TournamentCommand {
    /// Create a tournament
    Create {
        name: String,

        #[arg(long)]
        location: String,

        /// DD/MM/YYYY or YYYY-MM-DD
        #[arg(long, value_name = "DATE")]
        start: String,

        /// Defaults to the start date
        #[arg(long, value_name = "DATE")]
        end: Option<String>,

        #[arg(long, default_value = "")]
        description: String,

        /// Number of rounds (defaults to the club setting)
        #[arg(long)]
        rounds: Option<u32>,
    },

    /// List tournaments with their status
    List,

    /// Show details, roster and every round
    Show {
        name: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change tournament details
    Edit {
        name: String,

        #[arg(long)]
        location: Option<String>,

        #[arg(long, value_name = "DATE")]
        start: Option<String>,

        #[arg(long, value_name = "DATE")]
        end: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        rounds: Option<u32>,
    },

    /// Delete a tournament
    Delete { name: String },

    /// Register registry players before the first round
    Register {
        name: String,

        #[arg(required = true, value_name = "ID")]
        players: Vec<String>,
    },

    /// Remove a player from the roster before the first round
    Unregister { name: String, player: String },

    /// Pair and open round 1
    Start { name: String },

    /// Record a result in the open round
    Score {
        name: String,

        /// Match number as listed by `show` (1-based)
        #[arg(value_name = "MATCH")]
        match_number: usize,

        /// 1-0, 0-1 or 0.5-0.5
        result: String,
    },

    /// Close the open round once every match is scored
    Close { name: String },

    /// Pair and open the next round
    Next { name: String },

    /// Ranked players by cumulative score
    Standings {
        name: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export details, standings and rounds to CSV or HTML files
    Export {
        name: String,

        #[arg(long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Parent directory of the export
        #[arg(long, value_name = "DIR", default_value = "exports")]
        out: PathBuf,
    },
}

// ============================================================================
// LEVEL 1: ORCHESTRATION
// ============================================================================

pub fn run<S: Store>(args: TournamentArgs, club: &mut Club<S>) -> Result<()> {
    match args.command {
        TournamentCommand::Create {
            name,
            location,
            start,
            end,
            description,
            rounds,
        } => {
            let end = end.unwrap_or_else(|| start.clone());
            let rounds = rounds.unwrap_or(club.config().default_rounds);
            let tournament = Tournament::new(&name, &location, &start, &end, &description, rounds)?;
            create(club, tournament)
        }
        TournamentCommand::List => list(club),
        TournamentCommand::Show { name, json } => show(club, &name, json),
        TournamentCommand::Edit {
            name,
            location,
            start,
            end,
            description,
            rounds,
        } => {
            let edit = TournamentEdit {
                location,
                start_date: start,
                end_date: end,
                description,
                rounds_total: rounds,
            };
            edit_details(club, &name, &edit)
        }
        TournamentCommand::Delete { name } => {
            club.delete_tournament(&name)
                .with_context(|| format!("Failed to delete tournament '{name}'"))?;
            println!("Deleted tournament '{name}'");
            Ok(())
        }
        TournamentCommand::Register { name, players } => register(club, &name, &players),
        TournamentCommand::Unregister { name, player } => {
            let removed = club
                .unregister_player(&name, &player)
                .with_context(|| format!("Failed to unregister {player} from '{name}'"))?;
            println!("Removed {} from '{name}'", removed.full_name());
            Ok(())
        }
        TournamentCommand::Start { name } => start(club, &name),
        TournamentCommand::Score {
            name,
            match_number,
            result,
        } => score(club, &name, match_number, &result),
        TournamentCommand::Close { name } => close(club, &name),
        TournamentCommand::Next { name } => next(club, &name),
        TournamentCommand::Standings { name, json } => standings(club, &name, json),
        TournamentCommand::Export { name, format, out } => export(club, &name, format, &out),
    }
}

// ============================================================================
// LEVEL 2: PHASES
// ============================================================================

fn create<S: Store>(club: &mut Club<S>, tournament: Tournament) -> Result<()> {
    let name = tournament.name.clone();
    club.create_tournament(tournament)
        .with_context(|| format!("Failed to create tournament '{name}'"))?;
    println!("Created tournament '{name}'");
    Ok(())
}

fn list<S: Store>(club: &Club<S>) -> Result<()> {
    let tournaments = club.tournaments().context("Failed to load tournaments")?;
    if tournaments.is_empty() {
        println!("No tournaments");
        return Ok(());
    }
    for t in &tournaments {
        println!(
            "{:<30} {:<16} {}  {} players  {}",
            t.name,
            t.location,
            t.start_date.format("%d/%m/%Y"),
            t.players.len(),
            t.status()
        );
    }
    Ok(())
}

fn show<S: Store>(club: &Club<S>, name: &str, json: bool) -> Result<()> {
    let t = club
        .tournament(name)
        .with_context(|| format!("Failed to load tournament '{name}'"))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&t)?);
        return Ok(());
    }

    println!("\n=== {} ===", t.name);
    println!("Location:    {}", t.location);
    println!(
        "Dates:       {} - {}",
        t.start_date.format("%d/%m/%Y"),
        t.end_date.format("%d/%m/%Y")
    );
    if !t.description.is_empty() {
        println!("Description: {}", t.description);
    }
    println!("Rounds:      {}/{}", t.rounds.len(), t.rounds_total);
    println!("Status:      {}", t.status());

    println!("\nPlayers ({}):", t.players.len());
    for player in &t.players {
        println!("  {} {}", player.id, player.full_name());
    }
    for round in &t.rounds {
        print_round(&t, round);
    }
    Ok(())
}

fn edit_details<S: Store>(club: &mut Club<S>, name: &str, edit: &TournamentEdit) -> Result<()> {
    let t = club
        .edit_tournament(name, edit)
        .with_context(|| format!("Failed to edit tournament '{name}'"))?;
    println!("Updated tournament '{}'", t.name);
    Ok(())
}

fn register<S: Store>(club: &mut Club<S>, name: &str, players: &[String]) -> Result<()> {
    let t = club
        .register_players(name, players)
        .with_context(|| format!("Failed to register players in '{name}'"))?;
    println!("'{}' now has {} players", t.name, t.players.len());
    Ok(())
}

fn start<S: Store>(club: &mut Club<S>, name: &str) -> Result<()> {
    let round = club
        .start_tournament(name)
        .with_context(|| format!("Failed to start tournament '{name}'"))?;
    let t = club.tournament(name)?;
    print_round(&t, &round);
    Ok(())
}

fn score<S: Store>(
    club: &mut Club<S>,
    name: &str,
    match_number: usize,
    result: &str,
) -> Result<()> {
    let outcome: Outcome = result.parse()?;
    let (score1, score2) = outcome.scores();
    let index = match_number
        .checked_sub(1)
        .context("Match numbers start at 1")?;
    let round = club
        .enter_score(name, index, score1, score2)
        .with_context(|| format!("Failed to record match {match_number} of '{name}'"))?;

    let pending = round.unscored_matches().len();
    println!("Recorded match {match_number}: {score1}-{score2}");
    if pending == 0 {
        println!("All matches of {} are scored", round.name);
    } else {
        println!("{pending} match(es) still to play");
    }
    Ok(())
}

fn close<S: Store>(club: &mut Club<S>, name: &str) -> Result<()> {
    let status = club
        .close_round(name)
        .with_context(|| format!("Failed to close round of '{name}'"))?;
    println!("'{name}': {status}");
    Ok(())
}

fn next<S: Store>(club: &mut Club<S>, name: &str) -> Result<()> {
    let round = club
        .advance_round(name)
        .with_context(|| format!("Failed to open next round of '{name}'"))?;
    let t = club.tournament(name)?;
    print_round(&t, &round);
    Ok(())
}

fn standings<S: Store>(club: &Club<S>, name: &str, json: bool) -> Result<()> {
    let standings = club
        .standings(name)
        .with_context(|| format!("Failed to compute standings of '{name}'"))?;
    if json {
        print_json_standings(&standings)
    } else {
        print_standings(name, &standings);
        Ok(())
    }
}

fn export<S: Store>(
    club: &Club<S>,
    name: &str,
    format: ExportFormat,
    out: &Path,
) -> Result<()> {
    let t = club
        .tournament(name)
        .with_context(|| format!("Failed to load tournament '{name}'"))?;
    let dir = export_tournament(&t, format, out)
        .with_context(|| format!("Failed to export tournament '{name}'"))?;
    println!("Exported '{}' to {}", t.name, dir.display());
    Ok(())
}

// ============================================================================
// LEVEL 3: REPORTS
// ============================================================================

fn print_round(t: &Tournament, round: &Round) {
    let state = if round.is_open() { "open" } else { "closed" };
    println!("\n{} ({state})", round.name);
    for (i, game) in round.matches.iter().enumerate() {
        println!(
            "  {:>2}. {:<28} vs {:<28} {}",
            i + 1,
            display_name(t, &game.player1),
            display_name(t, &game.player2),
            format_result(game)
        );
    }
}

fn print_standings(name: &str, standings: &[Standing]) {
    println!("\n=== Standings: {name} ===");
    println!(
        "{:>4}  {:<8} {:<20} {:<20} {:>5}  {:>3} {:>3} {:>3}",
        "Rank", "ID", "Last name", "First name", "Score", "W", "D", "L"
    );
    for s in standings {
        println!(
            "{:>4}  {:<8} {:<20} {:<20} {:>5.1}  {:>3} {:>3} {:>3}",
            s.rank,
            s.player.id.as_str(),
            s.player.last_name,
            s.player.first_name,
            s.score,
            s.wins,
            s.draws,
            s.losses
        );
    }
}

fn print_json_standings(standings: &[Standing]) -> Result<()> {
    #[derive(serde::Serialize)]
    struct JsonStanding<'a> {
        rank: usize,
        id: &'a str,
        last_name: &'a str,
        first_name: &'a str,
        score: f64,
        wins: u32,
        draws: u32,
        losses: u32,
    }

    let output: Vec<JsonStanding> = standings
        .iter()
        .map(|s| JsonStanding {
            rank: s.rank,
            id: s.player.id.as_str(),
            last_name: &s.player.last_name,
            first_name: &s.player.first_name,
            score: s.score,
            wins: s.wins,
            draws: s.draws,
            losses: s.losses,
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

// ============================================================================
// LEVEL 4: FORMATTING
// ============================================================================

fn display_name(t: &Tournament, id: &PlayerId) -> String {
    match t.player(id) {
        Some(player) => format!("{} ({})", player.full_name(), id),
        None => id.to_string(),
    }
}

fn format_result(game: &Match) -> String {
    match (game.score1, game.score2) {
        (Some(s1), Some(s2)) => format!("{s1}-{s2}"),
        _ => "pending".to_string(),
    }
}
