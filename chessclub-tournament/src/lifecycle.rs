//! Round lifecycle - start, score entry, closing and advancing rounds
//!
//! Level 1 - Orchestration
//!
//! ```text
//! NotStarted --start--> RoundOpen(1) --close--> RoundClosed(1) --advance--> RoundOpen(2) ...
//!                                                RoundClosed(n == total) == Finished
//! ```
//!
//! Every transition is guarded; a failed guard leaves the tournament untouched.

use chessclub_core::{ClubError, Result, Round, Tournament, TournamentStatus};
use chrono::{DateTime, Utc};
use rand::Rng;

use crate::pairing::generate_next_round_at;

fn context(tournament: &Tournament) -> String {
    format!("tournament '{}'", tournament.name)
}

/// NotStarted -> RoundOpen(1)
pub fn start_tournament<'t, R: Rng + ?Sized>(
    tournament: &'t mut Tournament,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<&'t Round> {
    let status = tournament.status();
    if status != TournamentStatus::NotStarted {
        return Err(ClubError::state(
            context(tournament),
            format!("already started ({status})"),
        ));
    }
    open_next_round(tournament, rng, now)
}

/// Record a result in the open round; `match_index` is 0-based
pub fn enter_score(
    tournament: &mut Tournament,
    match_index: usize,
    score1: f64,
    score2: f64,
) -> Result<()> {
    let status = tournament.status();
    let TournamentStatus::RoundOpen(_) = status else {
        return Err(ClubError::state(
            context(tournament),
            format!("no round is open ({status})"),
        ));
    };
    let ctx = context(tournament);
    let round = tournament
        .current_round_mut()
        .ok_or_else(|| ClubError::state(ctx, "no round is open"))?;
    round.enter_score(match_index, score1, score2)?;
    tracing::debug!(
        "{}: match {} scored {}-{}",
        round.name,
        match_index + 1,
        score1,
        score2
    );
    Ok(())
}

/// RoundOpen(n) -> RoundClosed(n) or Finished; every match must be scored
pub fn close_round(tournament: &mut Tournament, now: DateTime<Utc>) -> Result<()> {
    let status = tournament.status();
    let TournamentStatus::RoundOpen(_) = status else {
        return Err(ClubError::state(
            context(tournament),
            format!("no round is open ({status})"),
        ));
    };
    let ctx = context(tournament);
    let round = tournament
        .current_round_mut()
        .ok_or_else(|| ClubError::state(ctx, "no round is open"))?;
    round.close(now)?;
    let round_name = round.name.clone();
    tracing::info!("Closed {} of '{}'", round_name, tournament.name);

    if tournament.status() == TournamentStatus::Finished {
        tracing::info!("Tournament '{}' finished", tournament.name);
    }
    Ok(())
}

/// RoundClosed(n) -> RoundOpen(n + 1).
///
/// A finished tournament yields the pairing engine's "no rounds left" error.
pub fn advance_round<'t, R: Rng + ?Sized>(
    tournament: &'t mut Tournament,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<&'t Round> {
    match tournament.status() {
        TournamentStatus::NotStarted => Err(ClubError::state(
            context(tournament),
            "not started yet, start it first",
        )),
        TournamentStatus::RoundOpen(n) => Err(ClubError::state(
            context(tournament),
            format!("round {n} must be closed first"),
        )),
        TournamentStatus::RoundClosed(_) | TournamentStatus::Finished => {
            open_next_round(tournament, rng, now)
        }
    }
}

fn open_next_round<'t, R: Rng + ?Sized>(
    tournament: &'t mut Tournament,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<&'t Round> {
    let round = generate_next_round_at(tournament, rng, now)?;
    tracing::info!(
        "Opened {} of '{}' with {} matches",
        round.name,
        tournament.name,
        round.matches.len()
    );
    tournament.rounds.push(round);
    tournament
        .current_round()
        .ok_or_else(|| ClubError::state(context(tournament), "round was not recorded"))
}
