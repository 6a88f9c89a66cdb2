//! Pairing engine - builds the next round of a tournament
//!
//! Level 2 - Phases
//!
//! Round 1 shuffles the roster and pairs neighbours. Later rounds sort the
//! roster by cumulative score (stable, so registration order breaks ties) and
//! greedily pair each player with the next unpaired player they have not met
//! yet, falling back to a repeat only when no fresh opponent is left.

use chessclub_core::{Match, PairingError, PlayerId, Round, Tournament};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use rustc_hash::FxHashSet;

use crate::standings::cumulative_scores;

/// Order-independent pairing key
type PairKey = (PlayerId, PlayerId);

// ============================================================================
// Level 1 - Entry points
// ============================================================================

/// Generate the next round of `tournament`, started now
pub fn generate_next_round<R: Rng + ?Sized>(
    tournament: &Tournament,
    rng: &mut R,
) -> Result<Round, PairingError> {
    generate_next_round_at(tournament, rng, Utc::now())
}

/// Generate the next round with an explicit start time
pub fn generate_next_round_at<R: Rng + ?Sized>(
    tournament: &Tournament,
    rng: &mut R,
    start_time: DateTime<Utc>,
) -> Result<Round, PairingError> {
    check_preconditions(tournament)?;

    let number = tournament.rounds.len() + 1;
    let pairings = if tournament.rounds.is_empty() {
        first_round_pairings(tournament, rng)
    } else {
        score_group_pairings(tournament)
    };

    let matches = pairings
        .into_iter()
        .map(|(player1, player2)| Match {
            player1,
            player2,
            score1: None,
            score2: None,
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        "Paired {} matches for round {} of '{}'",
        matches.len(),
        number,
        tournament.name
    );

    Ok(Round::new(number, matches, start_time))
}

// ============================================================================
// Level 2 - Preconditions
// ============================================================================

fn check_preconditions(tournament: &Tournament) -> Result<(), PairingError> {
    let name = || tournament.name.clone();

    if let Some(round) = tournament.open_round() {
        return Err(PairingError::RoundOpen {
            tournament: name(),
            round: round.name.clone(),
        });
    }
    if tournament.rounds.len() >= tournament.rounds_total as usize {
        return Err(PairingError::NoRoundsLeft {
            tournament: name(),
            rounds_total: tournament.rounds_total,
        });
    }

    let count = tournament.players.len();
    if count == 0 {
        return Err(PairingError::NoPlayers { tournament: name() });
    }
    if count % 2 != 0 {
        return Err(PairingError::OddPlayerCount {
            tournament: name(),
            count,
        });
    }

    let mut seen = FxHashSet::default();
    for player in &tournament.players {
        if !seen.insert(&player.id) {
            return Err(PairingError::DuplicatePlayer {
                tournament: name(),
                player: player.id.to_string(),
            });
        }
    }
    Ok(())
}

// ============================================================================
// Level 3 - Pairing steps
// ============================================================================

/// Round 1: uniform shuffle, then (p1, p2), (p3, p4), ...
fn first_round_pairings<R: Rng + ?Sized>(
    tournament: &Tournament,
    rng: &mut R,
) -> Vec<(PlayerId, PlayerId)> {
    let mut order: Vec<&PlayerId> = tournament.players.iter().map(|p| &p.id).collect();
    order.shuffle(rng);

    order
        .chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect()
}

/// Later rounds: greedy pairing down the score-sorted roster
fn score_group_pairings(tournament: &Tournament) -> Vec<(PlayerId, PlayerId)> {
    let scores = cumulative_scores(tournament);
    let history = played_pairs(tournament);

    // Stable sort keeps registration order inside equal scores
    let mut order: Vec<&PlayerId> = tournament.players.iter().map(|p| &p.id).collect();
    order.sort_by(|a, b| {
        let sa = scores.get(*a).copied().unwrap_or(0.0);
        let sb = scores.get(*b).copied().unwrap_or(0.0);
        sb.total_cmp(&sa)
    });

    let n = order.len();
    let mut paired = vec![false; n];
    let mut pairings = Vec::with_capacity(n / 2);

    for i in 0..n {
        if paired[i] {
            continue;
        }
        paired[i] = true;

        let fresh = (i + 1..n)
            .filter(|&j| !paired[j])
            .find(|&j| !history.contains(&pair_key(order[i], order[j])));

        let partner = match fresh {
            Some(j) => Some(j),
            None => {
                let fallback = (i + 1..n).find(|&j| !paired[j]);
                if let Some(j) = fallback {
                    tracing::warn!(
                        "No new opponent left for {} in '{}', repeating pairing with {}",
                        order[i],
                        tournament.name,
                        order[j]
                    );
                }
                fallback
            }
        };

        // Even headcount guarantees a partner for every unpaired player
        let Some(j) = partner else { break };
        paired[j] = true;
        pairings.push((order[i].clone(), order[j].clone()));
    }

    pairings
}

// ============================================================================
// Level 4 - Utilities
// ============================================================================

/// Every pairing already played in this tournament, order-independent
pub fn played_pairs(tournament: &Tournament) -> FxHashSet<PairKey> {
    tournament
        .rounds
        .iter()
        .flat_map(|r| r.matches.iter())
        .map(Match::pairing_key)
        .collect()
}

fn pair_key(a: &PlayerId, b: &PlayerId) -> PairKey {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}
