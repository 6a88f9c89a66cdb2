//! Standings - ranked players by cumulative score
//!
//! Level 3 - Steps

use chessclub_core::{Player, PlayerId, Score, Tournament};
use rustc_hash::FxHashMap;

/// Standing of a player in the tournament
#[derive(Clone, Debug, PartialEq)]
pub struct Standing {
    /// 1-based position in the ranking
    pub rank: usize,
    /// Roster snapshot of the player
    pub player: Player,
    /// Cumulative score (wins + 0.5 * draws)
    pub score: f64,
    /// Scored games won
    pub wins: u32,
    /// Scored games drawn
    pub draws: u32,
    /// Scored games lost
    pub losses: u32,
}

impl Standing {
    /// Games with a recorded result
    pub fn games_played(&self) -> u32 {
        self.wins + self.draws + self.losses
    }

    /// Win rate
    pub fn win_rate(&self) -> f64 {
        let games = self.games_played();
        if games == 0 {
            0.0
        } else {
            self.wins as f64 / games as f64
        }
    }
}

/// Cumulative score of every roster player over all rounds, open or closed.
///
/// Players without a recorded result yet score 0.
pub fn cumulative_scores(tournament: &Tournament) -> FxHashMap<PlayerId, f64> {
    let mut scores: FxHashMap<PlayerId, f64> = tournament
        .players
        .iter()
        .map(|p| (p.id.clone(), 0.0))
        .collect();

    for game in tournament.rounds.iter().flat_map(|r| r.matches.iter()) {
        for (id, score) in [(&game.player1, game.score1), (&game.player2, game.score2)] {
            if let (Some(total), Some(score)) = (scores.get_mut(id), score) {
                *total += score.points();
            }
        }
    }
    scores
}

/// Rank the roster: score descending, ties by ascending player id.
///
/// Pure and callable at any point of the tournament, including mid-round.
pub fn compute_standings(tournament: &Tournament) -> Vec<Standing> {
    let mut records: FxHashMap<&PlayerId, (u32, u32, u32)> = FxHashMap::default();
    for game in tournament.rounds.iter().flat_map(|r| r.matches.iter()) {
        for (id, score) in [(&game.player1, game.score1), (&game.player2, game.score2)] {
            let record = records.entry(id).or_default();
            match score {
                Some(Score::Win) => record.0 += 1,
                Some(Score::Draw) => record.1 += 1,
                Some(Score::Loss) => record.2 += 1,
                None => {}
            }
        }
    }

    let scores = cumulative_scores(tournament);
    let mut standings: Vec<Standing> = tournament
        .players
        .iter()
        .map(|player| {
            let (wins, draws, losses) = records.get(&player.id).copied().unwrap_or_default();
            Standing {
                rank: 0,
                player: player.clone(),
                score: scores.get(&player.id).copied().unwrap_or(0.0),
                wins,
                draws,
                losses,
            }
        })
        .collect();

    standings.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.player.id.cmp(&b.player.id))
    });
    for (i, standing) in standings.iter_mut().enumerate() {
        standing.rank = i + 1;
    }
    standings
}
