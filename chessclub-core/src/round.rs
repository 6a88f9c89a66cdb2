//! Rounds, matches and the scores recorded in them

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ClubError, Result};
use crate::player::PlayerId;

// ============================================================================
// SCORES
// ============================================================================

/// Points earned by one side of a match
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum Score {
    Loss,
    Draw,
    Win,
}

impl Score {
    pub fn points(self) -> f64 {
        match self {
            Score::Loss => 0.0,
            Score::Draw => 0.5,
            Score::Win => 1.0,
        }
    }
}

impl TryFrom<f64> for Score {
    type Error = ClubError;

    fn try_from(value: f64) -> Result<Self> {
        if value == 0.0 {
            Ok(Score::Loss)
        } else if value == 0.5 {
            Ok(Score::Draw)
        } else if value == 1.0 {
            Ok(Score::Win)
        } else {
            Err(ClubError::validation(
                "score",
                format!("{value} is not one of 0, 0.5, 1"),
            ))
        }
    }
}

impl From<Score> for f64 {
    fn from(score: Score) -> Self {
        score.points()
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.points())
    }
}

/// Validate a pair of scores: each in {0, 0.5, 1} and summing to 1
pub fn validate_result(score1: f64, score2: f64) -> Result<(Score, Score)> {
    let s1 = Score::try_from(score1)?;
    let s2 = Score::try_from(score2)?;
    if s1.points() + s2.points() != 1.0 {
        return Err(ClubError::validation(
            "score",
            format!("{score1} + {score2} must add up to 1"),
        ));
    }
    Ok((s1, s2))
}

/// Result of a match as typed by an operator ("1-0", "0-1", "0.5-0.5", "½-½", "1/2-1/2")
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Player1Wins,
    Player2Wins,
    Draw,
}

impl Outcome {
    /// (score1, score2) in points
    pub fn scores(self) -> (f64, f64) {
        match self {
            Outcome::Player1Wins => (1.0, 0.0),
            Outcome::Player2Wins => (0.0, 1.0),
            Outcome::Draw => (0.5, 0.5),
        }
    }
}

impl FromStr for Outcome {
    type Err = ClubError;

    fn from_str(s: &str) -> Result<Self> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        match compact.as_str() {
            "1-0" => Ok(Outcome::Player1Wins),
            "0-1" => Ok(Outcome::Player2Wins),
            "0.5-0.5" | "½-½" | "1/2-1/2" => Ok(Outcome::Draw),
            _ => Err(ClubError::validation(
                "result",
                format!("'{s}' is not one of 1-0, 0-1, 0.5-0.5, ½-½, 1/2-1/2"),
            )),
        }
    }
}

// ============================================================================
// MATCH
// ============================================================================

/// A single game between two players within a round
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    #[serde(rename = "player1Id")]
    pub player1: PlayerId,
    #[serde(rename = "player2Id")]
    pub player2: PlayerId,
    pub score1: Option<Score>,
    pub score2: Option<Score>,
}

impl Match {
    /// Pair two distinct players, scores unset
    pub fn new(player1: PlayerId, player2: PlayerId) -> Result<Self> {
        if player1 == player2 {
            return Err(ClubError::validation(
                "match players",
                format!("{player1} cannot be paired with themselves"),
            ));
        }
        Ok(Self {
            player1,
            player2,
            score1: None,
            score2: None,
        })
    }

    /// Both scores recorded
    pub fn is_scored(&self) -> bool {
        self.score1.is_some() && self.score2.is_some()
    }

    /// At least one score recorded
    pub fn has_any_score(&self) -> bool {
        self.score1.is_some() || self.score2.is_some()
    }

    pub fn involves(&self, id: &PlayerId) -> bool {
        self.player1 == *id || self.player2 == *id
    }

    pub fn opponent_of(&self, id: &PlayerId) -> Option<&PlayerId> {
        if self.player1 == *id {
            Some(&self.player2)
        } else if self.player2 == *id {
            Some(&self.player1)
        } else {
            None
        }
    }

    /// Recorded score of `id` in this match, if any
    pub fn score_for(&self, id: &PlayerId) -> Option<Score> {
        if self.player1 == *id {
            self.score1
        } else if self.player2 == *id {
            self.score2
        } else {
            None
        }
    }

    /// Order-independent key identifying the pairing
    pub fn pairing_key(&self) -> (PlayerId, PlayerId) {
        if self.player1 <= self.player2 {
            (self.player1.clone(), self.player2.clone())
        } else {
            (self.player2.clone(), self.player1.clone())
        }
    }

    fn record(&mut self, score1: f64, score2: f64) -> Result<()> {
        let (s1, s2) = validate_result(score1, score2)?;
        self.score1 = Some(s1);
        self.score2 = Some(s2);
        Ok(())
    }
}

// ============================================================================
// ROUND
// ============================================================================

/// One cycle of pairings and score entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub name: String,
    pub start_time: DateTime<Utc>,
    /// Absent while the round is open
    pub end_time: Option<DateTime<Utc>>,
    pub matches: Vec<Match>,
}

impl Round {
    /// Open round number `number` (1-based) with the given pairings
    pub fn new(number: usize, matches: Vec<Match>, start_time: DateTime<Utc>) -> Self {
        Self {
            name: format!("Round {number}"),
            start_time,
            end_time: None,
            matches,
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Every match has both scores
    pub fn is_complete(&self) -> bool {
        self.matches.iter().all(Match::is_scored)
    }

    pub fn involves(&self, id: &PlayerId) -> bool {
        self.matches.iter().any(|m| m.involves(id))
    }

    /// 0-based indices of matches still waiting for a result
    pub fn unscored_matches(&self) -> Vec<usize> {
        self.matches
            .iter()
            .enumerate()
            .filter(|(_, m)| !m.is_scored())
            .map(|(i, _)| i)
            .collect()
    }

    /// Record the result of match `match_index` (0-based)
    pub fn enter_score(&mut self, match_index: usize, score1: f64, score2: f64) -> Result<()> {
        if !self.is_open() {
            return Err(ClubError::state(&self.name, "round is closed"));
        }
        let match_count = self.matches.len();
        let name = &self.name;
        let game = self.matches.get_mut(match_index).ok_or_else(|| {
            ClubError::validation(
                "match",
                format!("{name} has no match {} ({match_count} matches)", match_index + 1),
            )
        })?;
        if game.is_scored() {
            return Err(ClubError::state(
                format!("{name}, match {}", match_index + 1),
                "scores already recorded",
            ));
        }
        game.record(score1, score2)
    }

    /// Close the round at `now`; every match must be scored
    pub fn close(&mut self, now: DateTime<Utc>) -> Result<()> {
        if !self.is_open() {
            return Err(ClubError::state(&self.name, "round is already closed"));
        }
        let missing = self.unscored_matches();
        if !missing.is_empty() {
            let numbers: Vec<String> = missing.iter().map(|i| (i + 1).to_string()).collect();
            return Err(ClubError::state(
                &self.name,
                format!("matches {} have no result yet", numbers.join(", ")),
            ));
        }
        self.end_time = Some(now);
        Ok(())
    }
}
