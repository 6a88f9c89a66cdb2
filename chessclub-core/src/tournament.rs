//! Tournament record, roster and derived lifecycle status

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::date::parse_date;
use crate::error::{ClubError, Result};
use crate::player::{required_name, Player, PlayerId};
use crate::round::Round;

/// Rounds played when the organiser does not say otherwise
pub const DEFAULT_ROUNDS: u32 = 4;

/// Where a tournament stands in the round lifecycle.
///
/// Derived from the round list, never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TournamentStatus {
    NotStarted,
    /// Round n (1-based) is waiting for results
    RoundOpen(usize),
    /// Round n is closed and more rounds remain
    RoundClosed(usize),
    Finished,
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TournamentStatus::NotStarted => write!(f, "not started"),
            TournamentStatus::RoundOpen(n) => write!(f, "round {n} in progress"),
            TournamentStatus::RoundClosed(n) => write!(f, "round {n} closed"),
            TournamentStatus::Finished => write!(f, "finished"),
        }
    }
}

/// A chess tournament: details, roster and rounds
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub name: String,
    pub location: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub description: String,
    pub rounds_total: u32,
    /// Roster in registration order; snapshots of registry players
    pub players: Vec<Player>,
    /// Append-only, index + 1 = round number
    pub rounds: Vec<Round>,
}

/// Partial update of tournament details; `None` keeps the current value
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TournamentEdit {
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
    pub rounds_total: Option<u32>,
}

impl Tournament {
    /// Create a tournament with an empty roster
    pub fn new(
        name: &str,
        location: &str,
        start_date: &str,
        end_date: &str,
        description: &str,
        rounds_total: u32,
    ) -> Result<Self> {
        let start_date = parse_date("start date", start_date)?;
        let end_date = parse_date("end date", end_date)?;
        check_date_order(start_date, end_date)?;
        check_rounds_total(rounds_total, 0)?;

        Ok(Self {
            name: required_name("tournament name", name)?,
            location: required_name("location", location)?,
            start_date,
            end_date,
            description: description.trim().to_string(),
            rounds_total,
            players: Vec::new(),
            rounds: Vec::new(),
        })
    }

    pub fn status(&self) -> TournamentStatus {
        match self.rounds.last() {
            None => TournamentStatus::NotStarted,
            Some(round) if round.is_open() => TournamentStatus::RoundOpen(self.rounds.len()),
            Some(_) if self.rounds.len() >= self.rounds_total as usize => {
                TournamentStatus::Finished
            }
            Some(_) => TournamentStatus::RoundClosed(self.rounds.len()),
        }
    }

    pub fn is_started(&self) -> bool {
        !self.rounds.is_empty()
    }

    /// Most recently created round
    pub fn current_round(&self) -> Option<&Round> {
        self.rounds.last()
    }

    pub fn current_round_mut(&mut self) -> Option<&mut Round> {
        self.rounds.last_mut()
    }

    /// The open round, if any (only the last round can be open)
    pub fn open_round(&self) -> Option<&Round> {
        self.rounds.last().filter(|r| r.is_open())
    }

    pub fn rounds_remaining(&self) -> usize {
        (self.rounds_total as usize).saturating_sub(self.rounds.len())
    }

    pub fn contains_player(&self, id: &PlayerId) -> bool {
        self.players.iter().any(|p| p.id == *id)
    }

    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == *id)
    }

    /// Any match of `id` has a recorded score
    pub fn has_recorded_score(&self, id: &PlayerId) -> bool {
        self.rounds
            .iter()
            .flat_map(|r| r.matches.iter())
            .any(|m| m.involves(id) && m.has_any_score())
    }

    /// Add a player to the roster; only before the first round
    pub fn register(&mut self, player: Player) -> Result<()> {
        self.ensure_not_started("cannot register players")?;
        if self.contains_player(&player.id) {
            return Err(ClubError::validation(
                "player id",
                format!("{} is already registered in '{}'", player.id, self.name),
            ));
        }
        self.players.push(player);
        Ok(())
    }

    /// Remove a player from the roster; only before the first round
    pub fn unregister(&mut self, id: &PlayerId) -> Result<Player> {
        self.ensure_not_started("cannot unregister players")?;
        let index = self
            .players
            .iter()
            .position(|p| p.id == *id)
            .ok_or_else(|| ClubError::not_found("player", format!("{id} in '{}'", self.name)))?;
        Ok(self.players.remove(index))
    }

    /// Apply an edit of the tournament details
    pub fn apply_edit(&mut self, edit: &TournamentEdit) -> Result<()> {
        let start_date = match &edit.start_date {
            Some(raw) => parse_date("start date", raw)?,
            None => self.start_date,
        };
        let end_date = match &edit.end_date {
            Some(raw) => parse_date("end date", raw)?,
            None => self.end_date,
        };
        check_date_order(start_date, end_date)?;
        let rounds_total = edit.rounds_total.unwrap_or(self.rounds_total);
        check_rounds_total(rounds_total, self.rounds.len())?;
        let location = match &edit.location {
            Some(raw) => required_name("location", raw)?,
            None => self.location.clone(),
        };

        self.location = location;
        self.start_date = start_date;
        self.end_date = end_date;
        if let Some(description) = &edit.description {
            self.description = description.trim().to_string();
        }
        self.rounds_total = rounds_total;
        Ok(())
    }

    fn ensure_not_started(&self, action: &str) -> Result<()> {
        if self.is_started() {
            return Err(ClubError::state(
                format!("tournament '{}'", self.name),
                format!("{action}: {}", self.status()),
            ));
        }
        Ok(())
    }
}

fn check_date_order(start: NaiveDate, end: NaiveDate) -> Result<()> {
    if end < start {
        return Err(ClubError::validation(
            "end date",
            format!("{end} is before the start date {start}"),
        ));
    }
    Ok(())
}

fn check_rounds_total(rounds_total: u32, rounds_created: usize) -> Result<()> {
    if rounds_total == 0 {
        return Err(ClubError::validation("rounds total", "must be positive"));
    }
    if (rounds_total as usize) < rounds_created {
        return Err(ClubError::validation(
            "rounds total",
            format!("{rounds_created} rounds already exist"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::round::Match;
    use chrono::Utc;

    fn spring_open() -> Tournament {
        Tournament::new(
            "Spring Open",
            "Lyon",
            "01/04/2025",
            "03/04/2025",
            "Club championship",
            DEFAULT_ROUNDS,
        )
        .unwrap()
    }

    fn player(id: &str) -> Player {
        Player::new(id, "Doe", "Jo", "01/01/1990").unwrap()
    }

    #[test]
    fn test_new_validates() {
        let t = spring_open();
        assert_eq!(t.rounds_total, 4);
        assert_eq!(t.status(), TournamentStatus::NotStarted);

        let err = Tournament::new("X", "Lyon", "03/04/2025", "01/04/2025", "", 4).unwrap_err();
        assert!(matches!(err, ClubError::Validation { field: "end date", .. }));

        let err = Tournament::new("X", "Lyon", "01/04/2025", "03/04/2025", "", 0).unwrap_err();
        assert!(matches!(err, ClubError::Validation { field: "rounds total", .. }));

        let err = Tournament::new("X", "Lyon", "April", "03/04/2025", "", 4).unwrap_err();
        assert!(matches!(err, ClubError::Validation { field: "start date", .. }));
    }

    #[test]
    fn test_register_and_unregister() {
        let mut t = spring_open();
        t.register(player("AA00001")).unwrap();
        t.register(player("AA00002")).unwrap();
        assert!(t.register(player("AA00001")).is_err());

        let removed = t.unregister(&player("AA00001").id).unwrap();
        assert_eq!(removed.id.as_str(), "AA00001");
        assert_eq!(t.players.len(), 1);
        assert!(matches!(
            t.unregister(&player("AA00009").id),
            Err(ClubError::NotFound { .. })
        ));
    }

    #[test]
    fn test_status_transitions() {
        let mut t = spring_open();
        t.rounds_total = 1;
        t.register(player("AA00001")).unwrap();
        t.register(player("AA00002")).unwrap();

        let m = Match::new(player("AA00001").id, player("AA00002").id).unwrap();
        t.rounds.push(Round::new(1, vec![m], Utc::now()));
        assert_eq!(t.status(), TournamentStatus::RoundOpen(1));
        assert!(t.open_round().is_some());
        assert!(matches!(
            t.register(player("AA00003")),
            Err(ClubError::State { .. })
        ));

        let round = t.current_round_mut().unwrap();
        round.enter_score(0, 1.0, 0.0).unwrap();
        round.close(Utc::now()).unwrap();
        assert_eq!(t.status(), TournamentStatus::Finished);
        assert!(t.has_recorded_score(&player("AA00002").id));

        t.rounds_total = 2;
        assert_eq!(t.status(), TournamentStatus::RoundClosed(1));
        assert_eq!(t.rounds_remaining(), 1);
    }

    #[test]
    fn test_apply_edit() {
        let mut t = spring_open();
        let edit = TournamentEdit {
            location: Some("Paris".to_string()),
            rounds_total: Some(6),
            ..Default::default()
        };
        t.apply_edit(&edit).unwrap();
        assert_eq!(t.location, "Paris");
        assert_eq!(t.rounds_total, 6);

        let bad = TournamentEdit {
            end_date: Some("01/01/2020".to_string()),
            location: Some("Nice".to_string()),
            ..Default::default()
        };
        assert!(t.apply_edit(&bad).is_err());
        assert_eq!(t.location, "Paris");
    }
}
