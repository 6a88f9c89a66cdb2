//! Club service - the application layer over a [`Store`]
//!
//! Level 1 - Orchestration
//!
//! Every mutating operation follows the same shape:
//! 1. Load the affected records from the store
//! 2. Apply the change to the loaded copies
//! 3. Save the copies back
//!
//! A failure before step 3 leaves the store untouched. A failed save in a
//! multi-record operation restores the records already written.

use chessclub_core::{
    ClubError, Player, PlayerEdit, PlayerId, Result, Round, Store, Tournament, TournamentEdit,
    TournamentStatus,
};
use chrono::Utc;
use rand_chacha::ChaCha8Rng;

use crate::config::ClubConfig;
use crate::lifecycle;
use crate::standings::{compute_standings, Standing};
use crate::sync::{remove_player, sync_player_edit};

/// Players, tournaments and their lifecycle behind one store
pub struct Club<S: Store> {
    store: S,
    config: ClubConfig,
    rng: ChaCha8Rng,
}

impl<S: Store> Club<S> {
    pub fn new(store: S, config: ClubConfig) -> Self {
        let rng = config.rng();
        Self { store, config, rng }
    }

    pub fn config(&self) -> &ClubConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    // ========================================================================
    // PLAYERS
    // ========================================================================

    /// Registry players sorted by last name, then first name
    pub fn players(&self) -> Result<Vec<Player>> {
        let mut players = self.store.load_players()?;
        players.sort_by(|a, b| {
            a.last_name
                .to_lowercase()
                .cmp(&b.last_name.to_lowercase())
                .then_with(|| a.first_name.to_lowercase().cmp(&b.first_name.to_lowercase()))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(players)
    }

    pub fn player(&self, id: &str) -> Result<Player> {
        let id = PlayerId::parse(id)?;
        self.store
            .load_players()?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| ClubError::not_found("player", id.as_str()))
    }

    /// Add a player; the id must be unused in the registry and every roster
    pub fn add_player(&mut self, player: Player) -> Result<()> {
        let mut players = self.store.load_players()?;
        let tournaments = self.store.load_tournaments()?;
        ensure_id_free(&player.id, &players, &tournaments)?;
        tracing::info!("Added player {} ({})", player.id, player.full_name());
        players.push(player);
        self.store.save_players(&players)?;
        Ok(())
    }

    /// Edit a registry player and propagate the change to every roster.
    ///
    /// Returns the edited player and how many tournaments were updated.
    pub fn edit_player(&mut self, id: &str, edit: &PlayerEdit) -> Result<(Player, usize)> {
        let old_id = PlayerId::parse(id)?;
        let mut players = self.store.load_players()?;
        let index = players
            .iter()
            .position(|p| p.id == old_id)
            .ok_or_else(|| ClubError::not_found("player", old_id.as_str()))?;
        let updated = edit.apply(&players[index])?;

        let before = self.store.load_tournaments()?;
        if updated.id != old_id {
            ensure_id_free(&updated.id, &players, &before)?;
        }

        let mut after = before.clone();
        let synced = sync_player_edit(&mut after, &old_id, &updated);
        players[index] = updated.clone();
        self.commit(&before, &after, &players)?;

        tracing::info!("Edited player {} ({} tournaments synced)", updated.id, synced);
        Ok((updated, synced))
    }

    /// Delete a registry player; returns how many rosters dropped them.
    ///
    /// Refused with a referential error while the player has a recorded
    /// score in any tournament.
    pub fn delete_player(&mut self, id: &str) -> Result<usize> {
        let id = PlayerId::parse(id)?;
        let mut players = self.store.load_players()?;
        let index = players
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| ClubError::not_found("player", id.as_str()))?;

        let before = self.store.load_tournaments()?;
        let mut after = before.clone();
        let removed = remove_player(&mut after, &id)?;
        players.remove(index);
        self.commit(&before, &after, &players)?;

        tracing::info!("Deleted player {} (removed from {} rosters)", id, removed);
        Ok(removed)
    }

    // ========================================================================
    // TOURNAMENTS
    // ========================================================================

    pub fn tournaments(&self) -> Result<Vec<Tournament>> {
        Ok(self.store.load_tournaments()?)
    }

    pub fn tournament(&self, name: &str) -> Result<Tournament> {
        self.store
            .load_tournament(name)?
            .ok_or_else(|| ClubError::not_found("tournament", name))
    }

    pub fn create_tournament(&mut self, tournament: Tournament) -> Result<()> {
        if self.store.load_tournament(&tournament.name)?.is_some() {
            return Err(ClubError::validation(
                "tournament name",
                format!("'{}' already exists", tournament.name),
            ));
        }
        self.store.save_tournament(&tournament)?;
        tracing::info!(
            "Created tournament '{}' ({} rounds)",
            tournament.name,
            tournament.rounds_total
        );
        Ok(())
    }

    pub fn edit_tournament(&mut self, name: &str, edit: &TournamentEdit) -> Result<Tournament> {
        self.update_tournament(name, |tournament, _| {
            tournament.apply_edit(edit)?;
            Ok(tournament.clone())
        })
    }

    pub fn delete_tournament(&mut self, name: &str) -> Result<()> {
        if !self.store.delete_tournament(name)? {
            return Err(ClubError::not_found("tournament", name));
        }
        tracing::info!("Deleted tournament '{}'", name);
        Ok(())
    }

    /// Register registry players, all or nothing
    pub fn register_players<I: AsRef<str>>(&mut self, name: &str, ids: &[I]) -> Result<Tournament> {
        let registry = self.store.load_players()?;
        let mut selected = Vec::with_capacity(ids.len());
        for raw in ids {
            let id = PlayerId::parse(raw.as_ref())?;
            let player = registry
                .iter()
                .find(|p| p.id == id)
                .ok_or_else(|| ClubError::not_found("player", id.as_str()))?;
            selected.push(player.clone());
        }

        self.update_tournament(name, |tournament, _| {
            for player in selected {
                tournament.register(player)?;
            }
            tracing::info!(
                "'{}' now has {} players",
                tournament.name,
                tournament.players.len()
            );
            Ok(tournament.clone())
        })
    }

    pub fn unregister_player(&mut self, name: &str, id: &str) -> Result<Player> {
        let id = PlayerId::parse(id)?;
        self.update_tournament(name, |tournament, _| tournament.unregister(&id))
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Pair and open round 1
    pub fn start_tournament(&mut self, name: &str) -> Result<Round> {
        self.update_tournament(name, |tournament, rng| {
            lifecycle::start_tournament(tournament, rng, Utc::now()).cloned()
        })
    }

    /// Record a result in the open round; `match_index` is 0-based
    pub fn enter_score(
        &mut self,
        name: &str,
        match_index: usize,
        score1: f64,
        score2: f64,
    ) -> Result<Round> {
        self.update_tournament(name, |tournament, _| {
            lifecycle::enter_score(tournament, match_index, score1, score2)?;
            tournament
                .current_round()
                .cloned()
                .ok_or_else(|| ClubError::state(format!("tournament '{name}'"), "no rounds"))
        })
    }

    /// Close the open round; returns the resulting status
    pub fn close_round(&mut self, name: &str) -> Result<TournamentStatus> {
        self.update_tournament(name, |tournament, _| {
            lifecycle::close_round(tournament, Utc::now())?;
            Ok(tournament.status())
        })
    }

    /// Pair and open the next round
    pub fn advance_round(&mut self, name: &str) -> Result<Round> {
        self.update_tournament(name, |tournament, rng| {
            lifecycle::advance_round(tournament, rng, Utc::now()).cloned()
        })
    }

    pub fn standings(&self, name: &str) -> Result<Vec<Standing>> {
        Ok(compute_standings(&self.tournament(name)?))
    }

    // ========================================================================
    // TRANSACTIONS
    // ========================================================================

    /// Load one tournament, mutate the copy, save it only if `f` succeeds
    fn update_tournament<T>(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut Tournament, &mut ChaCha8Rng) -> Result<T>,
    ) -> Result<T> {
        let mut tournament = self.tournament(name)?;
        let out = f(&mut tournament, &mut self.rng)?;
        self.store.save_tournament(&tournament)?;
        Ok(out)
    }

    /// Save the tournaments that changed, then the registry
    fn commit(
        &mut self,
        before: &[Tournament],
        after: &[Tournament],
        players: &[Player],
    ) -> Result<()> {
        let mut written: Vec<&Tournament> = Vec::new();
        for (old, new) in before.iter().zip(after) {
            if old == new {
                continue;
            }
            if let Err(err) = self.store.save_tournament(new) {
                self.restore(&written);
                return Err(err.into());
            }
            written.push(old);
        }
        if let Err(err) = self.store.save_players(players) {
            self.restore(&written);
            return Err(err.into());
        }
        Ok(())
    }

    fn restore(&mut self, originals: &[&Tournament]) {
        for tournament in originals {
            if let Err(err) = self.store.save_tournament(tournament) {
                tracing::warn!("Could not restore '{}': {}", tournament.name, err);
            }
        }
    }
}

/// Player ids stay unique across the registry and the rosters, which may
/// still list players deleted from the registry.
fn ensure_id_free(id: &PlayerId, players: &[Player], tournaments: &[Tournament]) -> Result<()> {
    let in_registry = players.iter().any(|p| p.id == *id);
    let in_roster = tournaments.iter().any(|t| t.contains_player(id));
    if in_registry || in_roster {
        return Err(ClubError::validation("player id", format!("{id} is already in use")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chessclub_core::{MemoryStore, PairingError};

    fn club_with_players(count: usize) -> Club<MemoryStore> {
        let mut club = Club::new(MemoryStore::new(), ClubConfig::default().with_seed(11));
        for i in 1..=count {
            let last = format!("Player{:02}", count + 1 - i);
            club.add_player(Player::new(&format!("CL{i:05}"), &last, "Sam", "03/03/1985").unwrap())
                .unwrap();
        }
        club
    }

    fn ids(count: usize) -> Vec<String> {
        (1..=count).map(|i| format!("CL{i:05}")).collect()
    }

    fn open_tournament(club: &mut Club<MemoryStore>, name: &str, players: usize) {
        club.create_tournament(
            Tournament::new(name, "Paris", "05/05/2025", "06/05/2025", "", 3).unwrap(),
        )
        .unwrap();
        club.register_players(name, ids(players).as_slice()).unwrap();
    }

    #[test]
    fn test_players_sorted_by_name() {
        let club = club_with_players(3);
        let names: Vec<String> = club.players().unwrap().into_iter().map(|p| p.last_name).collect();
        assert_eq!(names, ["Player01", "Player02", "Player03"]);
    }

    #[test]
    fn test_add_duplicate_player() {
        let mut club = club_with_players(1);
        let dup = Player::new("CL00001", "Other", "Ana", "01/01/2000").unwrap();
        assert!(matches!(club.add_player(dup), Err(ClubError::Validation { .. })));
        assert_eq!(club.players().unwrap().len(), 1);
    }

    #[test]
    fn test_create_duplicate_tournament() {
        let mut club = club_with_players(0);
        open_tournament(&mut club, "Spring Open", 0);
        let again =
            Tournament::new("spring  open", "Nice", "05/05/2025", "05/05/2025", "", 3).unwrap();
        assert!(matches!(
            club.create_tournament(again),
            Err(ClubError::Validation { field: "tournament name", .. })
        ));
    }

    #[test]
    fn test_register_unknown_player_is_all_or_nothing() {
        let mut club = club_with_players(2);
        open_tournament(&mut club, "Open", 0);
        let err = club.register_players("Open", &["CL00001", "ZZ00000"]).unwrap_err();
        assert!(matches!(err, ClubError::NotFound { kind: "player", .. }));
        assert!(club.tournament("Open").unwrap().players.is_empty());
    }

    #[test]
    fn test_full_lifecycle_through_club() {
        let mut club = club_with_players(4);
        open_tournament(&mut club, "Open", 4);

        let round = club.start_tournament("Open").unwrap();
        assert_eq!(round.name, "Round 1");
        club.enter_score("Open", 0, 1.0, 0.0).unwrap();
        let round = club.enter_score("Open", 1, 0.5, 0.5).unwrap();
        assert!(round.is_complete());
        assert_eq!(club.close_round("Open").unwrap(), TournamentStatus::RoundClosed(1));

        let standings = club.standings("Open").unwrap();
        assert_eq!(standings[0].score, 1.0);
        assert_eq!(standings.iter().map(|s| s.score).sum::<f64>(), 2.0);

        for n in 2..=3 {
            let round = club.advance_round("Open").unwrap();
            assert_eq!(round.name, format!("Round {n}"));
            for i in 0..2 {
                club.enter_score("Open", i, 0.0, 1.0).unwrap();
            }
            club.close_round("Open").unwrap();
        }
        assert_eq!(club.tournament("Open").unwrap().status(), TournamentStatus::Finished);
        assert!(matches!(
            club.advance_round("Open"),
            Err(ClubError::Pairing(PairingError::NoRoundsLeft { .. }))
        ));
    }

    #[test]
    fn test_failed_save_keeps_stored_state() {
        let mut club = club_with_players(4);
        open_tournament(&mut club, "Open", 4);
        club.store_mut().set_fail_saves(true);

        assert!(matches!(club.start_tournament("Open"), Err(ClubError::Persistence(_))));
        club.store_mut().set_fail_saves(false);
        assert_eq!(club.tournament("Open").unwrap().status(), TournamentStatus::NotStarted);
    }

    #[test]
    fn test_edit_player_syncs_rosters() {
        let mut club = club_with_players(4);
        open_tournament(&mut club, "Open", 4);
        club.start_tournament("Open").unwrap();
        club.enter_score("Open", 0, 1.0, 0.0).unwrap();

        let edit = PlayerEdit {
            id: Some("NW00001".to_string()),
            last_name: Some("Renamed".to_string()),
            ..Default::default()
        };
        let (player, synced) = club.edit_player("CL00001", &edit).unwrap();
        assert_eq!(synced, 1);
        assert_eq!(player.id.as_str(), "NW00001");

        let t = club.tournament("Open").unwrap();
        let entry = t.player(&player.id).unwrap();
        assert_eq!(entry.last_name, "Renamed");
        assert!(t.rounds[0].involves(&player.id));
        let total: f64 = club.standings("Open").unwrap().iter().map(|s| s.score).sum();
        assert_eq!(total, 1.0);
        assert!(matches!(club.player("CL00001"), Err(ClubError::NotFound { .. })));
    }

    #[test]
    fn test_edit_player_id_collision() {
        let mut club = club_with_players(2);
        let edit = PlayerEdit {
            id: Some("CL00002".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            club.edit_player("CL00001", &edit),
            Err(ClubError::Validation { field: "player id", .. })
        ));
    }

    #[test]
    fn test_edit_player_rolls_back_on_save_failure() {
        let mut club = club_with_players(2);
        open_tournament(&mut club, "Open", 2);
        club.store_mut().set_fail_saves(true);

        let edit = PlayerEdit {
            last_name: Some("Changed".to_string()),
            ..Default::default()
        };
        assert!(club.edit_player("CL00001", &edit).is_err());
        club.store_mut().set_fail_saves(false);
        assert_ne!(club.player("CL00001").unwrap().last_name, "Changed");
        let t = club.tournament("Open").unwrap();
        assert_ne!(t.players[0].last_name, "Changed");
    }

    #[test]
    fn test_delete_player_with_results_is_refused() {
        let mut club = club_with_players(2);
        open_tournament(&mut club, "Open", 2);
        club.start_tournament("Open").unwrap();
        club.enter_score("Open", 0, 0.5, 0.5).unwrap();

        let err = club.delete_player("CL00001").unwrap_err();
        assert!(matches!(err, ClubError::Referential { .. }));
        assert!(club.player("CL00001").is_ok());
    }

    #[test]
    fn test_deleted_player_id_stays_reserved_while_in_a_roster() {
        let mut club = club_with_players(2);
        open_tournament(&mut club, "Open", 2);
        club.start_tournament("Open").unwrap();
        assert_eq!(club.delete_player("CL00001").unwrap(), 0);

        let newcomer = Player::new("CL00001", "Newcomer", "Zoe", "04/04/2004").unwrap();
        assert!(matches!(
            club.add_player(newcomer),
            Err(ClubError::Validation { field: "player id", .. })
        ));
        assert!(club.player("CL00001").is_err());

        let t = club.tournament("Open").unwrap();
        let entry = t.player(&PlayerId::parse("CL00001").unwrap()).unwrap();
        assert_ne!(entry.last_name, "Newcomer");
    }

    #[test]
    fn test_edit_player_id_taken_by_roster_entry() {
        let mut club = club_with_players(3);
        open_tournament(&mut club, "Open", 2);
        club.start_tournament("Open").unwrap();
        club.delete_player("CL00002").unwrap();

        let edit = PlayerEdit {
            id: Some("CL00002".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            club.edit_player("CL00003", &edit),
            Err(ClubError::Validation { field: "player id", .. })
        ));
    }

    #[test]
    fn test_delete_player_leaves_unstarted_rosters() {
        let mut club = club_with_players(3);
        open_tournament(&mut club, "Open", 3);

        assert_eq!(club.delete_player("CL00002").unwrap(), 1);
        let t = club.tournament("Open").unwrap();
        assert_eq!(t.players.len(), 2);
        assert!(club.player("CL00002").is_err());
    }

    #[test]
    fn test_edit_tournament_rounds_total_floor() {
        let mut club = club_with_players(2);
        open_tournament(&mut club, "Open", 2);
        club.start_tournament("Open").unwrap();

        let shrink = TournamentEdit {
            rounds_total: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            club.edit_tournament("Open", &shrink),
            Err(ClubError::Validation { .. })
        ));
        let grow = TournamentEdit {
            rounds_total: Some(5),
            ..Default::default()
        };
        assert_eq!(club.edit_tournament("Open", &grow).unwrap().rounds_total, 5);
    }

    #[test]
    fn test_delete_tournament() {
        let mut club = club_with_players(0);
        open_tournament(&mut club, "Open", 0);
        club.delete_tournament("open").unwrap();
        assert!(matches!(club.delete_tournament("Open"), Err(ClubError::NotFound { .. })));
        assert!(club.tournaments().unwrap().is_empty());
    }
}
