//! Player sync bridge - keeps tournament rosters consistent with the registry
//!
//! Level 3 - Steps
//!
//! Tournaments keep their own copy of each registered player. Every change to
//! a registry player goes through here so that copy never drifts; recorded
//! scores are never touched.

use chessclub_core::{ClubError, Player, PlayerId, Result, Tournament};

/// Propagate an edited player into every roster that lists `old_id`.
///
/// An id change is also applied to the matches already paired. Returns the
/// number of tournaments updated; 0 when the player is in no roster.
pub fn sync_player_edit(
    tournaments: &mut [Tournament],
    old_id: &PlayerId,
    updated: &Player,
) -> usize {
    let mut updated_count = 0;

    for tournament in tournaments.iter_mut() {
        let Some(entry) = tournament.players.iter_mut().find(|p| p.id == *old_id) else {
            continue;
        };
        *entry = updated.clone();

        if updated.id != *old_id {
            for game in tournament.rounds.iter_mut().flat_map(|r| r.matches.iter_mut()) {
                if game.player1 == *old_id {
                    game.player1 = updated.id.clone();
                }
                if game.player2 == *old_id {
                    game.player2 = updated.id.clone();
                }
            }
        }

        tracing::debug!("Synced {} into '{}'", updated.id, tournament.name);
        updated_count += 1;
    }

    updated_count
}

/// Detach a player that is being deleted from the registry.
///
/// Fails without touching anything if the player has a recorded score in any
/// tournament. Otherwise removes them from every roster of a tournament that
/// has not started and returns how many rosters changed. Started tournaments
/// without scores for the player keep their snapshot.
pub fn remove_player(tournaments: &mut [Tournament], id: &PlayerId) -> Result<usize> {
    if let Some(tournament) = tournaments.iter().find(|t| t.has_recorded_score(id)) {
        return Err(ClubError::Referential {
            player_id: id.to_string(),
            tournament: tournament.name.clone(),
        });
    }

    let mut removed = 0;
    for tournament in tournaments.iter_mut().filter(|t| !t.is_started()) {
        if let Some(index) = tournament.players.iter().position(|p| p.id == *id) {
            tournament.players.remove(index);
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chessclub_core::{Match, Round};
    use chrono::Utc;

    fn player(id: &str, last: &str) -> Player {
        Player::new(id, last, "Jo", "01/01/1990").unwrap()
    }

    fn tournament(name: &str, ids: &[&str]) -> Tournament {
        let mut t = Tournament::new(name, "Lyon", "01/04/2025", "02/04/2025", "", 4).unwrap();
        for id in ids {
            t.register(player(id, "Doe")).unwrap();
        }
        t
    }

    fn start_with_first_pair(t: &mut Tournament) {
        let m = Match::new(t.players[0].id.clone(), t.players[1].id.clone()).unwrap();
        t.rounds.push(Round::new(1, vec![m], Utc::now()));
    }

    #[test]
    fn test_sync_updates_names_only_where_listed() {
        let mut tournaments = vec![
            tournament("A", &["AA00001", "AA00002"]),
            tournament("B", &["AA00002", "AA00003"]),
        ];
        let updated = player("AA00001", "Smith");
        let count = sync_player_edit(&mut tournaments, &updated.id, &updated);
        assert_eq!(count, 1);
        assert_eq!(tournaments[0].players[0].last_name, "Smith");
        assert_eq!(tournaments[1].players[0].last_name, "Doe");
    }

    #[test]
    fn test_sync_unknown_player_is_noop() {
        let mut tournaments = vec![tournament("A", &["AA00001", "AA00002"])];
        let before = tournaments.clone();
        let ghost = player("ZZ99999", "Ghost");
        assert_eq!(sync_player_edit(&mut tournaments, &ghost.id, &ghost), 0);
        assert_eq!(tournaments, before);
    }

    #[test]
    fn test_sync_id_change_keeps_scores() {
        let mut t = tournament("A", &["AA00001", "AA00002"]);
        start_with_first_pair(&mut t);
        t.current_round_mut().unwrap().enter_score(0, 1.0, 0.0).unwrap();
        let mut tournaments = vec![t];

        let old_id = PlayerId::parse("AA00001").unwrap();
        let renamed = player("BB00001", "Doe");
        assert_eq!(sync_player_edit(&mut tournaments, &old_id, &renamed), 1);

        let t = &tournaments[0];
        assert!(t.contains_player(&renamed.id));
        assert!(!t.contains_player(&old_id));
        let game = &t.rounds[0].matches[0];
        assert_eq!(game.player1, renamed.id);
        assert_eq!(game.score1.map(f64::from), Some(1.0));
        assert_eq!(game.score2.map(f64::from), Some(0.0));
    }

    #[test]
    fn test_remove_player_with_scores_is_rejected() {
        let mut started = tournament("Started", &["AA00001", "AA00002"]);
        start_with_first_pair(&mut started);
        started.current_round_mut().unwrap().enter_score(0, 0.5, 0.5).unwrap();
        let mut tournaments = vec![tournament("Pending", &["AA00001", "AA00003"]), started];
        let before = tournaments.clone();

        let id = PlayerId::parse("AA00001").unwrap();
        let err = remove_player(&mut tournaments, &id).unwrap_err();
        assert!(matches!(
            err,
            ClubError::Referential { ref tournament, .. } if tournament == "Started"
        ));
        assert_eq!(tournaments, before);
    }

    #[test]
    fn test_remove_player_from_unstarted_rosters() {
        let mut started = tournament("Started", &["AA00001", "AA00002"]);
        start_with_first_pair(&mut started);
        let mut tournaments = vec![tournament("Pending", &["AA00001", "AA00003"]), started];

        let id = PlayerId::parse("AA00001").unwrap();
        assert_eq!(remove_player(&mut tournaments, &id).unwrap(), 1);
        assert!(!tournaments[0].contains_player(&id));
        // Started without scores: snapshot stays so the open match keeps its player
        assert!(tournaments[1].contains_player(&id));
    }
}
