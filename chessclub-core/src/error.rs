//! Error types shared by every club operation

use crate::store::StoreError;

/// Convenience alias used across the workspace
pub type Result<T, E = ClubError> = std::result::Result<T, E>;

/// Why the pairing engine refused to produce a round
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PairingError {
    #[error("tournament '{tournament}' has no registered players")]
    NoPlayers { tournament: String },

    #[error("tournament '{tournament}' has an odd number of players ({count})")]
    OddPlayerCount { tournament: String, count: usize },

    #[error("player {player} appears twice in the roster of '{tournament}'")]
    DuplicatePlayer { tournament: String, player: String },

    #[error("{round} of tournament '{tournament}' is still open")]
    RoundOpen { tournament: String, round: String },

    #[error("tournament '{tournament}' already has all {rounds_total} rounds")]
    NoRoundsLeft { tournament: String, rounds_total: u32 },
}

/// Error returned by entity constructors, the lifecycle controller and the club service
#[derive(Debug, thiserror::Error)]
pub enum ClubError {
    /// Malformed input: id, date, score, round count
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// Operation not allowed in the current round/tournament state
    #[error("{context}: {reason}")]
    State { context: String, reason: String },

    #[error(transparent)]
    Pairing(#[from] PairingError),

    /// Removing the player would orphan recorded results
    #[error("player {player_id} has recorded results in tournament '{tournament}'")]
    Referential { player_id: String, tournament: String },

    #[error("{kind} '{key}' not found")]
    NotFound { kind: &'static str, key: String },

    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl ClubError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        ClubError::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn state(context: impl Into<String>, reason: impl Into<String>) -> Self {
        ClubError::State {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        ClubError::NotFound {
            kind,
            key: key.into(),
        }
    }

    /// True for errors the operator can fix by re-entering input
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ClubError::Validation { .. } | ClubError::State { .. } | ClubError::NotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_names_field() {
        let err = ClubError::validation("player id", "expected two letters and five digits");
        assert_eq!(
            err.to_string(),
            "invalid player id: expected two letters and five digits"
        );
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_pairing_error_converts() {
        let err: ClubError = PairingError::NoRoundsLeft {
            tournament: "Spring Open".to_string(),
            rounds_total: 4,
        }
        .into();
        assert!(matches!(err, ClubError::Pairing(_)));
        assert!(!err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "tournament 'Spring Open' already has all 4 rounds"
        );
    }
}
