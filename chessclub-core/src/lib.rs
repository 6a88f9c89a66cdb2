//! Chess Club Core - Entity model and persistence
//!
//! This crate provides the records the tournament engine works on:
//! - Players and their national ids
//! - Tournaments, rounds and matches with their invariants
//! - Typed errors shared across the workspace
//! - The store interface and its JSON / in-memory implementations

pub mod date;
pub mod error;
pub mod player;
pub mod round;
pub mod store;
pub mod tournament;

// Re-exports for convenient access
pub use date::parse_date;
pub use error::{ClubError, PairingError, Result};
pub use player::{Player, PlayerEdit, PlayerId, PLAYER_ID_PATTERN};
pub use round::{validate_result, Match, Outcome, Round, Score};
pub use store::{slug, JsonStore, MemoryStore, Store, StoreError};
pub use tournament::{Tournament, TournamentEdit, TournamentStatus, DEFAULT_ROUNDS};
