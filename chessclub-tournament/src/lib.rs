//! Chess Club Tournament - pairing, standings and the round lifecycle
//!
//! This crate drives tournaments built from `chessclub-core` entities:
//! - Pairing engine (random first round, score groups afterwards)
//! - Standings computed from recorded results
//! - Round lifecycle (start, score, close, advance)
//! - Player sync bridge between the registry and tournament rosters
//! - `Club` service tying it all to a store
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: Club, lifecycle (orchestration)
//! - Level 2: generate_next_round (phases)
//! - Level 3: compute_standings, sync_player_edit (steps)
//! - Level 4: utilities, configuration

mod club;
mod config;
mod lifecycle;
mod pairing;
mod standings;
mod sync;

pub use club::Club;
pub use config::ClubConfig;
pub use lifecycle::{advance_round, close_round, enter_score, start_tournament};
pub use pairing::{generate_next_round, generate_next_round_at, played_pairs};
pub use standings::{compute_standings, cumulative_scores, Standing};
pub use sync::{remove_player, sync_player_edit};
