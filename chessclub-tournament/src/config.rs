//! Configuration for the club service
//!
//! Level 4 - Utilities and configuration

use std::path::PathBuf;

use chessclub_core::DEFAULT_ROUNDS;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Club configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClubConfig {
    /// Directory holding `players.json` and `tournaments/`
    pub data_dir: PathBuf,
    /// Rounds used when a tournament is created without an explicit count
    pub default_rounds: u32,
    /// Random seed for pairings (None = random)
    pub seed: Option<u64>,
}

impl Default for ClubConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            default_rounds: DEFAULT_ROUNDS,
            seed: None,
        }
    }
}

impl ClubConfig {
    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_default_rounds(mut self, rounds: u32) -> Self {
        self.default_rounds = rounds;
        self
    }

    /// RNG for the pairing engine, seeded when a seed is configured
    pub fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        }
    }
}
