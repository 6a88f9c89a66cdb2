//! Persistence boundary for players and tournaments
//!
//! The club service talks to a [`Store`]; the core never touches the file
//! format directly. Two implementations ship here:
//! - [`JsonStore`]: `players.json` plus one file per tournament
//! - [`MemoryStore`]: in-process, used by tests and embedders

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::player::Player;
use crate::tournament::Tournament;

/// Store read/write failure
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed data in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Repository of players and tournaments.
///
/// Every call is treated as atomic: it either fully succeeds or leaves the
/// stored data as it was.
pub trait Store {
    fn load_players(&self) -> Result<Vec<Player>, StoreError>;

    fn save_players(&mut self, players: &[Player]) -> Result<(), StoreError>;

    /// `None` when no tournament with that name exists
    fn load_tournament(&self, name: &str) -> Result<Option<Tournament>, StoreError>;

    fn save_tournament(&mut self, tournament: &Tournament) -> Result<(), StoreError>;

    /// All tournaments, ordered by storage key
    fn load_tournaments(&self) -> Result<Vec<Tournament>, StoreError>;

    /// Returns false when nothing was stored under that name
    fn delete_tournament(&mut self, name: &str) -> Result<bool, StoreError>;
}

/// Storage key for a tournament name: lowercase, runs of other characters
/// collapsed to `_`
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "tournament".to_string()
    } else {
        trimmed.to_string()
    }
}

// ============================================================================
// JSON FILES
// ============================================================================

/// File-backed store rooted at a data directory
#[derive(Clone, Debug)]
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn players_path(&self) -> PathBuf {
        self.root.join("players.json")
    }

    fn tournaments_dir(&self) -> PathBuf {
        self.root.join("tournaments")
    }

    fn tournament_path(&self, name: &str) -> PathBuf {
        self.tournaments_dir().join(format!("{}.json", slug(name)))
    }
}

impl Store for JsonStore {
    fn load_players(&self) -> Result<Vec<Player>, StoreError> {
        Ok(read_json(&self.players_path())?.unwrap_or_default())
    }

    fn save_players(&mut self, players: &[Player]) -> Result<(), StoreError> {
        write_json_atomic(&self.players_path(), players)
    }

    fn load_tournament(&self, name: &str) -> Result<Option<Tournament>, StoreError> {
        read_json(&self.tournament_path(name))
    }

    fn save_tournament(&mut self, tournament: &Tournament) -> Result<(), StoreError> {
        write_json_atomic(&self.tournament_path(&tournament.name), tournament)
    }

    fn load_tournaments(&self) -> Result<Vec<Tournament>, StoreError> {
        let dir = self.tournaments_dir();
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path: dir, source }),
        };

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut tournaments = Vec::with_capacity(paths.len());
        for path in paths {
            if let Some(tournament) = read_json(&path)? {
                tournaments.push(tournament);
            }
        }
        Ok(tournaments)
    }

    fn delete_tournament(&mut self, name: &str) -> Result<bool, StoreError> {
        let path = self.tournament_path(name);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Deleted {}", path.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

/// Read and parse a JSON file; a missing file is `Ok(None)`
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    let value = serde_json::from_str(&content).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!("Loaded {} bytes from {}", content.len(), path.display());
    Ok(Some(value))
}

/// Write to a sibling temp file, then rename over the target
fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let content = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let temp_path = path.with_extension("json.tmp");
    {
        let mut file = File::create(&temp_path).map_err(io_err)?;
        file.write_all(content.as_bytes()).map_err(io_err)?;
        file.sync_all().map_err(io_err)?;
    }
    fs::rename(&temp_path, path).map_err(io_err)?;

    tracing::debug!("Saved {} bytes to {}", content.len(), path.display());
    Ok(())
}

// ============================================================================
// IN MEMORY
// ============================================================================

/// Store kept entirely in memory
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    players: Vec<Player>,
    tournaments: BTreeMap<String, Tournament>,
    fail_saves: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent save fail with [`StoreError::Unavailable`]
    pub fn set_fail_saves(&mut self, fail: bool) {
        self.fail_saves = fail;
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_saves {
            return Err(StoreError::Unavailable("saves disabled".to_string()));
        }
        Ok(())
    }
}

impl Store for MemoryStore {
    fn load_players(&self) -> Result<Vec<Player>, StoreError> {
        Ok(self.players.clone())
    }

    fn save_players(&mut self, players: &[Player]) -> Result<(), StoreError> {
        self.check_writable()?;
        self.players = players.to_vec();
        Ok(())
    }

    fn load_tournament(&self, name: &str) -> Result<Option<Tournament>, StoreError> {
        Ok(self.tournaments.get(&slug(name)).cloned())
    }

    fn save_tournament(&mut self, tournament: &Tournament) -> Result<(), StoreError> {
        self.check_writable()?;
        self.tournaments
            .insert(slug(&tournament.name), tournament.clone());
        Ok(())
    }

    fn load_tournaments(&self) -> Result<Vec<Tournament>, StoreError> {
        Ok(self.tournaments.values().cloned().collect())
    }

    fn delete_tournament(&mut self, name: &str) -> Result<bool, StoreError> {
        self.check_writable()?;
        Ok(self.tournaments.remove(&slug(name)).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_tournament(name: &str) -> Tournament {
        let mut t = Tournament::new(name, "Lyon", "01/04/2025", "02/04/2025", "", 4).unwrap();
        t.register(Player::new("AA00001", "Doe", "Jo", "01/01/1990").unwrap())
            .unwrap();
        t
    }

    #[test]
    fn test_slug() {
        assert_eq!(slug("Spring Open 2025"), "spring_open_2025");
        assert_eq!(slug("  Rapid -- Blitz! "), "rapid_blitz");
        assert_eq!(slug("???"), "tournament");
    }

    #[test]
    fn test_json_store_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = JsonStore::new(temp_dir.path());

        assert!(store.load_players().unwrap().is_empty());
        assert!(store.load_tournaments().unwrap().is_empty());

        let players = vec![Player::new("AA00001", "Doe", "Jo", "01/01/1990").unwrap()];
        store.save_players(&players).unwrap();
        assert_eq!(store.load_players().unwrap(), players);

        let t = sample_tournament("Spring Open");
        store.save_tournament(&t).unwrap();
        assert!(temp_dir.path().join("tournaments/spring_open.json").exists());
        assert!(!temp_dir.path().join("tournaments/spring_open.json.tmp").exists());

        assert_eq!(store.load_tournament("spring open").unwrap(), Some(t.clone()));
        assert_eq!(store.load_tournaments().unwrap(), vec![t]);

        assert!(store.delete_tournament("Spring Open").unwrap());
        assert!(!store.delete_tournament("Spring Open").unwrap());
        assert_eq!(store.load_tournament("Spring Open").unwrap(), None);
    }

    #[test]
    fn test_json_store_reports_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("players.json"), "{not json").unwrap();
        let store = JsonStore::new(temp_dir.path());
        assert!(matches!(store.load_players(), Err(StoreError::Json { .. })));
    }

    #[test]
    fn test_memory_store_fail_saves() {
        let mut store = MemoryStore::new();
        store.save_tournament(&sample_tournament("A")).unwrap();
        store.set_fail_saves(true);
        assert!(store.save_tournament(&sample_tournament("B")).is_err());
        assert!(store.save_players(&[]).is_err());
        assert_eq!(store.load_tournaments().unwrap().len(), 1);
    }
}
