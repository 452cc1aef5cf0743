//! League persistence.
//!
//! Handles reading and writing the league data directory:
//! - One JSONL file per entity kind (games, players, titles, tiebreakers)
//! - The in-memory [`LeagueStore`] that serves every read

pub mod jsonl;
mod store;

pub use jsonl::{JsonlReader, JsonlWriter};
pub use store::{LeagueSnapshot, LeagueStore};

use std::path::PathBuf;
use thiserror::Error;

use crate::models::ValidationError;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt record at {path:?} line {line}: {source}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error("League store lock poisoned")]
    Poisoned,
}

impl From<ValidationError> for StorageError {
    fn from(err: ValidationError) -> Self {
        StorageError::Invalid(err.to_string())
    }
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn games_path(&self) -> PathBuf {
        self.data_dir.join("games.jsonl")
    }

    pub fn players_path(&self) -> PathBuf {
        self.data_dir.join("players.jsonl")
    }

    pub fn titles_path(&self) -> PathBuf {
        self.data_dir.join("titles.jsonl")
    }

    pub fn tiebreakers_path(&self) -> PathBuf {
        self.data_dir.join("tiebreakers.jsonl")
    }

    pub fn last_ids_path(&self) -> PathBuf {
        self.data_dir.join("last_ids.jsonl")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_paths() {
        let config = StorageConfig::new(PathBuf::from("/data"));

        assert_eq!(config.games_path(), PathBuf::from("/data/games.jsonl"));
        assert_eq!(config.players_path(), PathBuf::from("/data/players.jsonl"));
        assert_eq!(config.titles_path(), PathBuf::from("/data/titles.jsonl"));
        assert_eq!(
            config.tiebreakers_path(),
            PathBuf::from("/data/tiebreakers.jsonl")
        );
        assert_eq!(config.last_ids_path(), PathBuf::from("/data/last_ids.jsonl"));
    }

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn test_validation_error_becomes_invalid() {
        let err: StorageError = ValidationError::NoWinners.into();
        assert!(matches!(err, StorageError::Invalid(ref msg) if msg.contains("winner")));
    }

    #[test]
    fn test_not_found_display() {
        let err = StorageError::NotFound {
            kind: "player",
            id: 42,
        };
        assert_eq!(err.to_string(), "player 42 not found");
    }
}
