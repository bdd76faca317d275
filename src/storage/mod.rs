//! Local filesystem storage.
//!
//! Layout under the data directory:
//! - `live/live_tournament.json`: the single in-progress tournament
//! - `archive/`: `index.json` plus one JSON file per finished tournament
//! - `exports/`: tournaments exported from the live session
//! - `cache/`: bodies fetched from a remote archive
//! - `decks.json`: the deck catalog

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::models::Tournament;

mod live;

pub use live::{JsonFileLiveStore, LiveStore, MemoryLiveStore};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Store lock poisoned")]
    Poisoned,
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

    pub fn live_dir(&self) -> PathBuf {
        self.data_dir.join("live")
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.data_dir.join("archive")
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join("exports")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.data_dir.join("decks.json")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// Read a JSON file, mapping a missing file to [`StorageError::PathNotFound`].
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    if !path.exists() {
        return Err(StorageError::PathNotFound(path.to_path_buf()));
    }
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Write `t` as pretty JSON to `<dir>/<id>.json` and return the path.
///
/// The file is self-contained: it carries the tournament's own deck snapshot.
pub fn export_tournament(t: &Tournament, dir: &Path) -> Result<PathBuf, StorageError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.json", t.id));
    let json = serde_json::to_string_pretty(t)?;
    fs::write(&path, json)?;

    info!(
        "Exported {} ({} players, {} rounds) to {:?}",
        t.id,
        t.players.len(),
        t.rounds.len(),
        path
    );
    Ok(path)
}
