//! Persistence port for the single in-progress tournament.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use super::{StorageConfig, StorageError};
use crate::models::Tournament;

const LIVE_FILE: &str = "live_tournament.json";

/// Load/save/clear of one tournament blob.
pub trait LiveStore: Send + Sync {
    /// `Ok(None)` when nothing is stored.
    fn load(&self) -> Result<Option<Tournament>, StorageError>;

    fn save(&self, t: &Tournament) -> Result<(), StorageError>;

    fn clear(&self) -> Result<(), StorageError>;
}

impl<T: LiveStore + ?Sized> LiveStore for Arc<T> {
    fn load(&self) -> Result<Option<Tournament>, StorageError> {
        (**self).load()
    }

    fn save(&self, t: &Tournament) -> Result<(), StorageError> {
        (**self).save(t)
    }

    fn clear(&self) -> Result<(), StorageError> {
        (**self).clear()
    }
}

impl<T: LiveStore + ?Sized> LiveStore for Box<T> {
    fn load(&self) -> Result<Option<Tournament>, StorageError> {
        (**self).load()
    }

    fn save(&self, t: &Tournament) -> Result<(), StorageError> {
        (**self).save(t)
    }

    fn clear(&self) -> Result<(), StorageError> {
        (**self).clear()
    }
}

/// Stores the live tournament as one JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileLiveStore {
    path: PathBuf,
}

impl JsonFileLiveStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `<data_dir>/live/live_tournament.json`
    pub fn in_data_dir(config: &StorageConfig) -> Self {
        Self::new(config.live_dir().join(LIVE_FILE))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl LiveStore for JsonFileLiveStore {
    /// A blob that no longer parses is treated as absent.
    fn load(&self) -> Result<Option<Tournament>, StorageError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)?;
        match serde_json::from_str(&contents) {
            Ok(t) => Ok(Some(t)),
            Err(e) => {
                warn!("Ignoring unreadable live tournament at {:?}: {}", self.path, e);
                Ok(None)
            }
        }
    }

    fn save(&self, t: &Tournament) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // write-then-rename
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string(t)?)?;
        fs::rename(&tmp, &self.path)?;

        debug!("Saved live tournament {} to {:?}", t.id, self.path);
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory store for tests and ephemeral servers.
#[derive(Debug, Default)]
pub struct MemoryLiveStore {
    slot: Mutex<Option<Tournament>>,
}

impl MemoryLiveStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(t: Tournament) -> Self {
        Self {
            slot: Mutex::new(Some(t)),
        }
    }
}

impl MemoryLiveStore {
    fn slot(&self) -> Result<MutexGuard<'_, Option<Tournament>>, StorageError> {
        self.slot.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Panic while holding the lock so later calls see a poisoned slot.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = self.slot.lock();
            panic!("poisoning memory store");
        }));
        assert!(result.is_err());
    }
}

impl LiveStore for MemoryLiveStore {
    fn load(&self) -> Result<Option<Tournament>, StorageError> {
        Ok(self.slot()?.clone())
    }

    fn save(&self, t: &Tournament) -> Result<(), StorageError> {
        *self.slot()? = Some(t.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        *self.slot()? = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TournamentFormat;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample() -> Tournament {
        Tournament::new(
            "Weekly".to_string(),
            NaiveDate::from_ymd_opt(2026, 2, 3).unwrap(),
            TournamentFormat::default(),
        )
    }

    #[test]
    fn test_file_store_roundtrip() {
        let temp = TempDir::new().unwrap();
        let config = StorageConfig::new(temp.path().to_path_buf());
        let store = JsonFileLiveStore::in_data_dir(&config);

        assert!(store.load().unwrap().is_none());

        let t = sample();
        store.save(&t).unwrap();
        assert!(store.path().ends_with("live/live_tournament.json"));
        assert_eq!(store.load().unwrap(), Some(t));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_corrupt_blob_is_absent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("live.json");
        fs::write(&path, "{ not json").unwrap();

        let store = JsonFileLiveStore::new(path);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryLiveStore::new();
        assert!(store.load().unwrap().is_none());

        let t = sample();
        store.save(&t).unwrap();
        assert_eq!(store.load().unwrap().unwrap().id, t.id);

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());

        let seeded = MemoryLiveStore::with(sample());
        assert!(seeded.load().unwrap().is_some());
    }

    #[test]
    fn test_memory_store_poisoned_lock_is_an_error() {
        let store = MemoryLiveStore::with(sample());
        store.poison();

        assert!(matches!(store.load(), Err(StorageError::Poisoned)));
        assert!(matches!(store.save(&sample()), Err(StorageError::Poisoned)));
        assert!(matches!(store.clear(), Err(StorageError::Poisoned)));
    }
}
