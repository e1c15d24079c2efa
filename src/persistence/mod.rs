//! Durable storage for the progression record
//!
//! Features:
//! - Plain JSON document, unknown or missing fields tolerated
//! - Atomic replace on save (write tmp, then rename over the record)
//! - Missing record reads as a fresh profile

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::progression::Progression;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("progress store I/O failed: {0}")]
    Io(#[from] io::Error),
    #[error("progress record is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Where the progression record lives between rounds
pub trait ProgressStore {
    fn load(&self) -> Result<Progression, StoreError>;
    fn save(&mut self, progress: &Progression) -> Result<(), StoreError>;

    /// Load, falling back to a fresh profile when the record is unreadable
    fn load_or_default(&self) -> Progression {
        self.load().unwrap_or_else(|e| {
            log::warn!("{e}, starting with a fresh profile");
            Progression::default()
        })
    }
}

/// JSON file on disk
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl ProgressStore for JsonFileStore {
    fn load(&self) -> Result<Progression, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(json) => {
                let progress: Progression = serde_json::from_str(&json)?;
                log::info!(
                    "Loaded progress: {} coins, {} games",
                    progress.coins,
                    progress.games_played
                );
                Ok(progress)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!("No saved progress at {}, starting fresh", self.path.display());
                Ok(Progression::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save(&mut self, progress: &Progression) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(progress)?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.tmp_path();
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        log::info!("Progress saved to {}", self.path.display());
        Ok(())
    }
}

/// In-process store, kept as serialized JSON so it behaves like the file store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    json: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: impl Into<String>) -> Self {
        Self {
            json: Some(json.into()),
        }
    }
}

impl ProgressStore for MemoryStore {
    fn load(&self) -> Result<Progression, StoreError> {
        match &self.json {
            Some(json) => Ok(serde_json::from_str(json)?),
            None => Ok(Progression::default()),
        }
    }

    fn save(&mut self, progress: &Progression) -> Result<(), StoreError> {
        self.json = Some(serde_json::to_string(progress)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::UpgradeKind;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("storm-arena-test-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_missing_file_is_fresh_profile() {
        let store = JsonFileStore::new(scratch("missing/progress.json"));
        assert_eq!(store.load().unwrap(), Progression::default());
    }

    #[test]
    fn test_file_store_save_then_load() {
        let path = scratch("saved/progress.json");
        let mut store = JsonFileStore::new(&path);
        let mut progress = Progression {
            coins: 100,
            ..Default::default()
        };
        progress.buy(UpgradeKind::Health).unwrap();
        progress.record_round(false, 20);

        store.save(&progress).unwrap();
        assert!(!store.tmp_path().exists());
        assert_eq!(JsonFileStore::new(&path).load().unwrap(), progress);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let path = scratch("corrupt/progress.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Corrupt(_))));
        assert_eq!(store.load_or_default(), Progression::default());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.load().unwrap(), Progression::default());

        let progress = Progression {
            coins: 7,
            deaths: 2,
            ..Default::default()
        };
        store.save(&progress).unwrap();
        assert_eq!(store.load().unwrap(), progress);

        let legacy = MemoryStore::from_json(r#"{"coins": 3, "unknown": true}"#);
        assert_eq!(legacy.load().unwrap().coins, 3);
    }
}
