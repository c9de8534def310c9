//! File-backed storage: one JSON object of key to string value.
//!
//! Writes go to a sibling temp file that is then renamed over the original,
//! so readers see either the old map or the new one.

use crate::{SessionStorage, StorageError, StorageResult};
use client_config_and_utils::Paths;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

type StorageMap = BTreeMap<String, String>;

/// Persistent storage at a single JSON file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// Storage at an explicit path. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Storage at the client's default location (`<base_dir>/local_storage.json`).
    pub fn open(paths: &Paths) -> Self {
        Self::new(paths.storage_file())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> StorageResult<StorageMap> {
        if !self.path.exists() {
            return Ok(StorageMap::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(StorageMap::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            StorageError::Encoding(format!("{}: {}", self.path.display(), e))
        })
    }

    /// Map to modify for a write. An unreadable file is replaced rather than
    /// blocking every future write.
    fn read_map_for_write(&self) -> StorageResult<StorageMap> {
        match self.read_map() {
            Err(StorageError::Encoding(reason)) => {
                warn!(path = %self.path.display(), reason = %reason, "Replacing unreadable storage file");
                Ok(StorageMap::new())
            }
            other => other,
        }
    }

    fn write_map(&self, map: &StorageMap) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(map)
            .map_err(|e| StorageError::Encoding(e.to_string()))?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.lock.lock();
        let mut map = self.read_map_for_write()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)?;
        debug!(key = %key, path = %self.path.display(), "Stored value");
        Ok(())
    }

    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let _guard = self.lock.lock();
        Ok(self.read_map()?.get(key).cloned())
    }

    fn delete(&self, key: &str) -> StorageResult<bool> {
        let _guard = self.lock.lock();
        let mut map = match self.read_map() {
            Ok(map) => map,
            Err(StorageError::Encoding(reason)) => {
                // Nothing readable survives, so the slot is gone either way.
                warn!(path = %self.path.display(), reason = %reason, "Resetting unreadable storage file");
                self.write_map(&StorageMap::new())?;
                return Ok(false);
            }
            Err(e) => return Err(e),
        };
        if map.remove(key).is_none() {
            return Ok(false);
        }
        self.write_map(&map)?;
        debug!(key = %key, path = %self.path.display(), "Deleted value");
        Ok(true)
    }
}
