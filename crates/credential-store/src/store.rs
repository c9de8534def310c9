//! The single persisted session slot.

use crate::{SessionRecord, SessionStorage, StorageError, StorageKeys, StorageResult};
use std::sync::Arc;
use tracing::{debug, warn};

/// Reads, writes and purges the persisted [`SessionRecord`].
///
/// `load` never fails: unreadable, unparseable or structurally invalid data
/// is reported as "no session", and anything that was actually read but
/// rejected is purged so it is not seen again.
#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn SessionStorage>,
    key: String,
}

impl CredentialStore {
    /// Store using the default [`StorageKeys::SESSION_RECORD`] slot.
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self::with_key(storage, StorageKeys::SESSION_RECORD)
    }

    pub fn with_key(storage: Arc<dyn SessionStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the persisted record, purging it when it is invalid.
    pub fn load(&self) -> Option<SessionRecord> {
        let raw = match self.storage.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to read persisted session");
                return None;
            }
        };

        match SessionRecord::from_json(&raw) {
            Ok(record) => {
                debug!(key = %self.key, username = %record.username(), "Loaded persisted session");
                Some(record)
            }
            Err(e) => {
                warn!(key = %self.key, reason = %e, "Discarding invalid persisted session");
                if let Err(purge_error) = self.storage.delete(&self.key) {
                    warn!(key = %self.key, error = %purge_error, "Failed to purge invalid session");
                }
                None
            }
        }
    }

    /// Overwrite the slot with `record` (last write wins).
    pub fn save(&self, record: &SessionRecord) -> StorageResult<()> {
        let json = record
            .to_json()
            .map_err(|e| StorageError::Encoding(e.to_string()))?;
        self.storage.set(&self.key, &json)?;
        debug!(key = %self.key, username = %record.username(), "Persisted session");
        Ok(())
    }

    /// Remove the slot. Removing an empty slot succeeds.
    pub fn clear(&self) -> StorageResult<()> {
        let existed = self.storage.delete(&self.key)?;
        debug!(key = %self.key, existed, "Cleared persisted session");
        Ok(())
    }

    /// Whether anything at all is stored in the slot, valid or not.
    pub fn has_persisted(&self) -> StorageResult<bool> {
        self.storage.has(&self.key)
    }
}
