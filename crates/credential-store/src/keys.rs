//! Storage key constants.

/// Storage keys used by the client
pub struct StorageKeys;

impl StorageKeys {
    /// The persisted session record (JSON)
    pub const SESSION_RECORD: &'static str = client_config_and_utils::DEFAULT_STORAGE_KEY;
}
