//! Persistent storage for the pinsched session record.
//!
//! This crate provides:
//! - The [`SessionStorage`] trait, a synchronous string key/value seam
//!   standing in for the browser's `localStorage`
//! - [`MemoryStorage`] and the file-backed [`FileStorage`] backends
//! - The [`SessionRecord`] data model and its structural validation
//! - [`CredentialStore`], which owns the single persisted session slot

mod file;
mod keys;
mod memory;
mod record;
mod store;
mod traits;

pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use record::{RecordError, SessionRecord, TokenFragment, TokenSet, UserProfile};
pub use store::CredentialStore;
pub use traits::SessionStorage;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend-specific failure
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
