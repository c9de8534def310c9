//! File system paths for the client.

use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Manages file system paths for the client.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for client files (~/.pinsched)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.pinsched`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir().ok_or(CoreError::HomeDirNotFound)?;

        Ok(Self {
            base_dir: home.join(".pinsched"),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the base directory (~/.pinsched).
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Get the config file path (~/.pinsched/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the persisted key/value storage file (~/.pinsched/local_storage.json).
    pub fn storage_file(&self) -> PathBuf {
        self.base_dir.join("local_storage.json")
    }

    /// Get the logs directory (~/.pinsched/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the client log file path (~/.pinsched/logs/client.jsonl).
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join("client.jsonl")
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
