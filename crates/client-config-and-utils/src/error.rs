//! Errors raised while resolving client configuration and paths.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// A configuration value failed validation.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid proxy URL: {0}")]
    InvalidProxyUrl(#[from] url::ParseError),

    /// The proxy URL parsed but is not http(s).
    #[error("Proxy URL must use http or https, got {0}")]
    UnsupportedProxyScheme(String),

    /// No home directory and no explicit `--base-dir`.
    #[error("Could not determine home directory")]
    HomeDirNotFound,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file exists but is not valid JSON for [`crate::Config`].
    #[error("Malformed config file: {0}")]
    Json(#[from] serde_json::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
