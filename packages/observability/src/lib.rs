//! # Observability
//!
//! Logging setup shared by every pinsched binary.
//!
//! Crates are **log producers** only. They use the standard `tracing` macros
//! and never decide where output goes. The binary calls
//! [`init_with_config`] once at startup, which installs:
//!
//! - a JSONL layer appending to `~/.pinsched/logs/client.jsonl` ([`LogFile`])
//! - an optional compact stderr layer for interactive use
//!
//! Fields whose names look like credentials (`access_token`, `refresh_token`,
//! `authorization`, ...) are redacted before they reach the file.
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "pinsched".into(),
//!     default_level: "debug".into(),
//!     also_stderr: true,
//!     ..Default::default()
//! });
//! tracing::info!("ready");
//! ```

mod file_writer;
mod json_layer;

use std::path::PathBuf;

pub use file_writer::LogFile;
pub use json_layer::{JsonLayer, LogEntry};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, included in every log line.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional custom log file path.
    /// Defaults to `~/.pinsched/logs/client.jsonl`.
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr for immediate feedback.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

/// Central log file location, `None` when no home directory is available.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".pinsched").join("logs").join("client.jsonl"))
}

/// Initialize logging with custom configuration.
///
/// Safe to call more than once: later calls are ignored. When the log file
/// cannot be opened the JSONL layer is skipped and a warning is emitted
/// through whatever layers remain.
pub fn init_with_config(config: LogConfig) {
    let log_path = config.log_path.clone().or_else(default_log_path);

    let (json_layer, open_error) = match log_path.as_ref().map(LogFile::open) {
        Some(Ok(log_file)) => (
            Some(
                JsonLayer::new(config.service_name.clone(), log_file)
                    .with_filter(env_filter(&config.default_level)),
            ),
            None,
        ),
        Some(Err(e)) => (None, Some(e)),
        None => (None, None),
    };

    let stderr_layer = config.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(std::io::stderr)
            .with_filter(env_filter(&config.default_level))
    });

    let installed = tracing_subscriber::registry()
        .with(json_layer)
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if !installed {
        return;
    }

    match (log_path, open_error) {
        (Some(path), Some(e)) => tracing::warn!(
            log_path = %path.display(),
            error = %e,
            "failed to open log file, file logging disabled"
        ),
        (Some(path), None) => tracing::debug!(
            log_path = %path.display(),
            service = %config.service_name,
            "observability initialized"
        ),
        (None, _) => tracing::debug!("no home directory, file logging disabled"),
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}
