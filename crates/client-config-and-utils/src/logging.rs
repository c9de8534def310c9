//! Logging initialization for the client.
//!
//! Thin wrapper over the observability crate: structured JSONL goes to
//! `<base_dir>/logs/client.jsonl`, stderr output is opt-in through
//! `PINSCHED_LOG_TO_STDERR`.

use std::path::PathBuf;

/// Initialize the logging system.
///
/// `level` is the default filter; `RUST_LOG` takes precedence when set.
/// `log_path` overrides the default `~/.pinsched/logs/client.jsonl`.
pub fn init_logging(level: &str, log_path: Option<PathBuf>) {
    let also_stderr = std::env::var("PINSCHED_LOG_TO_STDERR")
        .map(|raw| is_truthy(&raw))
        .unwrap_or(false);

    observability::init_with_config(observability::LogConfig {
        service_name: "pinsched".into(),
        default_level: parse_level(level).to_string().to_lowercase(),
        log_path,
        also_stderr,
    });
}

fn is_truthy(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
