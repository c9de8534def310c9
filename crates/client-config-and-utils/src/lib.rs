//! Configuration, paths and logging setup for the pinsched client.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_CALLBACK_NAVIGATION_DELAY_MS, DEFAULT_LOG_LEVEL, DEFAULT_PROXY_URL,
    DEFAULT_STORAGE_KEY,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
