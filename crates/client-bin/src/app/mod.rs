//! Application wiring.

mod events;
mod state;

pub use events::spawn_event_logger;
pub use state::AppState;
