use session_auth::SessionManager;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Log every session transition until the manager is dropped.
pub fn spawn_event_logger(manager: &SessionManager) -> JoinHandle<()> {
    let mut events = manager.subscribe_events();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => info!(
                    state = %event.state,
                    previous = %event.previous,
                    username = event.username.as_deref().unwrap_or_default(),
                    changed_at = %event.changed_at,
                    "Session state changed"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Session event logger lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
