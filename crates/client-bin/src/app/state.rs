//! Client state definition.

use super::spawn_event_logger;
use crate::output::OutputFormat;
use crate::terminal::{TerminalNavigator, TerminalNotifier};
use client_config_and_utils::{Config, Paths};
use credential_store::{CredentialStore, FileStorage};
use oauth_exchange::ExchangeClient;
use session_auth::{CallbackHandler, SessionManager};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Everything a command needs, with the session already resolved.
pub struct AppState {
    pub config: Arc<Config>,
    pub paths: Arc<Paths>,
    pub format: OutputFormat,
    pub manager: Arc<SessionManager>,
    pub navigator: Arc<TerminalNavigator>,
    event_logger: JoinHandle<()>,
}

impl AppState {
    pub async fn init(
        config: Config,
        paths: Paths,
        format: OutputFormat,
        open_browser: bool,
    ) -> anyhow::Result<Self> {
        paths.ensure_dirs()?;

        let storage = Arc::new(FileStorage::open(&paths));
        let store = CredentialStore::with_key(storage, config.storage_key.clone());
        let exchange = Arc::new(ExchangeClient::new(config.proxy_url()?));
        let notifier = Arc::new(TerminalNotifier::new(format));
        let navigator = Arc::new(TerminalNavigator::new(format, open_browser));

        let manager = Arc::new(SessionManager::new(
            store,
            exchange,
            notifier,
            navigator.clone(),
        ));
        let event_logger = spawn_event_logger(&manager);

        let status = manager.initialize().await;
        debug!(%status, "Session resolved");

        Ok(Self {
            config: Arc::new(config),
            paths: Arc::new(paths),
            format,
            manager,
            navigator,
            event_logger,
        })
    }

    /// Drop the session manager and wait until every queued transition has
    /// been logged.
    pub async fn shutdown(self) {
        let Self {
            manager,
            event_logger,
            ..
        } = self;
        drop(manager);
        if let Err(e) = event_logger.await {
            debug!(error = %e, "Event logger task ended abnormally");
        }
    }

    pub fn callback_handler(&self) -> CallbackHandler {
        CallbackHandler::new(self.manager.clone())
            .with_navigation_delay(self.config.callback_navigation_delay())
    }
}
