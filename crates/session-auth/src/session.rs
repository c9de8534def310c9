//! Session management with an explicit FSM.
//!
//! `SessionManager` owns the in-memory session, mirrors it to the
//! [`CredentialStore`], and publishes every change on a `watch` channel (for
//! route guards) and a `broadcast` channel (for loggers).
//!
//! Async operations (initial load, initiate, refresh) remember the generation
//! they started under. Every mutation bumps the generation, so a completion
//! that resolves after logout or a newer login is discarded instead of
//! resurrecting stale state.

use crate::messages;
use crate::ports::{Navigator, Notification, Notifier};
use crate::session_fsm::{
    RefreshConfig, SessionMachine, SessionMachineInput, SessionState, SessionStateChangedPayload,
    SessionStatus,
};
use crate::{AuthError, AuthResult};
use chrono::Utc;
use credential_store::{CredentialStore, SessionRecord};
use oauth_exchange::OAuthExchange;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};
use url::Url;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Result of [`SessionManager::initiate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitiateOutcome {
    /// The navigator was sent to the provider's authorization page.
    Redirected(Url),
    /// The authorization URL could not be obtained; the user was notified.
    Failed,
    /// A newer operation changed the session while the URL was being fetched.
    Superseded,
    /// Not accepted in the current state (only `Unauthenticated` may initiate).
    Ignored,
}

/// Result of [`SessionManager::refresh`]. Refresh never notifies the user
/// and never ends the session; the caller picks the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Refreshed,
    NotAuthenticated,
    NoRefreshToken,
    Failed { transient: bool },
    /// The session changed while the request was in flight.
    Discarded,
}

struct Inner {
    fsm: SessionMachine,
    record: Option<SessionRecord>,
    generation: u64,
    initialized: bool,
}

impl Inner {
    fn status(&self) -> SessionStatus {
        SessionStatus::from(self.fsm.state())
    }

    fn state(&self) -> SessionState {
        match (self.status(), &self.record) {
            (SessionStatus::Authenticated, Some(record)) => SessionState::Authenticated(record.clone()),
            (SessionStatus::Loading, _) => SessionState::Loading,
            _ => SessionState::Unauthenticated,
        }
    }
}

/// Owner of the client's session lifecycle.
pub struct SessionManager {
    store: CredentialStore,
    exchange: Arc<dyn OAuthExchange>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<SessionState>,
    events_tx: broadcast::Sender<SessionStateChangedPayload>,
}

impl SessionManager {
    /// Create a manager in the `Loading` state. Call [`initialize`](Self::initialize)
    /// (or use [`start`](Self::start)) to resolve the persisted session.
    pub fn new(
        store: CredentialStore,
        exchange: Arc<dyn OAuthExchange>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Loading);
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            store,
            exchange,
            notifier,
            navigator,
            inner: Mutex::new(Inner {
                fsm: SessionMachine::new(),
                record: None,
                generation: 0,
                initialized: false,
            }),
            state_tx,
            events_tx,
        }
    }

    /// Wrap the manager in an `Arc` and resolve the persisted session in the
    /// background. Must be called inside a Tokio runtime.
    pub fn start(self) -> Arc<Self> {
        let manager = Arc::new(self);
        let background = Arc::clone(&manager);
        tokio::spawn(async move {
            background.initialize().await;
        });
        manager
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state()
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.lock().status()
    }

    pub fn is_authenticated(&self) -> bool {
        self.status().is_authenticated()
    }

    pub fn is_loading(&self) -> bool {
        self.status().is_transient()
    }

    /// The held record, present iff authenticated.
    pub fn record(&self) -> Option<SessionRecord> {
        self.state().record().cloned()
    }

    /// Receiver that always holds the latest [`SessionState`].
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Receiver for one event per transition.
    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionStateChangedPayload> {
        self.events_tx.subscribe()
    }

    pub(crate) fn exchange(&self) -> Arc<dyn OAuthExchange> {
        Arc::clone(&self.exchange)
    }

    pub(crate) fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::clone(&self.notifier)
    }

    pub(crate) fn navigator(&self) -> Arc<dyn Navigator> {
        Arc::clone(&self.navigator)
    }

    /// Apply `input`, replace the held record and publish the result.
    fn transition(
        &self,
        inner: &mut Inner,
        input: &SessionMachineInput,
        record: Option<SessionRecord>,
    ) -> AuthResult<SessionState> {
        let previous = inner.status();

        inner.fsm.consume(input).map_err(|_| {
            AuthError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                inner.fsm.state()
            ))
        })?;

        let status = inner.status();
        inner.record = if status.is_authenticated() { record } else { None };
        inner.generation += 1;

        let state = inner.state();
        debug!(
            old_state = %previous,
            new_state = %status,
            generation = inner.generation,
            "Session state transition"
        );

        self.state_tx.send_replace(state.clone());
        let _ = self.events_tx.send(SessionStateChangedPayload {
            state: status,
            previous,
            username: state.record().map(|r| r.username().to_string()),
            changed_at: Utc::now(),
        });

        Ok(state)
    }

    /// Resolve the persisted session. Runs once per manager; later calls,
    /// and calls after any explicit operation, return the current status.
    pub async fn initialize(&self) -> SessionStatus {
        let generation = {
            let mut inner = self.inner.lock();
            if inner.initialized {
                return inner.status();
            }
            inner.initialized = true;
            inner.generation
        };

        let store = self.store.clone();
        let loaded = match tokio::task::spawn_blocking(move || store.load()).await {
            Ok(loaded) => loaded,
            Err(e) => {
                error!(error = %e, "Session load task failed");
                None
            }
        };

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            debug!("Discarding stale initial session load");
            return inner.status();
        }

        let result = match loaded {
            Some(record) => {
                info!(username = %record.username(), "Restored persisted session");
                self.transition(&mut inner, &SessionMachineInput::RecordRestored, Some(record))
            }
            None => {
                info!("No persisted session");
                self.transition(&mut inner, &SessionMachineInput::NoRecord, None)
            }
        };
        if let Err(e) = result {
            error!(error = %e, "Failed to apply initial session state");
        }
        inner.status()
    }

    /// Start the provider login: fetch the authorization URL and hand it to
    /// the navigator. On failure the user is notified and the state returns
    /// to `Unauthenticated`.
    pub async fn initiate(&self) -> InitiateOutcome {
        let generation = {
            let mut inner = self.inner.lock();
            if let Err(e) =
                self.transition(&mut inner, &SessionMachineInput::AuthorizationRequested, None)
            {
                warn!(error = %e, "Ignoring login request");
                return InitiateOutcome::Ignored;
            }
            inner.initialized = true;
            inner.generation
        };

        match self.exchange.authorization_url().await {
            Ok(url) => {
                if self.inner.lock().generation != generation {
                    info!("Session changed while fetching authorization URL, not redirecting");
                    return InitiateOutcome::Superseded;
                }
                info!(host = ?url.host_str(), "Redirecting to provider");
                self.navigator.redirect_external(&url);
                InitiateOutcome::Redirected(url)
            }
            Err(e) => {
                error!(error = %e, "Failed to obtain authorization URL");
                {
                    let mut inner = self.inner.lock();
                    if inner.generation == generation {
                        if let Err(e) = self.transition(
                            &mut inner,
                            &SessionMachineInput::AuthorizationFailed,
                            None,
                        ) {
                            error!(error = %e, "Failed to leave loading state");
                        }
                    }
                }
                self.notifier.notify(Notification::error(messages::INITIATE_FAILED));
                InitiateOutcome::Failed
            }
        }
    }

    /// Establish a fresh session from an already-exchanged record.
    ///
    /// The record is persisted before the in-memory state changes; if
    /// persisting fails nothing changes and the error is returned.
    pub fn complete(&self, record: SessionRecord) -> AuthResult<()> {
        record.validate()?;

        let mut inner = self.inner.lock();
        self.store.save(&record)?;
        let username = record.username().to_string();
        self.transition(&mut inner, &SessionMachineInput::SessionEstablished, Some(record))?;
        inner.initialized = true;

        info!(username = %username, "Session established");
        Ok(())
    }

    /// Exchange the held refresh token for new token fields.
    ///
    /// On success only `token` fields change; the user is kept as is. On any
    /// failure the session is left untouched.
    pub async fn refresh(&self) -> RefreshOutcome {
        let (generation, current) = {
            let inner = self.inner.lock();
            match inner.state() {
                SessionState::Authenticated(record) => (inner.generation, record),
                _ => return RefreshOutcome::NotAuthenticated,
            }
        };

        let Some(refresh_token) = current.refresh_token().map(str::to_string) else {
            debug!("Session has no refresh token");
            return RefreshOutcome::NoRefreshToken;
        };

        let fragment = match self.exchange.refresh_token(&refresh_token).await {
            Ok(fragment) => fragment,
            Err(e) => {
                let transient = e.is_transient();
                warn!(error = %e, transient, "Token refresh failed");
                return RefreshOutcome::Failed { transient };
            }
        };

        let updated = current.with_token_fragment(&fragment);
        if let Err(e) = updated.validate() {
            warn!(error = %e, "Refreshed token is invalid, keeping current session");
            return RefreshOutcome::Failed { transient: false };
        }

        let mut inner = self.inner.lock();
        if inner.generation != generation || !inner.status().is_authenticated() {
            info!("Session changed during refresh, discarding result");
            return RefreshOutcome::Discarded;
        }
        if let Err(e) = self.store.save(&updated) {
            warn!(error = %e, "Failed to persist refreshed token");
            return RefreshOutcome::Failed { transient: false };
        }
        if let Err(e) = self.transition(&mut inner, &SessionMachineInput::TokenRefreshed, Some(updated)) {
            error!(error = %e, "Failed to apply refreshed token");
            return RefreshOutcome::Failed { transient: false };
        }

        info!(username = %current.username(), "Session token refreshed");
        RefreshOutcome::Refreshed
    }

    /// [`refresh`](Self::refresh) with exponential backoff on transient
    /// failures. Stops at the first non-retryable outcome.
    pub async fn refresh_with_backoff(&self, config: &RefreshConfig) -> RefreshOutcome {
        let attempts = config.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            let outcome = self.refresh().await;
            let retry = matches!(outcome, RefreshOutcome::Failed { transient: true })
                && attempt + 1 < attempts;
            if !retry {
                return outcome;
            }

            let delay = config.delay_for_attempt(attempt);
            debug!(
                attempt = attempt + 1,
                max_attempts = attempts,
                delay_ms = delay.as_millis() as u64,
                "Refresh failed with transient error, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// End the session: clear storage, drop the in-memory record and notify
    /// the user. Safe to call in any state, including when already logged out.
    pub fn terminate(&self) {
        {
            let mut inner = self.inner.lock();
            if let Err(e) = self.store.clear() {
                warn!(error = %e, "Failed to clear persisted session");
            }
            if let Err(e) = self.transition(&mut inner, &SessionMachineInput::SessionTerminated, None) {
                error!(error = %e, "Failed to apply logout");
            }
            inner.initialized = true;
        }

        info!("Logged out");
        self.notifier.notify(Notification::success(messages::LOGGED_OUT));
    }
}
