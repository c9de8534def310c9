//! OAuth redirect handling.
//!
//! The provider sends the browser back to `/callback` with either `code` or
//! `error` / `error_description`. [`CallbackHandler::handle`] turns that into
//! exactly one exchange and one session update per redirect, then navigates
//! away with history replacement so the redirect URL cannot be revisited.

use crate::idempotency::{CallbackLedger, Claim};
use crate::messages;
use crate::ports::{NavigationMode, Notification, Route};
use crate::session::SessionManager;
use crate::AuthError;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::form_urlencoded;
use url::Url;

const DEFAULT_NAVIGATION_DELAY: Duration = Duration::from_millis(100);

/// Query parameters of the redirect. Empty values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Parse a raw query string, with or without the leading `?`.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self::from_pairs(form_urlencoded::parse(query.as_bytes()))
    }

    pub fn from_url(url: &Url) -> Self {
        Self::from_pairs(url.query_pairs())
    }

    fn from_pairs(pairs: form_urlencoded::Parse<'_>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_ref() {
                "code" => &mut params.code,
                "error" => &mut params.error,
                "error_description" => &mut params.error_description,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }

    pub fn is_denial(&self) -> bool {
        self.error.is_some() || self.error_description.is_some()
    }

    /// Key identifying this redirect in the processed ledger.
    pub fn idempotency_key(&self) -> String {
        match (&self.code, &self.error, &self.error_description) {
            (Some(code), _, _) => format!("code:{}", code),
            (None, None, None) => "none".to_string(),
            (None, error, description) => format!(
                "error:{}|{}",
                error.as_deref().unwrap_or_default(),
                description.as_deref().unwrap_or_default()
            ),
        }
    }

    fn denial_message(&self) -> String {
        self.error_description
            .as_deref()
            .or(self.error.as_deref())
            .unwrap_or(messages::AUTHORIZATION_DENIED)
            .to_string()
    }
}

/// What a redirect resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Session established; navigated to the dashboard.
    Completed { username: String },
    /// The provider reported an error; no exchange was attempted.
    Denied { message: String },
    /// Neither a code nor an error was present.
    MissingCode,
    /// The exchange or the session update failed.
    Failed { message: String },
    /// This redirect was already handled; nothing was done.
    AlreadyProcessed,
}

impl CallbackOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CallbackOutcome::Completed { .. })
    }
}

/// One-shot controller for the provider redirect.
pub struct CallbackHandler {
    manager: Arc<SessionManager>,
    ledger: Mutex<CallbackLedger>,
    navigation_delay: Duration,
}

impl CallbackHandler {
    pub fn new(manager: Arc<SessionManager>) -> Self {
        Self {
            manager,
            ledger: Mutex::new(CallbackLedger::new()),
            navigation_delay: DEFAULT_NAVIGATION_DELAY,
        }
    }

    /// Pause between establishing the session and navigating to the dashboard.
    pub fn with_navigation_delay(mut self, delay: Duration) -> Self {
        self.navigation_delay = delay;
        self
    }

    /// Process a redirect. Re-invocation with the same parameters returns
    /// [`CallbackOutcome::AlreadyProcessed`] without side effects.
    pub async fn handle(&self, params: &CallbackParams) -> CallbackOutcome {
        let key = params.idempotency_key();
        let claim = self.ledger.lock().claim(&key);
        if claim != Claim::Acquired {
            debug!(?claim, "Callback already processed, skipping");
            return CallbackOutcome::AlreadyProcessed;
        }

        let outcome = self.process(params).await;
        self.ledger.lock().finish(&key);
        outcome
    }

    async fn process(&self, params: &CallbackParams) -> CallbackOutcome {
        if params.is_denial() {
            let message = params.denial_message();
            warn!(
                error = params.error.as_deref().unwrap_or_default(),
                "Provider denied authorization"
            );
            let message = self.fail_home(AuthError::ProviderDenial(message));
            return CallbackOutcome::Denied { message };
        }

        let Some(code) = params.code.as_deref() else {
            warn!("Callback without authorization code");
            self.fail_home(AuthError::MissingAuthorizationCode);
            return CallbackOutcome::MissingCode;
        };

        debug!(code_len = code.len(), "Exchanging authorization code");
        let result = match self.manager.exchange().exchange_code(code).await {
            Ok(record) => {
                let username = record.username().to_string();
                self.manager.complete(record).map(|()| username)
            }
            Err(e) => Err(AuthError::from(e)),
        };

        match result {
            Ok(username) => {
                info!(username = %username, "Authentication completed");
                self.manager
                    .notifier()
                    .notify(Notification::success(messages::welcome(&username)));
                if !self.navigation_delay.is_zero() {
                    tokio::time::sleep(self.navigation_delay).await;
                }
                self.manager
                    .navigator()
                    .navigate(Route::Dashboard, NavigationMode::Replace);
                CallbackOutcome::Completed { username }
            }
            Err(e) => {
                warn!(error = %e, "Authentication callback failed");
                let message = self.fail_home(e);
                CallbackOutcome::Failed { message }
            }
        }
    }

    /// Notify the failure and leave the callback page for home.
    fn fail_home(&self, error: AuthError) -> String {
        let message = error.user_message();
        self.manager
            .notifier()
            .notify(Notification::error(message.clone()));
        self.manager
            .navigator()
            .navigate(Route::Home, NavigationMode::Replace);
        message
    }
}
