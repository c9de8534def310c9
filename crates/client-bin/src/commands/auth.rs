//! Authentication commands.

use crate::app::AppState;
use crate::output;
use serde::Serialize;
use session_auth::{
    messages, CallbackOutcome, CallbackParams, InitiateOutcome, RefreshConfig, RefreshOutcome,
    SessionStatus,
};
use std::fmt;
use tracing::{debug, info};
use url::Url;

/// Start the provider login.
pub async fn login(state: &AppState) -> anyhow::Result<()> {
    if let Some(record) = state.manager.record() {
        output::print_success(
            &format!("Already logged in as {}", record.username()),
            state.format,
        );
        return Ok(());
    }

    match state.manager.initiate().await {
        InitiateOutcome::Redirected(_) => {
            output::print_success(
                "After authorizing, run `pinsched callback <redirect-url>` to finish logging in.",
                state.format,
            );
        }
        // The notifier already reported the failure.
        InitiateOutcome::Failed => {}
        InitiateOutcome::Superseded | InitiateOutcome::Ignored => {
            output::print_error("A login is already in progress", state.format);
        }
    }
    Ok(())
}

/// Redirect parameters given either as the full redirect URL / query string
/// or as individual flags.
#[derive(Debug, Default)]
pub struct CallbackArgs {
    pub redirect: Option<String>,
    pub code: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackArgs {
    fn into_params(self) -> CallbackParams {
        match self.redirect {
            Some(redirect) => match Url::parse(&redirect) {
                Ok(url) => CallbackParams::from_url(&url),
                Err(_) => CallbackParams::from_query(&redirect),
            },
            None => CallbackParams {
                code: non_empty(self.code),
                error: non_empty(self.error),
                error_description: non_empty(self.error_description),
            },
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Finish the login from the provider's redirect.
pub async fn callback(state: &AppState, args: CallbackArgs) -> anyhow::Result<()> {
    let params = args.into_params();
    let outcome = state.callback_handler().handle(&params).await;
    debug!(?outcome, "Callback handled");

    if let CallbackOutcome::Completed { username } = &outcome {
        info!(username = %username, "Logged in");
    }
    ensure_completed(&outcome)
}

/// Map a non-success callback outcome to the command's error.
fn ensure_completed(outcome: &CallbackOutcome) -> anyhow::Result<()> {
    match outcome {
        CallbackOutcome::Completed { .. } => Ok(()),
        CallbackOutcome::Denied { message } => anyhow::bail!("Login denied: {}", message),
        CallbackOutcome::MissingCode => anyhow::bail!(messages::NO_AUTHORIZATION_CODE),
        CallbackOutcome::Failed { message } => anyhow::bail!("Login failed: {}", message),
        CallbackOutcome::AlreadyProcessed => {
            anyhow::bail!("This redirect was already processed")
        }
    }
}

#[derive(Debug, Serialize)]
struct StatusView {
    state: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_in: Option<u64>,
    has_refresh_token: bool,
    storage_path: String,
}

impl fmt::Display for StatusView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", output::row("Status", self.state.as_str()))?;
        if let Some(username) = &self.username {
            writeln!(f, "{}", output::row("User", username))?;
        }
        if let Some(token_type) = &self.token_type {
            writeln!(f, "{}", output::row("Token type", token_type))?;
        }
        if let Some(expires_in) = self.expires_in {
            writeln!(f, "{}", output::row("Expires in", &format!("{}s", expires_in)))?;
        }
        writeln!(
            f,
            "{}",
            output::row(
                "Refresh token",
                if self.has_refresh_token { "yes" } else { "no" }
            )
        )?;
        write!(f, "{}", output::row("Storage", &self.storage_path))
    }
}

/// Show the current session.
pub async fn status(state: &AppState) -> anyhow::Result<()> {
    let record = state.manager.record();
    let view = StatusView {
        state: state.manager.status(),
        username: record.as_ref().map(|r| r.username().to_string()),
        token_type: record.as_ref().map(|r| r.token.token_type.clone()),
        expires_in: record.as_ref().map(|r| r.token.expires_in),
        has_refresh_token: record
            .as_ref()
            .and_then(|r| r.refresh_token())
            .is_some(),
        storage_path: state.paths.storage_file().display().to_string(),
    };
    output::print(&view, state.format);
    Ok(())
}

/// Refresh the access token, retrying transient failures up to `attempts` times.
pub async fn refresh(state: &AppState, attempts: u32) -> anyhow::Result<()> {
    let config = RefreshConfig {
        max_attempts: attempts,
        ..RefreshConfig::default()
    };

    match state.manager.refresh_with_backoff(&config).await {
        RefreshOutcome::Refreshed => output::print_success("Token refreshed", state.format),
        RefreshOutcome::NotAuthenticated => {
            output::print_error("Not logged in. Run `pinsched login` first.", state.format)
        }
        RefreshOutcome::NoRefreshToken => {
            output::print_error("This session has no refresh token", state.format)
        }
        RefreshOutcome::Failed { transient: true } => output::print_error(
            "Token refresh failed, the proxy is unavailable. Try again later.",
            state.format,
        ),
        RefreshOutcome::Failed { transient: false } => {
            output::print_error("Token refresh failed", state.format)
        }
        RefreshOutcome::Discarded => {
            output::print_error("The session changed during refresh", state.format)
        }
    }
    Ok(())
}

/// End the session.
pub async fn logout(state: &AppState) -> anyhow::Result<()> {
    state.manager.terminate();
    Ok(())
}
