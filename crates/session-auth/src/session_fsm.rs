//! Session state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//!               ┌─────────────────┐
//!               │     Loading     │ (initial)
//!               └───┬─────────┬───┘
//!  RecordRestored / │         │ NoRecord /
//!  SessionEstablished         │ AuthorizationFailed
//!                   ▼         ▼
//! ┌─────────────────┐         ┌─────────────────┐
//! │  Authenticated  │ ──────► │ Unauthenticated │
//! └─────────────────┘ Session └────────┬────────┘
//!   TokenRefreshed   Terminated        │ AuthorizationRequested
//!   (self loop)                        ▼
//!                                   Loading
//! ```
//!
//! `SessionEstablished` is accepted from every state; the callback can land
//! on a page whose initial load has not resolved yet.
//! `SessionTerminated` is accepted from every state.

use chrono::{DateTime, Utc};
use credential_store::SessionRecord;
use rust_fsm::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Loading)

    Loading => {
        RecordRestored => Authenticated,
        NoRecord => Unauthenticated,
        AuthorizationFailed => Unauthenticated,
        SessionEstablished => Authenticated,
        SessionTerminated => Unauthenticated
    },
    Unauthenticated => {
        AuthorizationRequested => Loading,
        SessionEstablished => Authenticated,
        SessionTerminated => Unauthenticated
    },
    Authenticated => {
        TokenRefreshed => Authenticated,
        SessionEstablished => Authenticated,
        SessionTerminated => Unauthenticated
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Tag-only view of the session state, for logs and event payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Loading,
    Authenticated,
    Unauthenticated,
}

impl SessionStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionStatus::Authenticated)
    }

    /// Loading is the only state without a definitive answer.
    pub fn is_transient(&self) -> bool {
        matches!(self, SessionStatus::Loading)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Loading => "loading",
            SessionStatus::Authenticated => "authenticated",
            SessionStatus::Unauthenticated => "unauthenticated",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&SessionMachineState> for SessionStatus {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Loading => SessionStatus::Loading,
            SessionMachineState::Authenticated => SessionStatus::Authenticated,
            SessionMachineState::Unauthenticated => SessionStatus::Unauthenticated,
        }
    }
}

/// Externally observable session state. Only `Authenticated` carries a
/// record, so "authenticated without a record" cannot be represented.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Loading,
    Authenticated(SessionRecord),
    Unauthenticated,
}

impl SessionState {
    pub fn status(&self) -> SessionStatus {
        match self {
            SessionState::Loading => SessionStatus::Loading,
            SessionState::Authenticated(_) => SessionStatus::Authenticated,
            SessionState::Unauthenticated => SessionStatus::Unauthenticated,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SessionState::Loading)
    }

    pub fn record(&self) -> Option<&SessionRecord> {
        match self {
            SessionState::Authenticated(record) => Some(record),
            _ => None,
        }
    }
}

/// Caller-side retry policy for [`crate::SessionManager::refresh_with_backoff`].
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Total number of refresh attempts, including the first.
    pub max_attempts: u32,
    /// Initial delay between attempts in milliseconds.
    pub initial_delay_ms: u64,
    /// Maximum delay between attempts in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 500,
            max_delay_ms: 5000,
        }
    }
}

impl RefreshConfig {
    /// Calculate the delay after a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_ms = self
            .initial_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt));
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }
}

/// Event emitted on every session transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStateChangedPayload {
    pub state: SessionStatus,
    pub previous: SessionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub changed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_loading() {
        let machine = SessionMachine::new();
        assert_eq!(*machine.state(), SessionMachineState::Loading);
    }

    #[test]
    fn test_initial_load_outcomes() {
        let mut machine = SessionMachine::new();
        machine.consume(&SessionMachineInput::RecordRestored).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);

        let mut machine = SessionMachine::new();
        machine.consume(&SessionMachineInput::NoRecord).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Unauthenticated);
    }

    #[test]
    fn test_login_flow() {
        let mut machine = SessionMachine::new();
        machine.consume(&SessionMachineInput::NoRecord).unwrap();

        machine
            .consume(&SessionMachineInput::AuthorizationRequested)
            .unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Loading);

        machine
            .consume(&SessionMachineInput::AuthorizationFailed)
            .unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Unauthenticated);

        machine
            .consume(&SessionMachineInput::SessionEstablished)
            .unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
    }

    #[test]
    fn test_refresh_stays_authenticated() {
        let mut machine = SessionMachine::new();
        machine.consume(&SessionMachineInput::RecordRestored).unwrap();

        machine.consume(&SessionMachineInput::TokenRefreshed).unwrap();
        assert_eq!(*machine.state(), SessionMachineState::Authenticated);
    }

    #[test]
    fn test_terminate_from_every_state() {
        for setup in [
            None,
            Some(SessionMachineInput::RecordRestored),
            Some(SessionMachineInput::NoRecord),
        ] {
            let mut machine = SessionMachine::new();
            if let Some(input) = setup {
                machine.consume(&input).unwrap();
            }
            machine
                .consume(&SessionMachineInput::SessionTerminated)
                .unwrap();
            assert_eq!(*machine.state(), SessionMachineState::Unauthenticated);
        }
    }

    #[test]
    fn test_invalid_transitions_return_error() {
        let mut machine = SessionMachine::new();
        assert!(machine.consume(&SessionMachineInput::TokenRefreshed).is_err());
        assert!(machine
            .consume(&SessionMachineInput::AuthorizationRequested)
            .is_err());

        machine.consume(&SessionMachineInput::RecordRestored).unwrap();
        assert!(machine
            .consume(&SessionMachineInput::AuthorizationRequested)
            .is_err());
        assert!(machine.consume(&SessionMachineInput::NoRecord).is_err());

        machine
            .consume(&SessionMachineInput::SessionTerminated)
            .unwrap();
        assert!(machine.consume(&SessionMachineInput::TokenRefreshed).is_err());
        assert!(machine.consume(&SessionMachineInput::RecordRestored).is_err());
    }

    #[test]
    fn test_session_status_conversion() {
        assert_eq!(
            SessionStatus::from(&SessionMachineState::Loading),
            SessionStatus::Loading
        );
        assert_eq!(
            SessionStatus::from(&SessionMachineState::Authenticated),
            SessionStatus::Authenticated
        );
        assert_eq!(
            SessionStatus::from(&SessionMachineState::Unauthenticated),
            SessionStatus::Unauthenticated
        );
    }

    #[test]
    fn test_session_status_flags() {
        assert!(SessionStatus::Authenticated.is_authenticated());
        assert!(!SessionStatus::Loading.is_authenticated());
        assert!(SessionStatus::Loading.is_transient());
        assert!(!SessionStatus::Unauthenticated.is_transient());
        assert_eq!(SessionStatus::Unauthenticated.to_string(), "unauthenticated");
    }

    #[test]
    fn test_refresh_config_delay_exponential_backoff() {
        let config = RefreshConfig::default();

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(500));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(2000));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(4000));
        assert_eq!(config.delay_for_attempt(4), Duration::from_millis(5000));
        assert_eq!(config.delay_for_attempt(40), Duration::from_millis(5000));
    }

    #[test]
    fn test_payload_serializes_snake_case() {
        let payload = SessionStateChangedPayload {
            state: SessionStatus::Authenticated,
            previous: SessionStatus::Loading,
            username: Some("alice".to_string()),
            changed_at: Utc::now(),
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["state"], "authenticated");
        assert_eq!(json["previous"], "loading");
        assert_eq!(json["username"], "alice");
    }
}
