//! Session error types.

use crate::messages;
use credential_store::{RecordError, StorageError};
use oauth_exchange::ExchangeError;
use thiserror::Error;

/// Session error type.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The provider redirected back with `error` / `error_description`.
    #[error("Authorization denied by provider: {0}")]
    ProviderDenial(String),

    /// The redirect carried neither an error nor a code.
    #[error("No authorization code received")]
    MissingAuthorizationCode,

    /// A proxy round trip failed.
    #[error("Exchange failed: {0}")]
    Exchange(#[from] ExchangeError),

    /// A record failed structural validation.
    #[error("Invalid session record: {0}")]
    Validation(#[from] RecordError),

    /// Persisting or clearing the session failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invalid state transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),
}

impl AuthError {
    /// Text to show the user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::ProviderDenial(message) => message.clone(),
            AuthError::MissingAuthorizationCode => messages::NO_AUTHORIZATION_CODE.to_string(),
            AuthError::Exchange(e) => e
                .provider_message()
                .unwrap_or(messages::EXCHANGE_FAILED)
                .to_string(),
            AuthError::Validation(_)
            | AuthError::Storage(_)
            | AuthError::InvalidStateTransition(_) => messages::GENERIC_FAILURE.to_string(),
        }
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;
