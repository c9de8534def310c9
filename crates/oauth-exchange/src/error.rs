//! Exchange error types.

use credential_store::RecordError;
use thiserror::Error;

/// Failure of a single proxy round trip.
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// The request never produced a response (connect, TLS, timeout, body read).
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The proxy answered with a non-success status.
    #[error("Proxy returned HTTP {status}")]
    Status {
        status: u16,
        /// The proxy's own `error` text, when it sent one.
        message: Option<String>,
    },

    /// A success response that is unparseable or lacks a required field.
    #[error("Unexpected proxy response: {0}")]
    Protocol(String),

    /// A received record that fails structural validation.
    #[error("Invalid session record: {0}")]
    Validation(RecordError),
}

impl ExchangeError {
    /// Error text supplied by the proxy, if any.
    pub fn provider_message(&self) -> Option<&str> {
        match self {
            ExchangeError::Status {
                message: Some(message),
                ..
            } => Some(message.as_str()),
            _ => None,
        }
    }

    /// Returns true if repeating the same request might succeed.
    ///
    /// Transient errors include:
    /// - connection failures and timeouts
    /// - HTTP 5xx and 429 responses
    pub fn is_transient(&self) -> bool {
        match self {
            ExchangeError::Transport(e) => e.is_connect() || e.is_timeout(),
            ExchangeError::Status { status, .. } => *status >= 500 || *status == 429,
            ExchangeError::Protocol(_) | ExchangeError::Validation(_) => false,
        }
    }
}

impl From<RecordError> for ExchangeError {
    fn from(error: RecordError) -> Self {
        match error {
            RecordError::MissingToken | RecordError::MissingUser | RecordError::Malformed(_) => {
                ExchangeError::Protocol(error.to_string())
            }
            RecordError::MissingAccessToken => ExchangeError::Validation(error),
        }
    }
}

/// Result type alias using ExchangeError.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_are_transient() {
        let err = ExchangeError::Status {
            status: 503,
            message: None,
        };
        assert!(err.is_transient());

        let err = ExchangeError::Status {
            status: 429,
            message: None,
        };
        assert!(err.is_transient());
    }

    #[test]
    fn test_client_errors_are_not_transient() {
        let err = ExchangeError::Status {
            status: 400,
            message: Some("invalid_grant".to_string()),
        };
        assert!(!err.is_transient());
        assert_eq!(err.provider_message(), Some("invalid_grant"));
    }

    #[test]
    fn test_protocol_errors_are_not_transient() {
        assert!(!ExchangeError::Protocol("no url".to_string()).is_transient());
        assert!(ExchangeError::Protocol("no url".to_string())
            .provider_message()
            .is_none());
    }

    #[test]
    fn test_record_errors_split_into_protocol_and_validation() {
        assert!(matches!(
            ExchangeError::from(RecordError::MissingUser),
            ExchangeError::Protocol(_)
        ));
        assert!(matches!(
            ExchangeError::from(RecordError::MissingToken),
            ExchangeError::Protocol(_)
        ));
        assert!(matches!(
            ExchangeError::from(RecordError::MissingAccessToken),
            ExchangeError::Validation(RecordError::MissingAccessToken)
        ));
    }
}
