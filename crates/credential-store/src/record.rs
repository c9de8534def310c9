//! Session record model.
//!
//! A record is valid iff `token.access_token` is non-empty and a `user`
//! object is present. Parsing goes through loose `Raw*` shapes so that a
//! structurally incomplete record is reported as a [`RecordError`] naming
//! the missing piece instead of a generic deserialization failure.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

const DEFAULT_TOKEN_TYPE: &str = "bearer";

/// Why a record was rejected.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Malformed session record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Session record has no token")]
    MissingToken,

    #[error("Session record has an empty access token")]
    MissingAccessToken,

    #[error("Session record has no user")]
    MissingUser,
}

/// Token material returned by the provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    DEFAULT_TOKEN_TYPE.to_string()
}

impl TokenSet {
    pub fn new(access_token: impl Into<String>, expires_in: u64, token_type: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_in,
            token_type: token_type.into(),
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("access_token", &format_args!("<{} bytes>", self.access_token.len()))
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("expires_in", &self.expires_in)
            .field("token_type", &self.token_type)
            .finish()
    }
}

/// Provider user identity. Attributes other than `username` are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub username: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl UserProfile {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// The persisted unit: token material plus user identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub token: TokenSet,
    pub user: UserProfile,
}

#[derive(Deserialize)]
struct RawSessionRecord {
    #[serde(default)]
    token: Option<RawTokenSet>,
    #[serde(default)]
    user: Option<Value>,
}

#[derive(Deserialize)]
struct RawTokenSet {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    token_type: Option<String>,
}

impl SessionRecord {
    pub fn new(token: TokenSet, user: UserProfile) -> Self {
        Self { token, user }
    }

    /// Parse and validate a serialized record.
    pub fn from_json(raw: &str) -> Result<Self, RecordError> {
        let raw: RawSessionRecord = serde_json::from_str(raw)?;
        Self::from_raw(raw)
    }

    /// Validate a record from an already-parsed JSON value, e.g. a proxy
    /// response body of the form `{ "token": {..}, "user": {..} }`.
    pub fn from_value(value: Value) -> Result<Self, RecordError> {
        let raw: RawSessionRecord = serde_json::from_value(value)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSessionRecord) -> Result<Self, RecordError> {
        let token = raw.token.ok_or(RecordError::MissingToken)?;
        let user = match raw.user {
            Some(user @ Value::Object(_)) => serde_json::from_value::<UserProfile>(user)?,
            _ => return Err(RecordError::MissingUser),
        };

        let record = Self {
            token: TokenSet {
                access_token: token.access_token.unwrap_or_default(),
                refresh_token: token.refresh_token,
                expires_in: token.expires_in.unwrap_or_default(),
                token_type: token.token_type.unwrap_or_else(default_token_type),
            },
            user,
        };
        record.validate()?;
        Ok(record)
    }

    /// Check the structural invariants of an in-memory record.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.token.access_token.is_empty() {
            return Err(RecordError::MissingAccessToken);
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, RecordError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn username(&self) -> &str {
        &self.user.username
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.token.refresh_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Copy of this record with `fragment`'s token fields applied.
    /// The user is carried over unchanged.
    pub fn with_token_fragment(&self, fragment: &TokenFragment) -> Self {
        let mut updated = self.clone();
        fragment.apply_to(&mut updated.token);
        updated
    }
}

/// Partial token returned by a refresh. Absent fields keep their old values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenFragment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl TokenFragment {
    fn apply_to(&self, token: &mut TokenSet) {
        if let Some(access_token) = &self.access_token {
            token.access_token = access_token.clone();
        }
        if let Some(refresh_token) = &self.refresh_token {
            token.refresh_token = Some(refresh_token.clone());
        }
        if let Some(expires_in) = self.expires_in {
            token.expires_in = expires_in;
        }
        if let Some(token_type) = &self.token_type {
            token.token_type = token_type.clone();
        }
    }
}
