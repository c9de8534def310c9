//! Client for the backend proxy that talks to the OAuth provider.
//!
//! Three single round trips, no retries:
//! - `GET <proxy>?path=/oauth/url` for the provider authorization URL
//! - `GET <proxy>?path=/token&code=..` to exchange an authorization code
//! - `GET <proxy>?path=/token&refresh_token=..` to refresh a token

mod client;
mod error;

pub use client::ExchangeClient;
pub use error::{ExchangeError, ExchangeResult};

use async_trait::async_trait;
use credential_store::{SessionRecord, TokenFragment};
use url::Url;

/// The exchange operations the session layer depends on.
#[async_trait]
pub trait OAuthExchange: Send + Sync {
    /// Obtain the provider URL the user must be sent to.
    async fn authorization_url(&self) -> ExchangeResult<Url>;

    /// Exchange an authorization code for a validated session record.
    async fn exchange_code(&self, code: &str) -> ExchangeResult<SessionRecord>;

    /// Exchange a refresh token for new token fields. Never returns a user.
    async fn refresh_token(&self, refresh_token: &str) -> ExchangeResult<TokenFragment>;
}
