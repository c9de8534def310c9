//! reqwest implementation of [`OAuthExchange`].

use crate::{ExchangeError, ExchangeResult, OAuthExchange};
use async_trait::async_trait;
use credential_store::{RecordError, SessionRecord, TokenFragment};
use serde::Deserialize;
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use url::Url;

const PATH_PARAM: &str = "path";
const AUTHORIZATION_URL_PATH: &str = "/oauth/url";
const TOKEN_PATH: &str = "/token";

/// Bodies may carry tokens; log a fingerprint instead.
fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}

#[derive(Debug, Deserialize)]
struct AuthorizationUrlResponse {
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    token: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ProxyErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// HTTP client for the token-exchange proxy.
#[derive(Clone)]
pub struct ExchangeClient {
    http_client: reqwest::Client,
    proxy_url: Url,
}

impl ExchangeClient {
    /// Create a client for the proxy at `proxy_url`.
    pub fn new(proxy_url: Url) -> Self {
        Self::with_http_client(proxy_url, reqwest::Client::new())
    }

    /// Create a client reusing an existing `reqwest::Client` (timeouts, TLS
    /// settings and connection pool come from it).
    pub fn with_http_client(proxy_url: Url, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            proxy_url,
        }
    }

    pub fn proxy_url(&self) -> &Url {
        &self.proxy_url
    }

    fn endpoint(&self, params: &[(&str, &str)]) -> Url {
        let mut url = self.proxy_url.clone();
        {
            let mut query = url.query_pairs_mut();
            for (name, value) in params {
                query.append_pair(name, value);
            }
        }
        url
    }

    /// One GET round trip returning the parsed JSON body of a success response.
    async fn get_json(&self, url: Url, operation: &'static str) -> ExchangeResult<Value> {
        tracing::debug!(operation, "Sending proxy request");

        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ProxyErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .filter(|m| !m.trim().is_empty());
            tracing::error!(
                operation,
                status = %status,
                body_summary = %summarize_response_body(&body),
                "Proxy request failed"
            );
            return Err(ExchangeError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                operation,
                body_summary = %summarize_response_body(&body),
                "Proxy returned a non-JSON body"
            );
            ExchangeError::Protocol(format!("{} response is not JSON: {}", operation, e))
        })
    }
}

#[async_trait]
impl OAuthExchange for ExchangeClient {
    async fn authorization_url(&self) -> ExchangeResult<Url> {
        let url = self.endpoint(&[(PATH_PARAM, AUTHORIZATION_URL_PATH)]);
        let body = self.get_json(url, "authorization_url").await?;

        let response: AuthorizationUrlResponse = serde_json::from_value(body)
            .map_err(|e| ExchangeError::Protocol(format!("authorization_url response: {}", e)))?;
        let raw = response
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ExchangeError::Protocol("response has no url".to_string()))?;

        let authorization_url = Url::parse(&raw)
            .map_err(|e| ExchangeError::Protocol(format!("response url is invalid: {}", e)))?;
        tracing::debug!(host = ?authorization_url.host_str(), "Received authorization URL");
        Ok(authorization_url)
    }

    async fn exchange_code(&self, code: &str) -> ExchangeResult<SessionRecord> {
        let url = self.endpoint(&[(PATH_PARAM, TOKEN_PATH), ("code", code)]);
        let body = self.get_json(url, "exchange_code").await?;

        let record = SessionRecord::from_value(body)?;
        tracing::info!(username = %record.username(), "Authorization code exchanged");
        Ok(record)
    }

    async fn refresh_token(&self, refresh_token: &str) -> ExchangeResult<TokenFragment> {
        let url = self.endpoint(&[(PATH_PARAM, TOKEN_PATH), ("refresh_token", refresh_token)]);
        let body = self.get_json(url, "refresh_token").await?;

        let response: RefreshResponse = serde_json::from_value(body)
            .map_err(|e| ExchangeError::Protocol(format!("refresh_token response: {}", e)))?;
        let token = match response.token {
            Some(token @ Value::Object(_)) => token,
            _ => return Err(ExchangeError::Protocol("response has no token".to_string())),
        };

        let fragment: TokenFragment = serde_json::from_value(token)
            .map_err(|e| ExchangeError::Protocol(format!("refresh token fields: {}", e)))?;
        if fragment.access_token.as_deref() == Some("") {
            return Err(ExchangeError::Validation(RecordError::MissingAccessToken));
        }

        tracing::debug!(
            refresh_token_rotated = fragment.refresh_token.is_some(),
            expires_in = ?fragment.expires_in,
            "Token refreshed"
        );
        Ok(fragment)
    }
}
