//! Authenticator implementation
//!
//! Handles applying authentication to requests and managing token refresh.

use super::types::{AuthConfig, CachedToken, OAuth2Credentials, OAuth2Endpoints};
use crate::error::{Error, Result};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Authenticator handles applying authentication to HTTP requests
pub struct Authenticator {
    /// Auth configuration
    config: AuthConfig,
    /// OAuth2 endpoints of the instance
    endpoints: OAuth2Endpoints,
    /// Current OAuth2 token
    cached_token: Arc<RwLock<Option<CachedToken>>>,
    /// HTTP client for token requests
    http_client: Client,
}

impl Authenticator {
    /// Create a new authenticator for the instance at `base_url`
    pub fn new(config: AuthConfig, base_url: &str) -> Self {
        Self::with_client(config, base_url, Client::new())
    }

    /// Create an authenticator with a custom HTTP client
    pub fn with_client(config: AuthConfig, base_url: &str, http_client: Client) -> Self {
        let cached = match &config {
            AuthConfig::OAuth2(credentials) => Some(
                CachedToken::new(credentials.access_token.clone(), credentials.expires_at)
                    .with_refresh_token(credentials.refresh_token.clone()),
            ),
            AuthConfig::Basic { .. } => None,
        };

        Self {
            config,
            endpoints: OAuth2Endpoints::for_instance(base_url),
            cached_token: Arc::new(RwLock::new(cached)),
            http_client,
        }
    }

    /// Apply authentication to a request builder
    pub async fn apply(&self, req: RequestBuilder) -> Result<RequestBuilder> {
        match &self.config {
            AuthConfig::Basic { username, password } => {
                Ok(req.basic_auth(username, Some(password)))
            }
            AuthConfig::OAuth2(credentials) => {
                let token = self.get_or_refresh_token(credentials).await?;
                Ok(req.bearer_auth(token))
            }
        }
    }

    /// Get a valid token, refreshing if necessary
    async fn get_or_refresh_token(&self, credentials: &OAuth2Credentials) -> Result<String> {
        {
            let cached = self.cached_token.read().await;
            if let Some(token) = cached.as_ref() {
                if !token.is_expired() {
                    return Ok(token.token.clone());
                }
            }
        }

        let mut cached = self.cached_token.write().await;

        // Another task may have refreshed while we waited for the write lock
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(token.token.clone());
            }
        }

        let refresh_token = cached
            .as_ref()
            .and_then(|t| t.refresh_token.clone())
            .or_else(|| credentials.refresh_token.clone())
            .ok_or_else(|| Error::TokenRefresh {
                message: "access token expired and no refresh token is configured".to_string(),
            })?;

        warn!("OAuth2 access token expired, refreshing");
        let new_token = self.refresh(credentials, &refresh_token).await?;
        let token_str = new_token.token.clone();
        *cached = Some(new_token);

        Ok(token_str)
    }

    /// Exchange a refresh token for a new access token
    ///
    /// Client credentials travel in the form body.
    async fn refresh(
        &self,
        credentials: &OAuth2Credentials,
        refresh_token: &str,
    ) -> Result<CachedToken> {
        let mut form = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        if let Some(client_id) = credentials.client_id.as_deref() {
            form.push(("client_id", client_id));
        }
        if let Some(client_secret) = credentials.client_secret.as_deref() {
            form.push(("client_secret", client_secret));
        }

        debug!(token_url = %self.endpoints.token_url, "Requesting OAuth2 token");
        let response = self
            .http_client
            .post(&self.endpoints.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| Error::TokenRefresh {
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::TokenRefresh {
                message: format!("Refresh token request failed with status {status}: {body}"),
            });
        }

        let token_response: TokenResponse =
            response.json().await.map_err(|e| Error::TokenRefresh {
                message: format!("Invalid token response: {e}"),
            })?;
        let next_refresh = token_response
            .refresh_token
            .clone()
            .or_else(|| Some(refresh_token.to_string()));
        Ok(token_response
            .into_cached_token()
            .with_refresh_token(next_refresh))
    }

    /// Mark the cached token as expired, forcing a refresh on the next request
    pub async fn expire_token(&self) {
        let mut cached = self.cached_token.write().await;
        if let Some(token) = cached.as_mut() {
            token.expires_at = Some(chrono::Utc::now());
        }
    }

    /// Get the current auth config
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// OAuth2 endpoints derived from the instance URL
    pub fn endpoints(&self) -> &OAuth2Endpoints {
        &self.endpoints
    }
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("kind", &self.config.kind())
            .field("token_url", &self.endpoints.token_url)
            .finish_non_exhaustive()
    }
}

/// OAuth2 token response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl TokenResponse {
    fn into_cached_token(self) -> CachedToken {
        match self.expires_in {
            Some(secs) => CachedToken::expires_in(self.access_token, secs),
            None => CachedToken::new(self.access_token, None),
        }
    }
}
