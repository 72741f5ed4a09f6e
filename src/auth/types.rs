//! Auth configuration types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Path of the OAuth2 authorization endpoint, relative to the instance URL
pub const OAUTH2_AUTHORIZE_PATH: &str = "/oauth/v2/authorize";

/// Path of the OAuth2 token endpoint, relative to the instance URL
pub const OAUTH2_TOKEN_PATH: &str = "/oauth/v2/token";

/// How requests against the Mautic instance are authenticated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthConfig {
    /// HTTP Basic authentication with a Mautic user
    Basic {
        /// Username
        username: String,
        /// Password
        password: String,
    },

    /// OAuth2 bearer token, refreshed through the instance's token endpoint
    #[serde(rename = "oauth2")]
    OAuth2(OAuth2Credentials),
}

impl AuthConfig {
    /// Basic credentials
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// OAuth2 with only an access token (never refreshed)
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self::OAuth2(OAuth2Credentials {
            access_token: access_token.into(),
            ..Default::default()
        })
    }

    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            AuthConfig::Basic { .. } => "basic",
            AuthConfig::OAuth2(_) => "oauth2",
        }
    }
}

/// OAuth2 token set as issued by the Mautic instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuth2Credentials {
    /// Current access token
    pub access_token: String,
    /// Refresh token, required to renew an expired access token
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// OAuth2 client id
    #[serde(default)]
    pub client_id: Option<String>,
    /// OAuth2 client secret
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Expiry of the access token; `None` means it never expires
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// OAuth2 endpoints of a Mautic instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuth2Endpoints {
    /// Authorization URL
    pub authorize_url: String,
    /// Token URL
    pub token_url: String,
}

impl OAuth2Endpoints {
    /// Derive the endpoints from the instance base URL
    pub fn for_instance(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            authorize_url: format!("{base}{OAUTH2_AUTHORIZE_PATH}"),
            token_url: format!("{base}{OAUTH2_TOKEN_PATH}"),
        }
    }
}

/// Cached token with expiration
#[derive(Debug, Clone)]
pub struct CachedToken {
    /// The access token
    pub token: String,
    /// When the token expires
    pub expires_at: Option<DateTime<Utc>>,
    /// Refresh token to use for the next renewal
    pub refresh_token: Option<String>,
}

impl CachedToken {
    /// Create a new cached token
    pub fn new(token: String, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            token,
            expires_at,
            refresh_token: None,
        }
    }

    /// Create a token that expires in N seconds from now
    pub fn expires_in(token: String, seconds: i64) -> Self {
        let expires_at = Utc::now() + chrono::Duration::seconds(seconds);
        Self::new(token, Some(expires_at))
    }

    /// Attach the refresh token
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: Option<String>) -> Self {
        self.refresh_token = refresh_token;
        self
    }

    /// Check if the token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                let buffer = chrono::Duration::seconds(30);
                Utc::now() + buffer >= expires_at
            }
            None => false, // No expiration = never expires
        }
    }
}
