//! Connection configuration
//!
//! A connection is described by a YAML or JSON file naming the instance URL,
//! the credentials and optional HTTP settings. Environment variables can
//! override the file (or replace it entirely).
//!
//! ```yaml
//! url: https://name.mautic.net
//! mautic_version: v6
//! auth:
//!   type: basic
//!   username: admin
//!   password: secret
//! http:
//!   timeout_secs: 30
//!   rate_limit: { requests_per_second: 10, burst_size: 10 }
//! ```

use crate::auth::{AuthConfig, OAuth2Credentials};
use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, MauticClient, RateLimiterConfig};
use crate::types::{MauticVersion, OptionStringExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Instance URL override
pub const ENV_URL: &str = "MAUTIC_URL";
/// Basic auth username override
pub const ENV_USERNAME: &str = "MAUTIC_USERNAME";
/// Basic auth password override
pub const ENV_PASSWORD: &str = "MAUTIC_PASSWORD";
/// OAuth2 access token override
pub const ENV_ACCESS_TOKEN: &str = "MAUTIC_ACCESS_TOKEN";
/// Instance version override
pub const ENV_VERSION: &str = "MAUTIC_VERSION";

// ============================================================================
// Connection Config
// ============================================================================

/// Everything needed to talk to one Mautic instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Instance base URL, e.g. `https://name.mautic.net`
    #[serde(default)]
    pub url: String,

    /// Major version of the instance
    #[serde(default)]
    pub mautic_version: MauticVersion,

    /// Credentials
    #[serde(default)]
    pub auth: Option<AuthConfig>,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Rate limiting; disabled when absent
    #[serde(default)]
    pub rate_limit: Option<RateLimiterConfig>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            user_agent: None,
            rate_limit: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

impl ConnectionConfig {
    /// Create a config for an instance with the given credentials
    pub fn new(url: impl Into<String>, auth: AuthConfig) -> Self {
        Self {
            url: url.into(),
            auth: Some(auth),
            ..Default::default()
        }
    }

    /// Set the instance version
    #[must_use]
    pub fn with_version(mut self, version: MauticVersion) -> Self {
        self.mautic_version = version;
        self
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a config file; `.json` files are parsed as JSON, anything else as YAML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::config(format!(
                    "Failed to read config file '{}': {e}",
                    path.display()
                ))
            }
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Load from an optional file, apply process environment overrides and validate
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Apply `MAUTIC_*` overrides taken from `lookup`
    ///
    /// An access token switches the connection to OAuth2; a username or
    /// password switches it to Basic auth.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).none_if_empty();

        if let Some(url) = get(ENV_URL) {
            self.url = url;
        }

        if let Some(version) = get(ENV_VERSION) {
            match version.parse::<MauticVersion>() {
                Ok(v) => self.mautic_version = v,
                Err(_) => tracing::warn!(value = %version, "Ignoring invalid {ENV_VERSION}"),
            }
        }

        if let Some(token) = get(ENV_ACCESS_TOKEN) {
            self.auth = Some(match self.auth.take() {
                Some(AuthConfig::OAuth2(mut credentials)) => {
                    credentials.access_token = token;
                    AuthConfig::OAuth2(credentials)
                }
                _ => AuthConfig::OAuth2(OAuth2Credentials {
                    access_token: token,
                    ..Default::default()
                }),
            });
        }

        let username = get(ENV_USERNAME);
        let password = get(ENV_PASSWORD);
        if username.is_some() || password.is_some() {
            let (mut current_user, mut current_pass) = match self.auth.take() {
                Some(AuthConfig::Basic { username, password }) => (username, password),
                _ => (String::new(), String::new()),
            };
            if let Some(username) = username {
                current_user = username;
            }
            if let Some(password) = password {
                current_pass = password;
            }
            self.auth = Some(AuthConfig::basic(current_user, current_pass));
        }
    }

    /// Check that the config describes a usable connection
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::missing_field("url"));
        }

        let parsed = url::Url::parse(&self.url)
            .map_err(|e| Error::invalid_config("url", e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::invalid_config(
                "url",
                format!("unsupported scheme '{}'", parsed.scheme()),
            ));
        }

        match &self.auth {
            None => return Err(Error::missing_field("auth")),
            Some(AuthConfig::Basic { username, .. }) if username.trim().is_empty() => {
                return Err(Error::invalid_config("auth.username", "must not be empty"));
            }
            Some(AuthConfig::OAuth2(credentials)) if credentials.access_token.trim().is_empty() => {
                return Err(Error::missing_field("auth.access_token"));
            }
            Some(_) => {}
        }

        if self.http.timeout_secs == 0 {
            return Err(Error::invalid_config(
                "http.timeout_secs",
                "must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Credentials, failing when none are configured
    pub fn auth(&self) -> Result<&AuthConfig> {
        self.auth.as_ref().ok_or_else(|| Error::missing_field("auth"))
    }

    /// HTTP client settings derived from this config
    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut builder =
            HttpClientConfig::builder().timeout(Duration::from_secs(self.http.timeout_secs));
        if let Some(agent) = &self.http.user_agent {
            builder = builder.user_agent(agent.as_str());
        }
        if let Some(rate_limit) = &self.http.rate_limit {
            builder = builder.rate_limit(rate_limit.clone());
        }
        builder.build()
    }

    /// Build a client for this connection
    pub fn client(&self) -> Result<MauticClient> {
        self.validate()?;
        MauticClient::new(&self.url, self.auth()?.clone(), self.http_client_config())
    }
}
