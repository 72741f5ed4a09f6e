//! Mautic REST client
//!
//! Provides the single-request primitive every operation builds on:
//! - URL construction under `{base}/api`
//! - Authentication and optional rate limiting
//! - Bracket-indexed query encoding
//! - Error extraction from non-2xx responses and from 2xx responses that
//!   carry an `errors` payload
//!
//! Requests are never retried.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::auth::{AuthConfig, Authenticator};
use crate::error::{Error, Result};
use crate::query::QueryParams;
use crate::types::{JsonValue, Method};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Path segment prepended to every endpoint
pub const API_PREFIX: &str = "/api";

// ============================================================================
// Client Configuration
// ============================================================================

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// Default headers for all requests
    pub default_headers: HashMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            rate_limit: None,
            default_headers: HashMap::new(),
            user_agent: format!("mautic-connector/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

// ============================================================================
// Request
// ============================================================================

/// One call against the Mautic API
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Endpoint below `/api`, e.g. `/contacts/12`
    pub endpoint: String,
    /// JSON body (ignored for GET)
    pub body: Option<JsonValue>,
    /// Query parameters
    pub query: QueryParams,
    /// Extra request headers
    pub headers: Vec<(String, String)>,
}

impl ApiRequest {
    /// Create a request without body or query
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            body: None,
            query: QueryParams::new(),
            headers: Vec::new(),
        }
    }

    /// GET request
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    /// Set the query parameters
    #[must_use]
    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    /// Add a header
    #[must_use]
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Body to send, if any
    ///
    /// GET requests and empty JSON objects send nothing.
    fn effective_body(&self) -> Option<&JsonValue> {
        if self.method == Method::GET {
            return None;
        }
        match &self.body {
            Some(JsonValue::Object(map)) if map.is_empty() => None,
            Some(JsonValue::Null) | None => None,
            Some(body) => Some(body),
        }
    }
}

// ============================================================================
// API Trait
// ============================================================================

/// The request seam used by pagination and operation handlers
#[async_trait]
pub trait MauticApi: Send + Sync {
    /// Perform one request and return the decoded JSON body
    ///
    /// An empty response body decodes to `null`.
    async fn request(&self, request: ApiRequest) -> Result<JsonValue>;
}

// ============================================================================
// Client
// ============================================================================

/// HTTP client for one Mautic instance
pub struct MauticClient {
    client: Client,
    base_url: String,
    config: HttpClientConfig,
    authenticator: Authenticator,
    rate_limiter: Option<RateLimiter>,
}

impl MauticClient {
    /// Create a client for the instance at `base_url`
    pub fn new(base_url: &str, auth: AuthConfig, config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        let base_url = base_url.trim_end_matches('/').to_string();
        let authenticator = Authenticator::with_client(auth, &base_url, client.clone());
        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            base_url,
            config,
            authenticator,
            rate_limiter,
        })
    }

    /// Instance base URL without trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Build the full URL of an endpoint
    pub fn build_url(&self, endpoint: &str) -> String {
        let endpoint = endpoint.trim_start_matches('/');
        format!("{}{API_PREFIX}/{endpoint}", self.base_url)
    }

    async fn send(&self, request: &ApiRequest) -> Result<JsonValue> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let url = self.build_url(&request.endpoint);
        let mut req = self.client.request(request.method.into(), &url);

        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        let pairs = request.query.to_pairs();
        if !pairs.is_empty() {
            req = req.query(&pairs);
        }

        if let Some(body) = request.effective_body() {
            req = req.json(body);
        }

        req = self.authenticator.apply(req).await?;

        let response = req
            .send()
            .await
            .map_err(|e| Error::api_transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::api_transport(e.to_string()))?;

        if !status.is_success() {
            let parsed = serde_json::from_str::<JsonValue>(&text).ok();
            let message = parsed
                .as_ref()
                .and_then(extract_error_message)
                .or_else(|| (!text.trim().is_empty()).then(|| text.clone()))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());
            debug!(status = status.as_u16(), %url, "Request failed");
            return Err(Error::api_status(status.as_u16(), message, Some(text)));
        }

        if text.trim().is_empty() {
            return Ok(JsonValue::Null);
        }

        let body: JsonValue = serde_json::from_str(&text).map_err(|e| {
            Error::api_status(
                status.as_u16(),
                format!("invalid JSON in response: {e}"),
                Some(text.clone()),
            )
        })?;

        if has_error_payload(&body) {
            let code = body
                .pointer("/errors/0/code")
                .and_then(JsonValue::as_u64)
                .and_then(|c| u16::try_from(c).ok())
                .unwrap_or(status.as_u16());
            let message =
                extract_error_message(&body).unwrap_or_else(|| "Unknown error".to_string());
            return Err(Error::api_status(code, message, Some(text)));
        }

        debug!("Request succeeded: {} {}", request.method, url);
        Ok(body)
    }
}

#[async_trait]
impl MauticApi for MauticClient {
    async fn request(&self, request: ApiRequest) -> Result<JsonValue> {
        self.send(&request).await
    }
}

impl std::fmt::Debug for MauticClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MauticClient")
            .field("base_url", &self.base_url)
            .field("config", &self.config)
            .field("authenticator", &self.authenticator)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Error Payloads
// ============================================================================

/// True when a 2xx body still reports failure
fn has_error_payload(body: &JsonValue) -> bool {
    match body.get("errors") {
        None | Some(JsonValue::Null) => false,
        Some(JsonValue::Array(errors)) => !errors.is_empty(),
        Some(_) => true,
    }
}

/// Pull a human-readable message out of a Mautic error body
///
/// Checks `errors[0].message`, `error.message`, `error` and `message`.
pub fn extract_error_message(body: &JsonValue) -> Option<String> {
    let candidates = [
        body.pointer("/errors/0/message"),
        body.pointer("/error/message"),
        body.get("error"),
        body.get("message"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(|value| value.as_str().filter(|s| !s.is_empty()))
        .map(str::to_string)
}
