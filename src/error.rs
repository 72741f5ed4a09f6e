//! Error types for the Mautic connector
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for the Mautic connector
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Authentication Errors
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("Token refresh failed: {message}")]
    TokenRefresh { message: String },

    // ============================================================================
    // API Errors
    // ============================================================================
    /// Any failed call against the Mautic API: transport failure, non-2xx
    /// status, or a 2xx response that carries an `errors` payload.
    #[error("Mautic API request failed{}: {message}", format_status(.status))]
    ApiRequest {
        status: Option<u16>,
        message: String,
        body: Option<String>,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Operation Errors
    // ============================================================================
    #[error("Parameter '{name}' is required.")]
    MissingParameter { name: String },

    #[error("Parameter '{name}' is invalid: {message}")]
    InvalidParameter { name: String, message: String },

    #[error("Resource '{resource}' is not supported.")]
    UnsupportedResource { resource: String },

    #[error("Operation '{operation}' is not supported for {resource} resource.")]
    UnsupportedOperation { resource: String, operation: String },

    #[error("Invalid filter: {message}")]
    Filter { message: String },

    /// A failure already rewritten into a user-facing message
    #[error("{message}")]
    Operation { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create an API error with an HTTP status
    pub fn api_status(status: u16, message: impl Into<String>, body: Option<String>) -> Self {
        Self::ApiRequest {
            status: Some(status),
            message: message.into(),
            body,
        }
    }

    /// Create an API error for a transport-level failure
    pub fn api_transport(message: impl Into<String>) -> Self {
        Self::ApiRequest {
            status: None,
            message: message.into(),
            body: None,
        }
    }

    /// Create a missing parameter error
    pub fn missing_param(name: impl Into<String>) -> Self {
        Self::MissingParameter { name: name.into() }
    }

    /// Create an invalid parameter error
    pub fn invalid_param(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported_operation(resource: impl Into<String>, operation: impl Into<String>) -> Self {
        Self::UnsupportedOperation {
            resource: resource.into(),
            operation: operation.into(),
        }
    }

    /// Create a filter error
    pub fn filter(message: impl Into<String>) -> Self {
        Self::Filter {
            message: message.into(),
        }
    }

    /// Create a user-facing operation error
    pub fn operation(message: impl Into<String>) -> Self {
        Self::Operation {
            message: message.into(),
        }
    }

    /// HTTP status carried by an API error, if any
    pub fn http_code(&self) -> Option<u16> {
        match self {
            Error::ApiRequest { status, .. } => *status,
            _ => None,
        }
    }

    /// Check if this error came from the remote API
    pub fn is_api_error(&self) -> bool {
        matches!(self, Error::ApiRequest { .. })
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Error::api_status(status.as_u16(), err.to_string(), None),
            None => Error::api_transport(err.to_string()),
        }
    }
}

fn format_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

/// Result type alias for the Mautic connector
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
