//! Authentication module
//!
//! Supports: Basic, OAuth2 (bearer token with refresh)
//!
//! The `Authenticator` applies credentials to outgoing requests and keeps
//! the OAuth2 access token fresh.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::{
    AuthConfig, CachedToken, OAuth2Credentials, OAuth2Endpoints, OAUTH2_AUTHORIZE_PATH,
    OAUTH2_TOKEN_PATH,
};

#[cfg(test)]
mod tests;
