//! HTTP client module
//!
//! Provides the Mautic API client and the request seam used by the rest of
//! the crate.
//!
//! # Features
//!
//! - **Authentication**: Basic or OAuth2 via the auth module
//! - **Rate Limiting**: Optional token bucket rate limiter using governor
//! - **Error Extraction**: Mautic error payloads become `Error::ApiRequest`

mod client;
mod rate_limit;

pub use client::{
    extract_error_message, ApiRequest, HttpClientConfig, HttpClientConfigBuilder, MauticApi,
    MauticClient, API_PREFIX,
};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
