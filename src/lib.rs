// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::match_wildcard_for_single_variants)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Mautic Connector
//!
//! Typed operations over the Mautic REST API, built on two engines:
//!
//! - **Pagination**: offset (`start`/`limit`) and page-number strategies
//!   with result caps, id deduplication and predicate filtering
//! - **Filter compilation**: nested condition trees to Mautic's
//!   bracket-indexed `where[...]` query keys, plus `search` expressions
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mautic_connector::{ConnectionConfig, MauticNode, OperationRequest, Result};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ConnectionConfig::load(Some("mautic.yaml".as_ref()))?;
//!     let node = MauticNode::new(Arc::new(config.client()?))
//!         .with_version(config.mautic_version);
//!
//!     let request = OperationRequest::new("contact", "getAll")
//!         .with_param("returnAll", true)
//!         .with_param("options", serde_json::json!({ "tags": ["vip"] }));
//!     for record in node.execute(&[request]).await? {
//!         println!("{record}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │        MauticNode: execute(requests) -> records             │
//! └─────────────────────────────┬───────────────────────────────┘
//!                               │
//! ┌─────────────────────────────┴───────────────────────────────┐
//! │  operations: contact, company, campaign, tag, stats, ...    │
//! └──────────┬──────────────────┬──────────────────┬────────────┘
//!            │                  │                  │
//! ┌──────────┴─────┐  ┌─────────┴───────┐  ┌───────┴────────────┐
//! │   pagination   │  │     filter      │  │       query        │
//! │ offset / page  │  │ where / search  │  │ bracket encoding   │
//! └──────────┬─────┘  └─────────────────┘  └────────────────────┘
//!            │
//! ┌──────────┴──────────────────────────────────────────────────┐
//! │  http: MauticApi seam, MauticClient, auth, rate limit       │
//! └─────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(missing_docs)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Query parameters and bracket encoding
pub mod query;

/// Authentication (Basic and OAuth2)
pub mod auth;

/// HTTP client with rate limiting
pub mod http;

/// Pagination engine
pub mod pagination;

/// Filter-to-query compiler
pub mod filter;

/// Connection configuration
pub mod config;

/// Resource operation handlers
pub mod operations;

/// Batch executor and option loaders
pub mod node;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::ConnectionConfig;
pub use http::{ApiRequest, MauticApi, MauticClient};
pub use node::{EmailKind, MauticNode, OptionEntry};
pub use operations::{execute_operation, OperationContext, OperationRequest, Resource};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
