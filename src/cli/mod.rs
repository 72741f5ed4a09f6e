//! CLI module
//!
//! Command-line interface for running Mautic operations.
//!
//! # Commands
//!
//! - `check` - Test the connection and credentials
//! - `run` - Run one operation
//! - `batch` - Run operation requests from a file
//! - `options` - List picker choices (tags, segments, fields, ...)
//! - `compile-filter` - Show the query a filter compiles to

mod commands;
mod runner;

pub use commands::{Cli, Commands, OptionList, OutputFormat};
pub use runner::Runner;
