//! Filter compilation
//!
//! Turns structured, possibly nested boolean filters into the query
//! encodings Mautic list endpoints accept: bracket-indexed `where[...]`
//! keys and `type:value` search expressions.

mod compiler;
mod search;
mod types;

pub use compiler::{compile, compile_where, retain_complete, DEFAULT_PREFIX};
pub use search::{build_search_filter, combine_search, MatchType};
pub use types::{FilterNode, GroupOperator, RawCondition};
