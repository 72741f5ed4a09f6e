//! Free-text search expressions
//!
//! Mautic's `search` parameter understands `type:value` terms joined with
//! `AND` / `OR`, e.g. `segment:newsletter OR segment:7`.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How multiple values of one filter type combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    /// Any value matches (`OR`)
    #[default]
    Any,
    /// Every value must match (`AND`)
    All,
}

impl MatchType {
    fn joiner(self) -> &'static str {
        match self {
            MatchType::Any => " OR ",
            MatchType::All => " AND ",
        }
    }
}

impl FromStr for MatchType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(Self::Any),
            "all" => Ok(Self::All),
            other => Err(Error::invalid_param(
                "matchType",
                format!("expected any or all, got '{other}'"),
            )),
        }
    }
}

/// Build `type:value` terms joined by the match type's operator
///
/// Blank values are skipped. Returns `None` when nothing is left.
pub fn build_search_filter<S: AsRef<str>>(
    values: &[S],
    filter_type: &str,
    match_type: MatchType,
) -> Option<String> {
    let terms: Vec<String> = values
        .iter()
        .map(|v| v.as_ref().trim())
        .filter(|v| !v.is_empty())
        .map(|v| format!("{filter_type}:{v}"))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(match_type.joiner()))
    }
}

/// Combine structured search parts with an optional raw search
///
/// Several parts are parenthesised and joined with `AND`; a single part is
/// used bare. A non-blank raw search is appended as `AND (raw)`.
pub fn combine_search(parts: &[String], raw_search: Option<&str>) -> Option<String> {
    let raw = raw_search.map(str::trim).filter(|s| !s.is_empty());

    let structured = match parts {
        [] => return raw.map(str::to_string),
        [single] => single.clone(),
        many => many
            .iter()
            .map(|part| format!("({part})"))
            .collect::<Vec<_>>()
            .join(" AND "),
    };

    Some(match raw {
        Some(raw) => format!("{structured} AND ({raw})"),
        None => structured,
    })
}
