//! Identity-based deduplication of paginated items
//!
//! Offset paging over a mutating collection can return the same record on
//! two adjacent pages. Records are matched by their `id`, falling back to
//! `fields.id` for contact-style payloads.

use crate::types::JsonValue;
use std::collections::HashSet;

/// Resolved identity of an item
///
/// Integers and strings never compare equal: `7` and `"7"` are distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemId {
    /// Integral JSON number
    Int(i64),
    /// Any other JSON number, in its canonical text form
    Num(String),
    /// JSON string
    Str(String),
}

impl ItemId {
    fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Number(n) => Some(match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Num(n.to_string()),
            }),
            JsonValue::String(s) => Some(Self::Str(s.clone())),
            _ => None,
        }
    }
}

/// Resolve the identity of an item: direct `id`, else `fields.id`
pub fn resolve_item_id(item: &JsonValue) -> Option<ItemId> {
    let object = item.as_object()?;
    object
        .get("id")
        .and_then(ItemId::from_json)
        .or_else(|| {
            object
                .get("fields")
                .and_then(|fields| fields.get("id"))
                .and_then(ItemId::from_json)
        })
}

/// Drop every item whose identity was already seen, keeping first occurrences
///
/// Items without a resolvable identity are always retained.
pub fn dedup_by_id(items: Vec<JsonValue>) -> Vec<JsonValue> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| match resolve_item_id(item) {
            Some(id) => seen.insert(id),
            None => true,
        })
        .collect()
}
