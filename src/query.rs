//! Query parameters in the bracket-indexed form Mautic expects
//!
//! Mautic is a PHP application, so nested query structures travel as
//! `where[0][col]=email` style keys. `QueryParams` keeps insertion order
//! (the remote side parses keys positionally) and flattens lists and
//! nested objects with explicit indices.

use crate::types::{JsonObject, JsonValue};

/// A single query-string value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// Plain scalar value
    Text(String),
    /// Sequence, encoded as `key[0]=..&key[1]=..`
    List(Vec<QueryValue>),
    /// Ordered nested map, encoded as `key[sub]=..`
    Object(Vec<(String, QueryValue)>),
}

impl QueryValue {
    /// Build a text value
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Build a list of text values
    pub fn list<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::List(values.into_iter().map(|v| Self::Text(v.into())).collect())
    }

    /// Empty list value
    pub fn empty_list() -> Self {
        Self::List(Vec::new())
    }

    /// True for an empty string
    pub fn is_empty_text(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }

    /// Borrow the text content, if this is a scalar
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Convert a loosely typed JSON value.
    ///
    /// Returns `None` for `null`; numbers and booleans become text.
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Null => None,
            JsonValue::String(s) => Some(Self::Text(s.clone())),
            JsonValue::Number(n) => Some(Self::Text(n.to_string())),
            JsonValue::Bool(b) => Some(Self::Text(if *b { "1" } else { "0" }.to_string())),
            JsonValue::Array(items) => Some(Self::List(
                items.iter().filter_map(Self::from_json).collect(),
            )),
            JsonValue::Object(map) => Some(Self::Object(
                map.iter()
                    .filter_map(|(k, v)| Self::from_json(v).map(|qv| (k.clone(), qv)))
                    .collect(),
            )),
        }
    }

    /// Render back into JSON (text stays text, lists become arrays)
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Text(s) => JsonValue::String(s.clone()),
            Self::List(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
            Self::Object(entries) => JsonValue::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    fn flatten_into(&self, key: &str, out: &mut Vec<(String, String)>) {
        match self {
            Self::Text(s) => out.push((key.to_string(), s.clone())),
            Self::List(items) => {
                for (idx, item) in items.iter().enumerate() {
                    item.flatten_into(&format!("{key}[{idx}]"), out);
                }
            }
            Self::Object(entries) => {
                for (sub, item) in entries {
                    item.flatten_into(&format!("{key}[{sub}]"), out);
                }
            }
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<usize> for QueryValue {
    fn from(value: usize) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<u64> for QueryValue {
    fn from(value: u64) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        Self::Text(if value { "1" } else { "0" }.to_string())
    }
}

/// Insertion-ordered query parameter map
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, QueryValue)>,
}

impl QueryParams {
    /// Create an empty parameter map
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing an existing value in place
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder-style `set`
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a parameter only if it is not already present
    pub fn set_default(&mut self, key: &str, value: impl Into<QueryValue>) {
        if !self.contains(key) {
            self.set(key, value);
        }
    }

    /// Look up a parameter
    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Look up a scalar parameter
    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(QueryValue::as_text)
    }

    /// Check whether a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove a parameter
    pub fn remove(&mut self, key: &str) -> Option<QueryValue> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Merge another map into this one (later keys win)
    pub fn extend(&mut self, other: QueryParams) {
        for (key, value) in other.entries {
            self.set(key, value);
        }
    }

    /// Number of top-level keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no parameters are set
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over top-level entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Flatten into wire pairs using the indexed bracket convention
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for (key, value) in &self.entries {
            value.flatten_into(key, &mut out);
        }
        out
    }

    /// Render as a JSON object keyed by the top-level keys
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect::<JsonObject>(),
        )
    }

    /// Build from a JSON object of loosely typed options; `null` entries are skipped
    pub fn from_json_object(object: &JsonObject) -> Self {
        let mut params = Self::new();
        for (key, value) in object {
            if let Some(qv) = QueryValue::from_json(value) {
                params.set(key.clone(), qv);
            }
        }
        params
    }
}

impl<K: Into<String>, V: Into<QueryValue>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.set(k, v);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_set_replaces_in_place() {
        let mut params = QueryParams::new();
        params.set("limit", 30usize);
        params.set("start", 0usize);
        params.set("limit", 10usize);

        let keys: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["limit", "start"]);
        assert_eq!(params.get_text("limit"), Some("10"));
    }

    #[test]
    fn test_set_default_keeps_existing() {
        let mut params = QueryParams::new().with("orderBy", "name");
        params.set_default("orderBy", "id");
        params.set_default("orderByDir", "asc");
        assert_eq!(params.get_text("orderBy"), Some("name"));
        assert_eq!(params.get_text("orderByDir"), Some("asc"));
    }

    #[test]
    fn test_to_pairs_flattens_lists_and_objects() {
        let params = QueryParams::new()
            .with("search", "segment:1")
            .with("ids", QueryValue::list(["3", "4"]))
            .with(
                "filters",
                QueryValue::Object(vec![
                    ("search".to_string(), QueryValue::text("form")),
                    ("includeEvents".to_string(), QueryValue::list(["page.hit"])),
                ]),
            )
            .with("where[0][val]", QueryValue::empty_list());

        assert_eq!(
            params.to_pairs(),
            vec![
                ("search".to_string(), "segment:1".to_string()),
                ("ids[0]".to_string(), "3".to_string()),
                ("ids[1]".to_string(), "4".to_string()),
                ("filters[search]".to_string(), "form".to_string()),
                ("filters[includeEvents][0]".to_string(), "page.hit".to_string()),
            ]
        );
    }

    #[test]
    fn test_from_json_object() {
        let object = json!({
            "orderBy": "email",
            "limit": 5,
            "publishedOnly": true,
            "skip": null
        });
        let params = QueryParams::from_json_object(object.as_object().unwrap());
        assert_eq!(params.get_text("orderBy"), Some("email"));
        assert_eq!(params.get_text("limit"), Some("5"));
        assert_eq!(params.get_text("publishedOnly"), Some("1"));
        assert!(!params.contains("skip"));
    }

    #[test]
    fn test_remove_and_extend() {
        let mut params = QueryParams::new().with("a", "1").with("b", "2");
        assert_eq!(params.remove("a"), Some(QueryValue::text("1")));
        assert_eq!(params.remove("a"), None);

        params.extend(QueryParams::new().with("b", "3").with("c", "4"));
        assert_eq!(params.len(), 2);
        assert_eq!(params.get_text("b"), Some("3"));
    }
}
