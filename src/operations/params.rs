//! Typed access to loosely typed operation parameters

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};

/// Read-only view over an operation's parameter object
#[derive(Debug, Clone, Copy)]
pub struct Params<'a> {
    inner: &'a JsonObject,
}

impl<'a> Params<'a> {
    /// Wrap a parameter object
    pub fn new(inner: &'a JsonObject) -> Self {
        Self { inner }
    }

    /// Raw value, treating `null` as absent
    pub fn value(&self, name: &str) -> Option<&'a JsonValue> {
        self.inner.get(name).filter(|v| !v.is_null())
    }

    /// Required value; absent, `null` and `""` are rejected
    pub fn required(&self, name: &str) -> Result<&'a JsonValue> {
        match self.value(name) {
            None => Err(Error::missing_param(name)),
            Some(JsonValue::String(s)) if s.is_empty() => Err(Error::missing_param(name)),
            Some(value) => Ok(value),
        }
    }

    /// Required scalar rendered as text (ids may arrive as numbers)
    pub fn required_str(&self, name: &str) -> Result<String> {
        scalar_text(name, self.required(name)?)
    }

    /// Optional scalar rendered as text; empty strings count as absent
    pub fn optional_str(&self, name: &str) -> Result<Option<String>> {
        match self.value(name) {
            None => Ok(None),
            Some(value) => scalar_text(name, value).map(|s| Some(s).filter(|s| !s.is_empty())),
        }
    }

    /// Optional flag; accepts booleans and `"true"`/`"false"`/`1`/`0`
    pub fn optional_bool(&self, name: &str, default: bool) -> Result<bool> {
        match self.value(name) {
            None => Ok(default),
            Some(JsonValue::Bool(b)) => Ok(*b),
            Some(JsonValue::Number(n)) => Ok(n.as_i64().unwrap_or(0) != 0),
            Some(JsonValue::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "" => Ok(default),
                "true" | "1" | "yes" => Ok(true),
                "false" | "0" | "no" => Ok(false),
                other => Err(Error::invalid_param(
                    name,
                    format!("expected a boolean, got '{other}'"),
                )),
            },
            Some(other) => Err(Error::invalid_param(
                name,
                format!("expected a boolean, got {other}"),
            )),
        }
    }

    /// Optional non-negative integer; numeric strings are accepted
    pub fn optional_u64(&self, name: &str) -> Result<Option<u64>> {
        let Some(value) = self.value(name) else {
            return Ok(None);
        };
        let parsed = match value {
            JsonValue::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
            JsonValue::String(s) if s.trim().is_empty() => return Ok(None),
            JsonValue::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        };
        parsed
            .map(Some)
            .ok_or_else(|| Error::invalid_param(name, format!("expected a non-negative integer, got {value}")))
    }

    /// Optional integer as a count
    pub fn optional_usize(&self, name: &str) -> Result<Option<usize>> {
        Ok(self.optional_u64(name)?.map(|n| n as usize))
    }

    /// Required integer as a count
    pub fn required_usize(&self, name: &str) -> Result<usize> {
        self.required(name)?;
        self.optional_usize(name)?
            .ok_or_else(|| Error::missing_param(name))
    }

    /// Optional nested object; a JSON string holding an object is parsed
    pub fn optional_object(&self, name: &str) -> Result<JsonObject> {
        match self.value(name) {
            None => Ok(JsonObject::new()),
            Some(JsonValue::Object(map)) => Ok(map.clone()),
            Some(JsonValue::String(s)) if s.trim().is_empty() => Ok(JsonObject::new()),
            Some(JsonValue::String(s)) => match serde_json::from_str::<JsonValue>(s) {
                Ok(JsonValue::Object(map)) => Ok(map),
                _ => Err(Error::invalid_param(name, "expected a JSON object")),
            },
            Some(_) => Err(Error::invalid_param(name, "expected an object")),
        }
    }

    /// Optional list of scalars; a comma-separated string is split
    pub fn optional_string_list(&self, name: &str) -> Result<Vec<String>> {
        match self.value(name) {
            None => Ok(Vec::new()),
            Some(value) => string_list(name, value),
        }
    }

    /// Optional JSON document given either inline or as a JSON string
    ///
    /// Strings that fail to parse yield `None`.
    pub fn optional_json(&self, name: &str) -> Option<JsonValue> {
        match self.value(name)? {
            JsonValue::String(s) => serde_json::from_str(s).ok(),
            other => Some(other.clone()),
        }
    }

    /// Nested parameter view over an object parameter
    pub fn object(&self, name: &str) -> Option<Params<'a>> {
        match self.value(name) {
            Some(JsonValue::Object(map)) => Some(Params::new(map)),
            _ => None,
        }
    }

    /// Underlying object
    pub fn as_object(&self) -> &'a JsonObject {
        self.inner
    }
}

/// Render a scalar JSON value as text
fn scalar_text(name: &str, value: &JsonValue) -> Result<String> {
    match value {
        JsonValue::String(s) => Ok(s.clone()),
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::Bool(b) => Ok(b.to_string()),
        _ => Err(Error::invalid_param(name, "expected a scalar value")),
    }
}

/// Interpret a value as a list of non-blank strings
pub(crate) fn string_list(name: &str, value: &JsonValue) -> Result<Vec<String>> {
    match value {
        JsonValue::Array(items) => items
            .iter()
            .filter(|item| !item.is_null())
            .map(|item| scalar_text(name, item))
            .filter(|s| s.as_ref().map_or(true, |s| !s.trim().is_empty()))
            .collect(),
        JsonValue::String(s) => Ok(s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()),
        JsonValue::Number(n) => Ok(vec![n.to_string()]),
        JsonValue::Null => Ok(Vec::new()),
        _ => Err(Error::invalid_param(name, "expected a list")),
    }
}
