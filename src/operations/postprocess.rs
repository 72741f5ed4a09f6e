//! Response shaping shared by the operation handlers

use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use regex::Regex;
use std::sync::LazyLock;

/// Plain integers or decimals without leading zeros
static NUMERIC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?(0|[1-9]\d*)(\.\d+)?$").expect("valid numeric pattern")
});

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

// ============================================================================
// Value Conversion
// ============================================================================

/// Recursively turn numeric strings into JSON numbers
///
/// Integers that do not fit in an `i64` stay strings.
pub fn convert_numeric_strings(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::String(s) => numeric_value(&s).unwrap_or(JsonValue::String(s)),
        JsonValue::Array(items) => {
            JsonValue::Array(items.into_iter().map(convert_numeric_strings).collect())
        }
        JsonValue::Object(map) => JsonValue::Object(
            map.into_iter()
                .map(|(k, v)| (k, convert_numeric_strings(v)))
                .collect(),
        ),
        other => other,
    }
}

fn numeric_value(s: &str) -> Option<JsonValue> {
    if !NUMERIC_RE.is_match(s) {
        return None;
    }
    if s.contains('.') {
        let f = s.parse::<f64>().ok()?;
        serde_json::Number::from_f64(f).map(JsonValue::Number)
    } else {
        s.parse::<i64>().ok().map(JsonValue::from)
    }
}

/// Apply [`convert_numeric_strings`] to every record
pub fn convert_all(items: Vec<JsonValue>) -> Vec<JsonValue> {
    items.into_iter().map(convert_numeric_strings).collect()
}

// ============================================================================
// Output Records
// ============================================================================

/// Normalise a handler result into output records
///
/// Arrays pass through, `null` yields nothing, anything else is one record.
pub fn wrap_single_item(value: JsonValue) -> Vec<JsonValue> {
    match value {
        JsonValue::Null => Vec::new(),
        JsonValue::Array(items) => items,
        other => vec![other],
    }
}

/// The flattened `fields.all` record of an entity, when present
pub fn fields_all(item: &JsonValue) -> Option<&JsonValue> {
    item.pointer("/fields/all").filter(|v| v.is_object())
}

/// Replace each item by its `fields.all` record where one exists
pub fn simplify(items: Vec<JsonValue>) -> Vec<JsonValue> {
    items
        .into_iter()
        .map(|item| fields_all(&item).cloned().unwrap_or(item))
        .collect()
}

/// Shape contact records for output
///
/// Unless `raw` is set, contacts are flattened to `fields.all`. A non-empty
/// `fields_to_return` keeps only the named keys of each record.
pub fn process_contact_fields(
    items: Vec<JsonValue>,
    raw: bool,
    fields_to_return: &[String],
) -> Vec<JsonValue> {
    let items = if raw { items } else { simplify(items) };
    if fields_to_return.is_empty() {
        return items;
    }

    items
        .into_iter()
        .map(|item| match item {
            JsonValue::Object(map) => JsonValue::Object(
                map.into_iter()
                    .filter(|(key, _)| fields_to_return.iter().any(|f| f == key))
                    .collect(),
            ),
            other => other,
        })
        .collect()
}

// ============================================================================
// Request Bodies
// ============================================================================

/// Drop `null` and empty-string values from a request body
pub fn sanitize_body(body: JsonObject) -> JsonObject {
    body.into_iter()
        .filter(|(_, v)| !matches!(v, JsonValue::Null) && v.as_str() != Some(""))
        .collect()
}

/// Reject a body whose `email` is present but malformed
pub fn validate_email(body: &JsonObject) -> Result<()> {
    match body.get("email").and_then(JsonValue::as_str) {
        Some(email) if !EMAIL_RE.is_match(email) => {
            Err(Error::operation(format!("Invalid email format: {email}")))
        }
        _ => Ok(()),
    }
}

/// Insert `value` under `key` unless it is absent or an empty string
pub(crate) fn insert_present(body: &mut JsonObject, key: &str, value: Option<&JsonValue>) {
    if let Some(value) = value.filter(|v| !v.is_null() && v.as_str() != Some("")) {
        body.insert(key.to_string(), value.clone());
    }
}

/// `dateAdded` -> `date_added`
pub fn snake_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 4);
    let mut prev_lower_or_digit = false;
    for ch in input.chars() {
        if ch.is_uppercase() {
            if prev_lower_or_digit {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
            prev_lower_or_digit = false;
        } else if ch == '-' || ch == ' ' || ch == '.' {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            prev_lower_or_digit = false;
        } else {
            out.push(ch);
            prev_lower_or_digit = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }
    out
}

#[cfg(test)]
mod postprocess_tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    #[test_case("42", json!(42) ; "integer")]
    #[test_case("-7", json!(-7) ; "negative")]
    #[test_case("0", json!(0) ; "zero")]
    #[test_case("0.5", json!(0.5) ; "decimal")]
    #[test_case("007", json!("007") ; "leading zeros")]
    #[test_case("12a", json!("12a") ; "mixed")]
    #[test_case("1.", json!("1.") ; "trailing dot")]
    #[test_case("", json!("") ; "empty")]
    #[test_case("99999999999999999999", json!("99999999999999999999") ; "overflow")]
    fn test_convert_numeric_string(input: &str, expected: JsonValue) {
        assert_eq!(convert_numeric_strings(json!(input)), expected);
    }

    #[test]
    fn test_convert_numeric_strings_recurses() {
        let value = json!({
            "id": "12",
            "points": ["1", "x"],
            "fields": { "all": { "score": "3.25", "phone": "0612345678" } },
            "flag": true
        });

        assert_eq!(
            convert_numeric_strings(value),
            json!({
                "id": 12,
                "points": [1, "x"],
                "fields": { "all": { "score": 3.25, "phone": "0612345678" } },
                "flag": true
            })
        );
    }

    #[test]
    fn test_wrap_single_item() {
        assert_eq!(wrap_single_item(json!([1, 2])), vec![json!(1), json!(2)]);
        assert_eq!(wrap_single_item(json!({ "a": 1 })), vec![json!({ "a": 1 })]);
        assert!(wrap_single_item(JsonValue::Null).is_empty());
    }

    #[test]
    fn test_process_contact_fields() {
        let contacts = vec![
            json!({ "id": 1, "fields": { "all": { "id": 1, "email": "a@b.c", "firstname": "A" } } }),
            json!({ "success": true }),
        ];

        let simple = process_contact_fields(contacts.clone(), false, &[]);
        assert_eq!(simple[0], json!({ "id": 1, "email": "a@b.c", "firstname": "A" }));
        assert_eq!(simple[1], json!({ "success": true }));

        let picked = process_contact_fields(contacts.clone(), false, &["email".to_string()]);
        assert_eq!(picked[0], json!({ "email": "a@b.c" }));

        let raw = process_contact_fields(contacts.clone(), true, &[]);
        assert_eq!(raw, contacts);
    }

    #[test]
    fn test_sanitize_and_validate() {
        let body = match json!({ "email": "a@b.co", "firstname": "", "lastname": null, "points": 0 }) {
            JsonValue::Object(map) => map,
            _ => unreachable!(),
        };
        let body = sanitize_body(body);
        assert_eq!(JsonValue::Object(body.clone()), json!({ "email": "a@b.co", "points": 0 }));
        assert!(validate_email(&body).is_ok());

        let mut bad = body;
        bad.insert("email".into(), json!("not-an-email"));
        assert_eq!(
            validate_email(&bad).unwrap_err().to_string(),
            "Invalid email format: not-an-email"
        );
    }

    #[test_case("dateAdded", "date_added")]
    #[test_case("id", "id")]
    #[test_case("lastActive", "last_active")]
    #[test_case("date_modified", "date_modified")]
    #[test_case("points2Total", "points2_total")]
    fn test_snake_case(input: &str, expected: &str) {
        assert_eq!(snake_case(input), expected);
    }
}
