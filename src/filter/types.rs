//! Filter tree types
//!
//! Conditions arrive as loosely typed JSON (`{col, expr, val, nested}`) and
//! are converted once into [`FilterNode`] before compilation.

use crate::error::{Error, Result};
use crate::query::QueryValue;
use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Group Operator
// ============================================================================

/// Boolean operator joining the children of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupOperator {
    #[serde(rename = "andX")]
    And,
    #[serde(rename = "orX")]
    Or,
}

impl GroupOperator {
    /// Wire representation (`andX` / `orX`)
    pub fn as_str(self) -> &'static str {
        match self {
            GroupOperator::And => "andX",
            GroupOperator::Or => "orX",
        }
    }
}

impl fmt::Display for GroupOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupOperator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "andx" | "and" => Ok(Self::And),
            "orx" | "or" => Ok(Self::Or),
            other => Err(Error::filter(format!(
                "unknown group operator '{other}', expected andX or orX"
            ))),
        }
    }
}

// ============================================================================
// Filter Node
// ============================================================================

/// One node of a filter tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterNode {
    /// Leaf comparison, e.g. `email eq a@b.com`
    Simple {
        column: Option<String>,
        expression: Option<String>,
        value: Option<QueryValue>,
    },
    /// Boolean combination of child nodes
    Group {
        operator: GroupOperator,
        nested: Vec<FilterNode>,
    },
}

impl FilterNode {
    /// Leaf node with column, expression and value
    pub fn simple(
        column: impl Into<String>,
        expression: impl Into<String>,
        value: impl Into<QueryValue>,
    ) -> Self {
        Self::Simple {
            column: Some(column.into()),
            expression: Some(expression.into()),
            value: Some(value.into()),
        }
    }

    /// Leaf node without a value (`isNull`, `isNotNull`, ...)
    pub fn unary(column: impl Into<String>, expression: impl Into<String>) -> Self {
        Self::Simple {
            column: Some(column.into()),
            expression: Some(expression.into()),
            value: None,
        }
    }

    /// `andX` group
    pub fn and(nested: Vec<FilterNode>) -> Self {
        Self::Group {
            operator: GroupOperator::And,
            nested,
        }
    }

    /// `orX` group
    pub fn or(nested: Vec<FilterNode>) -> Self {
        Self::Group {
            operator: GroupOperator::Or,
            nested,
        }
    }

    /// True for a leaf that names a column and carries a non-empty value
    pub fn is_complete(&self) -> bool {
        match self {
            Self::Simple { column, value, .. } => {
                column.is_some() && value.as_ref().is_some_and(|v| !v.is_empty_text())
            }
            Self::Group { .. } => true,
        }
    }

    /// Parse a list of conditions from JSON
    ///
    /// Accepts an array of conditions, a single condition object, or an
    /// object wrapping the array under `conditions`.
    pub fn parse_list(value: &JsonValue) -> Result<Vec<FilterNode>> {
        let conditions = match value {
            JsonValue::Array(_) => value.clone(),
            JsonValue::Object(map) => match map.get("conditions") {
                Some(inner @ JsonValue::Array(_)) => inner.clone(),
                _ => JsonValue::Array(vec![value.clone()]),
            },
            JsonValue::Null => return Ok(Vec::new()),
            other => {
                return Err(Error::filter(format!(
                    "expected an array of conditions, got {other}"
                )))
            }
        };

        let raw: Vec<RawCondition> = serde_json::from_value(conditions)
            .map_err(|e| Error::filter(format!("malformed condition: {e}")))?;
        raw.into_iter().map(FilterNode::try_from).collect()
    }
}

// ============================================================================
// Raw Condition
// ============================================================================

/// Condition as supplied by callers before validation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawCondition {
    #[serde(default)]
    pub col: Option<String>,
    #[serde(default)]
    pub expr: Option<String>,
    #[serde(default)]
    pub val: Option<JsonValue>,
    #[serde(default)]
    pub nested: Option<Vec<RawCondition>>,
}

impl TryFrom<RawCondition> for FilterNode {
    type Error = Error;

    fn try_from(raw: RawCondition) -> Result<Self> {
        let expression = raw.expr.filter(|e| !e.is_empty());
        let is_group_expr = expression
            .as_deref()
            .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "andx" | "orx"));

        if !is_group_expr && raw.nested.is_none() {
            return Ok(FilterNode::Simple {
                column: raw.col.filter(|c| !c.is_empty()),
                expression,
                value: raw.val.as_ref().and_then(QueryValue::from_json),
            });
        }

        let operator = match expression.as_deref() {
            Some(expr) => expr.parse::<GroupOperator>().map_err(|_| {
                Error::filter(format!(
                    "nested conditions need an andX or orX expression, got '{expr}'"
                ))
            })?,
            None => GroupOperator::And,
        };
        let nested = raw
            .nested
            .unwrap_or_default()
            .into_iter()
            .map(FilterNode::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok(FilterNode::Group { operator, nested })
    }
}
