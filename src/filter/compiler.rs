//! Filter tree to bracket-indexed query compiler

use super::types::FilterNode;
use crate::query::{QueryParams, QueryValue};

/// Prefix used by list endpoints for filter conditions
pub const DEFAULT_PREFIX: &str = "where";

/// Compile a filter tree into flat query keys
///
/// Each node at position `idx` is written under `{prefix}[{idx}]`. Groups
/// emit their operator as `[expr]` and compile their children under
/// `[val]`; a childless group emits an empty `[val]` list. Leaves emit
/// `[col]`, `[expr]` and `[val]` for the parts that are present, with an
/// empty string value left out entirely.
pub fn compile(nodes: &[FilterNode], prefix: &str) -> QueryParams {
    let mut params = QueryParams::new();
    compile_into(nodes, prefix, &mut params);
    params
}

/// Compile under the default `where` prefix
pub fn compile_where(nodes: &[FilterNode]) -> QueryParams {
    compile(nodes, DEFAULT_PREFIX)
}

/// Keep groups and the leaves that name a column and carry a value
pub fn retain_complete(nodes: Vec<FilterNode>) -> Vec<FilterNode> {
    nodes.into_iter().filter(FilterNode::is_complete).collect()
}

fn compile_into(nodes: &[FilterNode], prefix: &str, out: &mut QueryParams) {
    for (idx, node) in nodes.iter().enumerate() {
        let base = format!("{prefix}[{idx}]");
        match node {
            FilterNode::Group { operator, nested } => {
                out.set(format!("{base}[expr]"), operator.as_str());
                if nested.is_empty() {
                    out.set(format!("{base}[val]"), QueryValue::empty_list());
                } else {
                    compile_into(nested, &format!("{base}[val]"), out);
                }
            }
            FilterNode::Simple {
                column,
                expression,
                value,
            } => {
                if let Some(column) = column {
                    out.set(format!("{base}[col]"), column.as_str());
                }
                if let Some(expression) = expression {
                    out.set(format!("{base}[expr]"), expression.as_str());
                }
                if let Some(value) = value.as_ref().filter(|v| !v.is_empty_text()) {
                    out.set(format!("{base}[val]"), value.clone());
                }
            }
        }
    }
}
