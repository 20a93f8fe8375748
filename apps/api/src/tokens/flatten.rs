//! Flattening of the nested token tree into `kebab-case` variable names.
//!
//! `{"roleBox": {"docx": {"borderColor": "#333"}}}` → `role-box-docx-border-color: #333`.
//! Key order follows the source document (serde_json is built with `preserve_order`).

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::warn;

static CAMEL_BOUNDARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());

/// Converts a camelCase key to kebab-case. Already-kebab keys pass through unchanged.
pub fn kebab_case(key: &str) -> String {
    CAMEL_BOUNDARY.replace_all(key, "$1-$2").to_lowercase()
}

/// Joins a parent prefix and a child key. Top-level keys get no leading separator.
pub fn flat_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        kebab_case(key)
    } else {
        format!("{prefix}-{}", kebab_case(key))
    }
}

/// Recursively flattens `tree`. Object values recurse; every other value is a leaf
/// and is emitted as-is under its joined key.
///
/// Distinct source keys can share a flat name (`marginTop` and `margin-top`). The later
/// one in document order wins and a warning is logged.
pub fn flatten(tree: &Map<String, Value>, prefix: &str) -> Map<String, Value> {
    let (flat, collisions) = flatten_with_collisions(tree, prefix);
    for name in &collisions {
        warn!("Token name '{name}' is produced by more than one source key; the later one wins");
    }
    flat
}

/// Like [`flatten`], also returning each flat name that more than one leaf mapped to.
pub fn flatten_with_collisions(
    tree: &Map<String, Value>,
    prefix: &str,
) -> (Map<String, Value>, Vec<String>) {
    let mut flat = Map::new();
    let mut collisions = Vec::new();
    flatten_into(tree, prefix, &mut flat, &mut collisions);
    (flat, collisions)
}

fn flatten_into(
    tree: &Map<String, Value>,
    prefix: &str,
    out: &mut Map<String, Value>,
    collisions: &mut Vec<String>,
) {
    for (key, value) in tree {
        let name = flat_key(prefix, key);
        match value {
            Value::Object(child) => flatten_into(child, &name, out, collisions),
            leaf => {
                if out.insert(name.clone(), leaf.clone()).is_some() && !collisions.contains(&name) {
                    collisions.push(name);
                }
            }
        }
    }
}

/// Renders a leaf value as stylesheet text.
///
/// Strings are verbatim, numbers use their JSON form, arrays (font stacks) are joined
/// with `, `. `null` has no stylesheet form and yields `None`.
pub fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(render_value)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Object(_) => None,
    }
}
