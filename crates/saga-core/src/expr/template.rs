//! `${path.to.value}` substitution against a JSON context.
//!
//! Two modes:
//!
//! - whole-value: the entire string is one placeholder (`"${a.b}"`) — the
//!   resolved value is returned with its native JSON type intact.
//! - embedded-string: placeholders appear inside surrounding text
//!   (`"order:${a.b}"`) — each resolved value is coerced to a string and
//!   concatenated into the result.
//!
//! Missing paths are left as the literal `${...}` text rather than raising,
//! so a downstream condition check fails the step instead of the
//! interpolation step itself.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde_json::Value;

const RESERVED_TIMESTAMP: &str = "current_timestamp";

static WHOLE_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\$\{([^}]+)\}$").unwrap());
static EMBEDDED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$\{([^}]+)\}").unwrap());

/// Resolve a single dotted path against the context. Returns `None` if any
/// segment is missing or the walk hits a non-object value before the path
/// is exhausted.
fn resolve_path(context: &Value, path: &str) -> Option<Value> {
    if path == RESERVED_TIMESTAMP {
        return Some(Value::String(Utc::now().to_rfc3339()));
    }

    let mut current = context;
    for segment in path.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current.clone())
}

/// Coerce a resolved JSON value to the string used in embedded-string mode.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Interpolate a single leaf string value against the context.
///
/// Non-string inputs pass through unchanged (there is nothing to
/// interpolate inside a number or bool leaf).
pub fn interpolate_value(value: &Value, context: &Value) -> Value {
    let Value::String(s) = value else {
        return value.clone();
    };

    if let Some(caps) = WHOLE_VALUE.captures(s) {
        let path = &caps[1];
        return match resolve_path(context, path) {
            Some(resolved) => resolved,
            None => value.clone(),
        };
    }

    if !s.contains("${") {
        return value.clone();
    }

    let replaced = EMBEDDED.replace_all(s, |caps: &regex_lite::Captures| {
        let path = &caps[1];
        match resolve_path(context, path) {
            Some(resolved) => stringify(&resolved),
            None => caps[0].to_string(),
        }
    });
    Value::String(replaced.into_owned())
}

/// Recursively interpolate every leaf string in a JSON tree. Keys are never
/// interpolated, only values.
pub fn interpolate_tree(value: &Value, context: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), interpolate_tree(v, context));
            }
            Value::Object(out)
        }
        Value::Array(items) => {
            Value::Array(items.iter().map(|v| interpolate_tree(v, context)).collect())
        }
        leaf => interpolate_value(leaf, context),
    }
}

/// Interpolate a bare string (not wrapped in a JSON container), used for
/// URLs, topics, and similar scalar template fields.
pub fn interpolate_str(s: &str, context: &Value) -> Value {
    interpolate_value(&Value::String(s.to_string()), context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx() -> Value {
        json!({
            "webhook": {"order_id": "O1", "items": [{"sku": "S", "qty": 2}]},
            "A": {"response": {"status": 200, "body": {"ok": true, "id": "X"}}},
        })
    }

    #[test]
    fn whole_value_preserves_type() {
        let result = interpolate_str("${webhook.items}", &ctx());
        assert_eq!(result, json!([{"sku": "S", "qty": 2}]));
    }

    #[test]
    fn whole_value_number_preserved() {
        let result = interpolate_str("${A.response.status}", &ctx());
        assert_eq!(result, json!(200));
    }

    #[test]
    fn embedded_string_coerces() {
        let result = interpolate_str("order:${webhook.order_id}", &ctx());
        assert_eq!(result, json!("order:O1"));
    }

    #[test]
    fn missing_path_is_identity() {
        let result = interpolate_str("${does.not.exist}", &ctx());
        assert_eq!(result, json!("${does.not.exist}"));
    }

    #[test]
    fn missing_path_embedded_leaves_placeholder() {
        let result = interpolate_str("id:${does.not.exist}", &ctx());
        assert_eq!(result, json!("id:${does.not.exist}"));
    }

    #[test]
    fn reserved_timestamp_resolves() {
        let result = interpolate_str("${current_timestamp}", &ctx());
        let s = result.as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(s).is_ok());
    }

    #[test]
    fn non_string_leaf_passes_through() {
        let v = json!(42);
        assert_eq!(interpolate_value(&v, &ctx()), v);
    }

    #[test]
    fn tree_interpolation_descends_objects_and_lists() {
        let body = json!({
            "order": "${webhook.order_id}",
            "lines": ["${webhook.order_id}", {"nested": "${webhook.order_id}"}],
        });
        let result = interpolate_tree(&body, &ctx());
        assert_eq!(
            result,
            json!({
                "order": "O1",
                "lines": ["O1", {"nested": "O1"}],
            })
        );
    }

    #[test]
    fn tree_interpolation_does_not_touch_keys() {
        let body = json!({"${webhook.order_id}": "value"});
        let result = interpolate_tree(&body, &ctx());
        assert_eq!(result, json!({"${webhook.order_id}": "value"}));
    }
}
