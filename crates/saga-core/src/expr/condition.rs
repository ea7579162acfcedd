//! Boolean condition evaluation for `success.condition` and similar
//! expressions.
//!
//! Grammar:
//! ```text
//! cond  := term (("&&" | "||") term)*
//! term  := value ("==" | "!=") value
//!        | value
//! value := ${PATH} | literal
//! ```
//!
//! Splitting checks for `&&` before `||` regardless of where each operator
//! actually appears in the expression, rather than a real operator-precedence
//! parse — mixing both operators in one condition is undefined either way,
//! since the grammar above does not allow it.

use serde_json::Value;

use super::template::interpolate_str;

/// Evaluate a condition string against a context (the step's own response
/// subtree, in the `success` case).
pub fn evaluate(condition: &str, context: &Value) -> bool {
    if condition.contains("&&") {
        return condition
            .split("&&")
            .all(|term| evaluate(term.trim(), context));
    }
    if condition.contains("||") {
        return condition
            .split("||")
            .any(|term| evaluate(term.trim(), context));
    }

    let interpolated = interpolate_str(condition, context);
    let interpolated = match &interpolated {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    if let Some((left, right)) = interpolated.split_once("==") {
        return compare(left, right, false);
    }
    if let Some((left, right)) = interpolated.split_once("!=") {
        return compare(left, right, true);
    }

    is_truthy(&interpolated)
}

/// Compare two operand strings, preferring numeric comparison when both
/// sides parse as floats after quote-stripping, falling back to string
/// comparison otherwise.
fn compare(left: &str, right: &str, negate: bool) -> bool {
    let left = left.trim();
    let right = right.trim();

    let equal = match (parse_number(left), parse_number(right)) {
        (Some(l), Some(r)) => l == r,
        _ => strip_quotes(left) == strip_quotes(right),
    };

    if negate {
        !equal
    } else {
        equal
    }
}

fn parse_number(s: &str) -> Option<f64> {
    strip_quotes(s).parse::<f64>().ok()
}

fn strip_quotes(s: &str) -> &str {
    let s = s.trim();
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

/// A bare value (no comparison operator) is truthy unless empty or the
/// literal `false`/`0`.
fn is_truthy(s: &str) -> bool {
    let s = strip_quotes(s);
    !s.is_empty() && s != "false" && s != "0"
}

/// If a `success.condition` references `response.*` without `${}` wrapping,
/// wrap every `response.<dotted>` occurrence in `${...}` so the evaluator
/// can resolve it. The default predicate when none is configured.
pub fn normalize_success_condition(condition: Option<&str>) -> String {
    match condition {
        None => "${response.status} == 200".to_string(),
        Some(c) if c.contains("response.") && !c.contains("${") => wrap_response_refs(c),
        Some(c) => c.to_string(),
    }
}

fn wrap_response_refs(condition: &str) -> String {
    use once_cell::sync::Lazy;
    use regex_lite::Regex;

    static RESPONSE_REF: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"response\.[a-zA-Z0-9_.]+").unwrap());

    RESPONSE_REF
        .replace_all(condition, |caps: &regex_lite::Captures| format!("${{{}}}", &caps[0]))
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_equality() {
        let ctx = json!({"response": {"status": 200}});
        assert!(evaluate("${response.status} == 200", &ctx));
        assert!(!evaluate("${response.status} == 201", &ctx));
    }

    #[test]
    fn string_equality_when_not_numeric() {
        let ctx = json!({"response": {"body": {"ok": "true"}}});
        assert!(evaluate(r#"${response.body.ok} == "true""#, &ctx));
    }

    #[test]
    fn not_equal_operator() {
        let ctx = json!({"response": {"status": 500}});
        assert!(evaluate("${response.status} != 200", &ctx));
    }

    #[test]
    fn bool_value_numeric_mismatch_falls_back_to_string() {
        // response.body.ok == true compares bool-as-string "true" to "true"
        let ctx = json!({"response": {"body": {"ok": true}}});
        assert!(evaluate("${response.body.ok} == true", &ctx));
    }

    #[test]
    fn and_short_circuits_across_terms() {
        let ctx = json!({"response": {"status": 200, "body": {"ok": true}}});
        assert!(evaluate(
            "${response.status} == 200 && ${response.body.ok} == true",
            &ctx
        ));
        assert!(!evaluate(
            "${response.status} == 200 && ${response.body.ok} == false",
            &ctx
        ));
    }

    #[test]
    fn or_across_terms() {
        let ctx = json!({"response": {"status": 201}});
        assert!(evaluate(
            "${response.status} == 200 || ${response.status} == 201",
            &ctx
        ));
    }

    #[test]
    fn bare_value_truthiness() {
        let ctx = json!({"response": {"status": 200}});
        assert!(evaluate("${response.status}", &ctx));
        assert!(!evaluate("false", &ctx));
        assert!(!evaluate("0", &ctx));
        assert!(!evaluate("", &ctx));
    }

    #[test]
    fn default_predicate_when_absent() {
        assert_eq!(
            normalize_success_condition(None),
            "${response.status} == 200"
        );
    }

    #[test]
    fn wraps_bare_response_refs() {
        let normalized = normalize_success_condition(Some("response.body.ok == true"));
        assert_eq!(normalized, "${response.body.ok} == true");
    }

    #[test]
    fn leaves_already_wrapped_condition_untouched() {
        let normalized = normalize_success_condition(Some("${response.body.ok} == true"));
        assert_eq!(normalized, "${response.body.ok} == true");
    }

    #[test]
    fn default_predicate_evaluates_against_200() {
        let ctx = json!({"response": {"status": 200}});
        let cond = normalize_success_condition(None);
        assert!(evaluate(&cond, &ctx));
    }
}
