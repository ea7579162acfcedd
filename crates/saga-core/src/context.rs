//! Per-execution context: the nested JSON document that templates resolve
//! against and that each completed step contributes a subtree to.

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{Result, SagaError};

/// Scoped to one [`Execution`](crate::workflow::execution::Execution).
/// Seeded with `webhook = {correlation_id, ...input}`; each step later adds
/// its own top-level key holding `{response: ...}` or `{bus: ...}`.
pub struct Context {
    value: Value,
}

impl Context {
    /// Build the initial context from the correlation id and the raw
    /// workflow input, which must be a JSON object.
    pub fn new(correlation_id: Uuid, input: Value) -> Result<Self> {
        let Value::Object(mut webhook) = input else {
            return Err(SagaError::InvalidState(
                "workflow input must be a JSON object".to_string(),
            ));
        };
        webhook.insert(
            "correlation_id".to_string(),
            Value::String(correlation_id.to_string()),
        );

        let mut root = Map::new();
        root.insert("webhook".to_string(), Value::Object(webhook));
        Ok(Self {
            value: Value::Object(root),
        })
    }

    pub fn as_value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    /// Record a completed step's subtree under its own name.
    pub fn record_step(&mut self, step_name: &str, subtree: Value) {
        if let Some(obj) = self.value.as_object_mut() {
            obj.insert(step_name.to_string(), subtree);
        }
    }

    /// The subtree previously recorded for a step, or `Null` if absent.
    pub fn step_subtree(&self, step_name: &str) -> Value {
        self.value
            .get(step_name)
            .cloned()
            .unwrap_or(Value::Null)
    }

    /// Hoist an extracted value into `step_name.<key>`, alongside the
    /// `response`/`bus` key already recorded there.
    pub fn extract_into(&mut self, step_name: &str, key: &str, value: Value) {
        if let Some(Value::Object(step_obj)) = self
            .value
            .as_object_mut()
            .and_then(|obj| obj.get_mut(step_name))
        {
            step_obj.insert(key.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn seeds_webhook_with_correlation_id() {
        let id = Uuid::new_v4();
        let ctx = Context::new(id, json!({"order_id": "O1"})).unwrap();
        assert_eq!(
            ctx.as_value().pointer("/webhook/order_id").unwrap(),
            "O1"
        );
        assert_eq!(
            ctx.as_value().pointer("/webhook/correlation_id").unwrap(),
            &json!(id.to_string())
        );
    }

    #[test]
    fn rejects_non_object_input() {
        let id = Uuid::new_v4();
        assert!(Context::new(id, json!("not an object")).is_err());
    }

    #[test]
    fn record_and_extract_round_trip() {
        let mut ctx = Context::new(Uuid::new_v4(), json!({})).unwrap();
        ctx.record_step("A", json!({"response": {"status": 200, "body": {"id": "X"}}}));
        ctx.extract_into("A", "id", json!("X"));

        let subtree = ctx.step_subtree("A");
        assert_eq!(subtree["response"]["status"], 200);
        assert_eq!(subtree["id"], "X");
    }

    #[test]
    fn missing_step_subtree_is_null() {
        let ctx = Context::new(Uuid::new_v4(), json!({})).unwrap();
        assert_eq!(ctx.step_subtree("nope"), Value::Null);
    }
}
