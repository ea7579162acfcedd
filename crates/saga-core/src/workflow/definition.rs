//! Workflow definitions: the parsed, validated shape of a YAML document's
//! `executions` list.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::error::{Result, SagaError};

/// An immutable workflow: a name, a version, and an ordered sequence of
/// steps. `name`/`version` come from the caller (typically a
/// [`WorkflowStore`](crate::store::WorkflowStore) row) since the YAML
/// document itself carries only the `executions` list.
#[derive(Debug, Clone)]
pub struct WorkflowDefinition {
    pub name: String,
    pub version: u32,
    pub steps: Vec<StepDefinition>,
}

impl WorkflowDefinition {
    /// Parse and eagerly validate a YAML document's `executions` list.
    pub fn parse(name: impl Into<String>, version: u32, yaml: &str) -> Result<Self> {
        let doc: Value = serde_yaml::from_str(yaml)?;
        let steps = parse_steps(&doc)?;
        Ok(Self {
            name: name.into(),
            version,
            steps,
        })
    }

    pub fn step(&self, name: &str) -> Option<&StepDefinition> {
        self.steps.iter().find(|s| s.name() == name)
    }
}

/// A single step. Unknown `type` values are preserved rather than rejected
/// at parse time: execution must fail and compensate earlier steps when the
/// orchestrator reaches the step, not when the document is loaded.
#[derive(Debug, Clone)]
pub enum StepDefinition {
    Api(ApiStep),
    Bus(BusStep),
    Unknown { name: String, type_name: String },
}

impl StepDefinition {
    pub fn name(&self) -> &str {
        match self {
            Self::Api(s) => &s.name,
            Self::Bus(s) => &s.name,
            Self::Unknown { name, .. } => name,
        }
    }

    pub fn rollback(&self) -> Option<&Compensation> {
        match self {
            Self::Api(s) => s.rollback.as_ref(),
            Self::Bus(s) => s.rollback.as_ref(),
            Self::Unknown { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiStep {
    pub name: String,
    pub url: String,
    pub method: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
    pub success_condition: Option<String>,
    pub extract: HashMap<String, String>,
    pub rollback: Option<Compensation>,
}

#[derive(Debug, Clone)]
pub struct BusStep {
    pub name: String,
    pub topic: String,
    pub partition_key: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
    pub rollback: Option<Compensation>,
}

#[derive(Debug, Clone)]
pub enum Compensation {
    Api(CompensationApi),
    Bus(CompensationBus),
}

#[derive(Debug, Clone)]
pub struct CompensationApi {
    pub url: String,
    pub method: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct CompensationBus {
    pub topic: String,
    pub partition_key: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Option<Value>,
}

fn parse_steps(doc: &Value) -> Result<Vec<StepDefinition>> {
    let executions = doc
        .get("executions")
        .and_then(Value::as_array)
        .ok_or_else(|| SagaError::WorkflowParse("missing top-level 'executions' list".to_string()))?;

    if executions.is_empty() {
        return Err(SagaError::WorkflowParse(
            "'executions' must not be empty".to_string(),
        ));
    }

    let mut steps = Vec::with_capacity(executions.len());
    let mut seen = HashSet::new();

    for raw in executions {
        let name = require_str(raw, "name", "<unnamed step>")?.to_string();
        if !seen.insert(name.clone()) {
            return Err(SagaError::WorkflowParse(format!(
                "duplicate step name '{}'",
                name
            )));
        }

        let type_name = require_str(raw, "type", &name)?.to_string();
        let step = match type_name.as_str() {
            "api" => StepDefinition::Api(parse_api_step(name, raw)?),
            "bus" => StepDefinition::Bus(parse_bus_step(name, raw)?),
            other => StepDefinition::Unknown {
                name,
                type_name: other.to_string(),
            },
        };
        steps.push(step);
    }

    Ok(steps)
}

fn require_str<'a>(v: &'a Value, key: &str, step_name: &str) -> Result<&'a str> {
    v.get(key).and_then(Value::as_str).ok_or_else(|| {
        SagaError::WorkflowParse(format!(
            "step '{}': missing or invalid '{}'",
            step_name, key
        ))
    })
}

fn parse_headers(endpoint: &Value, step_name: &str) -> Result<HashMap<String, String>> {
    match endpoint.get("headers") {
        None | Some(Value::Null) => Ok(HashMap::new()),
        Some(Value::Object(map)) => {
            let mut out = HashMap::with_capacity(map.len());
            for (k, val) in map {
                let s = val.as_str().ok_or_else(|| {
                    SagaError::WorkflowParse(format!(
                        "step '{}': header '{}' must be a string",
                        step_name, k
                    ))
                })?;
                out.insert(k.clone(), s.to_string());
            }
            Ok(out)
        }
        Some(_) => Err(SagaError::WorkflowParse(format!(
            "step '{}': 'headers' must be a mapping",
            step_name
        ))),
    }
}

fn parse_api_step(name: String, raw: &Value) -> Result<ApiStep> {
    let endpoint = raw
        .get("endpoint")
        .ok_or_else(|| SagaError::WorkflowParse(format!("step '{}': missing 'endpoint'", name)))?;
    let url = require_str(endpoint, "url", &name)?.to_string();
    let method = endpoint
        .get("method")
        .and_then(Value::as_str)
        .unwrap_or("POST")
        .to_uppercase();
    let headers = parse_headers(endpoint, &name)?;
    let body = raw.get("body").cloned();

    let (success_condition, extract) = match raw.get("success") {
        None | Some(Value::Null) => (None, HashMap::new()),
        Some(success) => {
            let condition = success
                .get("condition")
                .and_then(Value::as_str)
                .map(str::to_string);
            let extract = parse_extract(&name, success)?;
            (condition, extract)
        }
    };

    let rollback = parse_rollback(&name, raw)?;

    Ok(ApiStep {
        name,
        url,
        method,
        headers,
        body,
        success_condition,
        extract,
        rollback,
    })
}

fn parse_extract(step_name: &str, success: &Value) -> Result<HashMap<String, String>> {
    match success.get("extract") {
        None | Some(Value::Null) => Ok(HashMap::new()),
        Some(Value::Object(map)) => {
            let mut out = HashMap::with_capacity(map.len());
            for (k, v) in map {
                let path = v.as_str().ok_or_else(|| {
                    SagaError::WorkflowParse(format!(
                        "step '{}': success.extract.{} must be a string path",
                        step_name, k
                    ))
                })?;
                out.insert(k.clone(), path.to_string());
            }
            Ok(out)
        }
        Some(_) => Err(SagaError::WorkflowParse(format!(
            "step '{}': 'success.extract' must be a mapping",
            step_name
        ))),
    }
}

fn parse_bus_step(name: String, raw: &Value) -> Result<BusStep> {
    let endpoint = raw
        .get("endpoint")
        .ok_or_else(|| SagaError::WorkflowParse(format!("step '{}': missing 'endpoint'", name)))?;
    let topic = require_str(endpoint, "topic", &name)?.to_string();
    let partition_key = endpoint
        .get("partition_key")
        .and_then(Value::as_str)
        .map(str::to_string);
    let headers = parse_headers(endpoint, &name)?;
    let body = raw.get("body").cloned();
    let rollback = parse_rollback(&name, raw)?;

    Ok(BusStep {
        name,
        topic,
        partition_key,
        headers,
        body,
        rollback,
    })
}

/// `rollback: null` or an absent key is a valid no-op. A present mapping
/// missing `endpoint` is a malformed definition, not a no-op: those are
/// different YAML shapes and only the former is a valid omission.
fn parse_rollback(step_name: &str, raw: &Value) -> Result<Option<Compensation>> {
    let rollback = match raw.get("rollback") {
        None | Some(Value::Null) => return Ok(None),
        Some(r) => r,
    };

    let type_name = rollback.get("type").and_then(Value::as_str).unwrap_or("api");
    let endpoint = rollback.get("endpoint").ok_or_else(|| {
        SagaError::WorkflowParse(format!("step '{}': rollback missing 'endpoint'", step_name))
    })?;
    let body = rollback.get("body").cloned();
    let headers = parse_headers(endpoint, step_name)?;

    match type_name {
        "api" => {
            let url = require_str(endpoint, "url", step_name)?.to_string();
            let method = endpoint
                .get("method")
                .and_then(Value::as_str)
                .unwrap_or("POST")
                .to_uppercase();
            Ok(Some(Compensation::Api(CompensationApi {
                url,
                method,
                headers,
                body,
            })))
        }
        "bus" => {
            let topic = require_str(endpoint, "topic", step_name)?.to_string();
            let partition_key = endpoint
                .get("partition_key")
                .and_then(Value::as_str)
                .map(str::to_string);
            Ok(Some(Compensation::Bus(CompensationBus {
                topic,
                partition_key,
                headers,
                body,
            })))
        }
        other => Err(SagaError::WorkflowParse(format!(
            "step '{}': rollback has unknown type '{}'",
            step_name, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_api_yaml() -> &'static str {
        r#"
executions:
  - name: validate
    type: api
    endpoint:
      url: "https://svc/v"
    body:
      id: "${webhook.order_id}"
"#
    }

    #[test]
    fn parses_minimal_api_step_with_defaults() {
        let wf = WorkflowDefinition::parse("checkout", 1, minimal_api_yaml()).unwrap();
        assert_eq!(wf.steps.len(), 1);
        let StepDefinition::Api(step) = &wf.steps[0] else {
            panic!("expected api step");
        };
        assert_eq!(step.method, "POST");
        assert!(step.headers.is_empty());
        assert!(step.success_condition.is_none());
        assert!(step.rollback.is_none());
    }

    #[test]
    fn rejects_missing_executions() {
        let err = WorkflowDefinition::parse("x", 1, "foo: bar").unwrap_err();
        assert!(matches!(err, SagaError::WorkflowParse(_)));
    }

    #[test]
    fn rejects_empty_executions() {
        let err = WorkflowDefinition::parse("x", 1, "executions: []").unwrap_err();
        assert!(matches!(err, SagaError::WorkflowParse(_)));
    }

    #[test]
    fn rejects_duplicate_step_names() {
        let yaml = r#"
executions:
  - name: a
    type: api
    endpoint: { url: "https://svc/1" }
  - name: a
    type: api
    endpoint: { url: "https://svc/2" }
"#;
        let err = WorkflowDefinition::parse("x", 1, yaml).unwrap_err();
        assert!(matches!(err, SagaError::WorkflowParse(_)));
    }

    #[test]
    fn unknown_type_parses_successfully() {
        let yaml = r#"
executions:
  - name: a
    type: grpc
    endpoint: { url: "https://svc/1" }
"#;
        let wf = WorkflowDefinition::parse("x", 1, yaml).unwrap();
        assert!(matches!(
            &wf.steps[0],
            StepDefinition::Unknown { type_name, .. } if type_name == "grpc"
        ));
    }

    #[test]
    fn parses_bus_step() {
        let yaml = r#"
executions:
  - name: publish
    type: bus
    endpoint:
      topic: "events.${webhook.kind}"
      partition_key: "${webhook.id}"
    body:
      payload: "${webhook}"
"#;
        let wf = WorkflowDefinition::parse("x", 1, yaml).unwrap();
        let StepDefinition::Bus(step) = &wf.steps[0] else {
            panic!("expected bus step");
        };
        assert_eq!(step.topic, "events.${webhook.kind}");
        assert_eq!(step.partition_key.as_deref(), Some("${webhook.id}"));
    }

    #[test]
    fn rollback_null_is_no_op() {
        let yaml = r#"
executions:
  - name: a
    type: api
    endpoint: { url: "https://svc/1" }
    rollback: null
"#;
        let wf = WorkflowDefinition::parse("x", 1, yaml).unwrap();
        assert!(wf.steps[0].rollback().is_none());
    }

    #[test]
    fn rollback_missing_endpoint_is_parse_error() {
        let yaml = r#"
executions:
  - name: a
    type: api
    endpoint: { url: "https://svc/1" }
    rollback:
      type: api
"#;
        let err = WorkflowDefinition::parse("x", 1, yaml).unwrap_err();
        assert!(matches!(err, SagaError::WorkflowParse(_)));
    }

    #[test]
    fn rollback_defaults_to_api_type() {
        let yaml = r#"
executions:
  - name: a
    type: api
    endpoint: { url: "https://svc/1" }
    rollback:
      endpoint: { url: "https://svc/1/rollback" }
"#;
        let wf = WorkflowDefinition::parse("x", 1, yaml).unwrap();
        assert!(matches!(
            wf.steps[0].rollback(),
            Some(Compensation::Api(_))
        ));
    }

    #[test]
    fn non_string_header_is_parse_error() {
        let yaml = r#"
executions:
  - name: a
    type: api
    endpoint:
      url: "https://svc/1"
      headers:
        x-count: 5
"#;
        let err = WorkflowDefinition::parse("x", 1, yaml).unwrap_err();
        assert!(matches!(err, SagaError::WorkflowParse(_)));
    }
}
