//! The saga execution engine: dispatches each step in order, applies the
//! success predicate, and runs reverse-order compensation on failure.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::context::Context;
use crate::error::{Result, SagaError};
use crate::expr::{
    evaluate_condition, interpolate_str, interpolate_tree, normalize_success_condition,
};
use crate::journal::Journal;
use crate::workflow::adapters::{BusPublisher, HttpClient};
use crate::workflow::definition::{
    ApiStep, BusStep, Compensation, CompensationApi, CompensationBus, StepDefinition,
    WorkflowDefinition,
};
use crate::workflow::execution::{Execution, StepRecord, StepStatus};

/// The collaborators a single `execute` call dispatches through, bundled so
/// the entry point doesn't take four separate parameters.
pub struct Adapters<'a> {
    pub http: &'a dyn HttpClient,
    pub bus: &'a dyn BusPublisher,
    pub journal: &'a dyn Journal,
    pub http_timeout: Duration,
    pub bus_ack_timeout: Duration,
}

/// Execute a workflow definition end to end and return the terminal
/// [`Execution`]. Failures are captured as `ExecutionStatus` rather than
/// surfaced as `Err` — the only `Err` path is a journal I/O failure, which
/// the caller can't recover from either way.
pub async fn execute(
    workflow: &WorkflowDefinition,
    input: Value,
    adapters: &Adapters<'_>,
) -> Result<Execution> {
    let mut execution = Execution::new(workflow.name.clone(), workflow.version, input.clone());
    let mut context = Context::new(execution.id, input)?;
    execution.start();
    adapters.journal.create_execution(&execution).await?;

    let mut failure: Option<String> = None;

    for step_def in &workflow.steps {
        let mut record = StepRecord::new(step_def.name(), step_type_label(step_def));
        adapters.journal.create_step(execution.id, &record).await?;

        let outcome = dispatch_step(step_def, &mut context, &mut record, adapters).await;
        adapters.journal.update_step(execution.id, &record).await?;
        execution.steps.push(record);

        if let Err(e) = outcome {
            failure = Some(format!("Step '{}' failed: {}", step_def.name(), e));
            break;
        }
    }

    match failure {
        None => {
            info!(execution = %execution.id, workflow = %workflow.name, "execution completed");
            execution.complete(context.into_value());
        }
        Some(message) => {
            execution.fail(message);
            compensate(workflow, &context, &mut execution, adapters).await?;
        }
    }

    adapters.journal.finalize_execution(&execution).await?;
    Ok(execution)
}

fn step_type_label(step_def: &StepDefinition) -> &'static str {
    match step_def {
        StepDefinition::Api(_) => "api",
        StepDefinition::Bus(_) => "bus",
        StepDefinition::Unknown { .. } => "unknown",
    }
}

async fn dispatch_step(
    step_def: &StepDefinition,
    context: &mut Context,
    record: &mut StepRecord,
    adapters: &Adapters<'_>,
) -> Result<()> {
    match step_def {
        StepDefinition::Api(step) => dispatch_api_step(step, context, record, adapters).await,
        StepDefinition::Bus(step) => dispatch_bus_step(step, context, record, adapters).await,
        StepDefinition::Unknown { type_name, .. } => {
            let err = SagaError::UnknownStepType(type_name.clone());
            record.fail(err.to_string());
            Err(err)
        }
    }
}

fn template_string(template: &str, context: &Context) -> String {
    match interpolate_str(template, context.as_value()) {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn interpolate_headers(
    headers: &HashMap<String, String>,
    context: &Context,
) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(k, v)| (k.clone(), template_string(v, context)))
        .collect()
}

async fn dispatch_api_step(
    step: &ApiStep,
    context: &mut Context,
    record: &mut StepRecord,
    adapters: &Adapters<'_>,
) -> Result<()> {
    let url = template_string(&step.url, context);
    let headers = interpolate_headers(&step.headers, context);
    let body = step
        .body
        .as_ref()
        .map(|b| interpolate_tree(b, context.as_value()));

    record.start(json!({
        "url": url,
        "method": step.method,
        "headers": headers,
        "body": body,
    }));

    let call = adapters
        .http
        .request(&step.method, &url, headers, body.clone());

    let response = match tokio::time::timeout(adapters.http_timeout, call).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => {
            record.fail(e.to_string());
            return Err(e);
        }
        Err(_) => {
            let err = SagaError::Timeout(format!(
                "step '{}' timed out waiting for HTTP response",
                step.name
            ));
            record.fail(err.to_string());
            return Err(err);
        }
    };

    let response_value = json!({"status": response.status, "body": response.body});
    record.complete(response_value.clone());
    context.record_step(&step.name, json!({"response": response_value}));

    let condition = normalize_success_condition(step.success_condition.as_deref());
    let step_subtree = context.step_subtree(&step.name);
    if !evaluate_condition(&condition, &step_subtree) {
        let err = SagaError::StepPredicate(condition);
        record.fail(err.to_string());
        return Err(err);
    }

    for (key, path) in &step.extract {
        let wrapped = if path.starts_with("${") {
            path.clone()
        } else {
            format!("${{{}}}", path)
        };
        let value = interpolate_str(&wrapped, &context.step_subtree(&step.name));
        context.extract_into(&step.name, key, value);
    }

    Ok(())
}

async fn dispatch_bus_step(
    step: &BusStep,
    context: &mut Context,
    record: &mut StepRecord,
    adapters: &Adapters<'_>,
) -> Result<()> {
    let topic = template_string(&step.topic, context);
    let key = step
        .partition_key
        .as_ref()
        .map(|k| template_string(k, context))
        .filter(|k| !k.is_empty());
    let headers = interpolate_headers(&step.headers, context);
    let body = step
        .body
        .as_ref()
        .map(|b| interpolate_tree(b, context.as_value()))
        .unwrap_or(Value::Null);

    record.start(json!({
        "topic": topic,
        "partition_key": key,
        "headers": headers,
        "body": body,
    }));

    let call = adapters.bus.publish(&topic, key.clone(), headers, body);

    let ack = match tokio::time::timeout(adapters.bus_ack_timeout, call).await {
        Ok(Ok(ack)) => ack,
        Ok(Err(e)) => {
            record.fail(e.to_string());
            return Err(e);
        }
        Err(_) => {
            let err = SagaError::Timeout(format!(
                "step '{}' timed out waiting for bus acknowledgement",
                step.name
            ));
            record.fail(err.to_string());
            return Err(err);
        }
    };

    let bus_value = json!({
        "topic": topic,
        "partition": ack.partition,
        "offset": ack.offset,
        "ack_received": true,
    });
    record.complete(bus_value.clone());
    context.record_step(&step.name, json!({"bus": bus_value}));

    Ok(())
}

/// Reverse-order compensation sweep over every step that reached
/// COMPLETED. The step that caused the failure never appears here, since
/// only completed steps are iterated. Rollback failures are logged and
/// swallowed so the sweep always runs to completion.
async fn compensate(
    workflow: &WorkflowDefinition,
    context: &Context,
    execution: &mut Execution,
    adapters: &Adapters<'_>,
) -> Result<()> {
    let completed_in_reverse: Vec<String> = execution
        .steps
        .iter()
        .filter(|s| s.status == StepStatus::Completed)
        .map(|s| s.name.clone())
        .rev()
        .collect();

    for name in completed_in_reverse {
        let Some(step_def) = workflow.step(&name) else {
            continue;
        };

        if let Some(rollback) = step_def.rollback() {
            if let Err(e) = dispatch_compensation(rollback, context, adapters).await {
                warn!(step = %name, error = %e, "rollback failed, continuing sweep");
            }
        }

        mark_rolled_back(execution, &name);
        if let Some(record) = execution.steps.iter().find(|s| s.name == name) {
            adapters.journal.update_step(execution.id, record).await?;
        }
    }

    execution.roll_back();
    Ok(())
}

fn mark_rolled_back(execution: &mut Execution, name: &str) {
    if let Some(record) = execution.steps.iter_mut().find(|s| s.name == name) {
        record.roll_back();
    }
}

async fn dispatch_compensation(
    rollback: &Compensation,
    context: &Context,
    adapters: &Adapters<'_>,
) -> Result<()> {
    match rollback {
        Compensation::Api(c) => dispatch_api_compensation(c, context, adapters).await,
        Compensation::Bus(c) => dispatch_bus_compensation(c, context, adapters).await,
    }
}

async fn dispatch_api_compensation(
    c: &CompensationApi,
    context: &Context,
    adapters: &Adapters<'_>,
) -> Result<()> {
    let url = template_string(&c.url, context);
    let headers = interpolate_headers(&c.headers, context);
    let body = c
        .body
        .as_ref()
        .map(|b| interpolate_tree(b, context.as_value()));

    tokio::time::timeout(
        adapters.http_timeout,
        adapters.http.request(&c.method, &url, headers, body),
    )
    .await
    .map_err(|_| SagaError::Timeout(format!("rollback to '{}' timed out", url)))?
    .map_err(|e| SagaError::RollbackFailure(e.to_string()))?;
    Ok(())
}

async fn dispatch_bus_compensation(
    c: &CompensationBus,
    context: &Context,
    adapters: &Adapters<'_>,
) -> Result<()> {
    let topic = template_string(&c.topic, context);
    let key = c
        .partition_key
        .as_ref()
        .map(|k| template_string(k, context))
        .filter(|k| !k.is_empty());
    let headers = interpolate_headers(&c.headers, context);
    let body = c
        .body
        .as_ref()
        .map(|b| interpolate_tree(b, context.as_value()))
        .unwrap_or(Value::Null);

    tokio::time::timeout(
        adapters.bus_ack_timeout,
        adapters.bus.publish(&topic, key, headers, body),
    )
    .await
    .map_err(|_| SagaError::Timeout(format!("rollback publish to '{}' timed out", topic)))?
    .map_err(|e| SagaError::RollbackFailure(e.to_string()))?;
    Ok(())
}
