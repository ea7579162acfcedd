//! The execution and step-record state machines, and the journal-facing
//! status enums they transition through.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::SagaError;

/// Terminal and non-terminal states of a saga execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
    RolledBack,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::RolledBack => "rolled_back",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::RolledBack)
    }
}

impl FromStr for ExecutionStatus {
    type Err = SagaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "rolled_back" => Self::RolledBack,
            other => {
                return Err(SagaError::InvalidState(format!(
                    "unknown execution status '{}'",
                    other
                )))
            }
        })
    }
}

/// Per-step status, a superset of [`ExecutionStatus`] with `Skipped` for
/// steps never reached because an earlier one failed first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
    RolledBack,
    Skipped,
}

impl StepStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::RolledBack => "rolled_back",
            Self::Skipped => "skipped",
        }
    }
}

impl FromStr for StepStatus {
    type Err = SagaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "rolled_back" => Self::RolledBack,
            "skipped" => Self::Skipped,
            other => {
                return Err(SagaError::InvalidState(format!(
                    "unknown step status '{}'",
                    other
                )))
            }
        })
    }
}

/// A single step's journal record: its own transport snapshot and outcome,
/// independent of the engine's in-memory dispatch state.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub name: String,
    pub step_type: String,
    pub status: StepStatus,
    pub request: Option<Value>,
    pub response: Option<Value>,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl StepRecord {
    pub fn new(name: impl Into<String>, step_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            step_type: step_type.into(),
            status: StepStatus::Pending,
            request: None,
            response: None,
            error: None,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn start(&mut self, request: Value) {
        self.status = StepStatus::Running;
        self.request = Some(request);
        self.started_at = Some(Utc::now());
    }

    pub fn complete(&mut self, response: Value) {
        self.status = StepStatus::Completed;
        self.response = Some(response);
        self.completed_at = Some(Utc::now());
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = StepStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
    }

    pub fn roll_back(&mut self) {
        self.status = StepStatus::RolledBack;
    }
}

/// One run of a [`WorkflowDefinition`](super::definition::WorkflowDefinition)
/// against one input document.
#[derive(Debug, Clone, Serialize)]
pub struct Execution {
    pub id: Uuid,
    pub workflow_name: String,
    pub workflow_version: u32,
    pub input: Value,
    pub status: ExecutionStatus,
    pub output: Option<Value>,
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub steps: Vec<StepRecord>,
}

impl Execution {
    pub fn new(workflow_name: impl Into<String>, workflow_version: u32, input: Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow_name: workflow_name.into(),
            workflow_version,
            input,
            status: ExecutionStatus::Pending,
            output: None,
            error: None,
            started_at: Utc::now(),
            completed_at: None,
            steps: Vec::new(),
        }
    }

    pub fn start(&mut self) {
        self.status = ExecutionStatus::Running;
    }

    pub fn complete(&mut self, output: Value) {
        self.status = ExecutionStatus::Completed;
        self.output = Some(output);
        self.completed_at = Some(Utc::now());
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = ExecutionStatus::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
    }

    pub fn roll_back(&mut self) {
        self.status = ExecutionStatus::RolledBack;
        self.completed_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn execution_transitions() {
        let mut e = Execution::new("checkout", 1, json!({}));
        assert_eq!(e.status, ExecutionStatus::Pending);

        e.start();
        assert_eq!(e.status, ExecutionStatus::Running);

        e.complete(json!({"ok": true}));
        assert_eq!(e.status, ExecutionStatus::Completed);
        assert!(e.completed_at.is_some());
        assert!(e.status.is_terminal());
    }

    #[test]
    fn execution_fail_then_roll_back() {
        let mut e = Execution::new("checkout", 1, json!({}));
        e.start();
        e.fail("Step 'charge' failed: boom");
        assert_eq!(e.status, ExecutionStatus::Failed);
        assert_eq!(e.error.as_deref(), Some("Step 'charge' failed: boom"));

        e.roll_back();
        assert_eq!(e.status, ExecutionStatus::RolledBack);
        assert_eq!(e.error.as_deref(), Some("Step 'charge' failed: boom"));
    }

    #[test]
    fn step_record_transitions() {
        let mut s = StepRecord::new("validate", "api");
        s.start(json!({"url": "https://x"}));
        assert_eq!(s.status, StepStatus::Running);

        s.complete(json!({"status": 200}));
        assert_eq!(s.status, StepStatus::Completed);

        s.roll_back();
        assert_eq!(s.status, StepStatus::RolledBack);
    }

    #[test]
    fn status_round_trips_through_str() {
        assert_eq!(
            "rolled_back".parse::<ExecutionStatus>().unwrap(),
            ExecutionStatus::RolledBack
        );
        assert_eq!(ExecutionStatus::RolledBack.as_str(), "rolled_back");
        assert!("bogus".parse::<StepStatus>().is_err());
    }
}
