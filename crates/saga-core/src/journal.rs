//! The durable record of execution and step state transitions.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::Result;
use crate::workflow::execution::{Execution, StepRecord};

/// Persists execution and step transitions as the orchestrator produces
/// them. Implementations must tolerate being called for a step name more
/// than once (`update_step` after `create_step`) and must not reorder
/// writes relative to the order they were called in.
#[async_trait]
pub trait Journal: Send + Sync {
    async fn create_execution(&self, execution: &Execution) -> Result<()>;
    async fn create_step(&self, execution_id: Uuid, step: &StepRecord) -> Result<()>;
    async fn update_step(&self, execution_id: Uuid, step: &StepRecord) -> Result<()>;
    async fn finalize_execution(&self, execution: &Execution) -> Result<()>;
}

/// In-process reference journal, backed by a mutex-guarded map. Used by the
/// CLI when no database URL is configured, and by tests.
#[derive(Default)]
pub struct MemoryJournal {
    executions: Mutex<HashMap<Uuid, Execution>>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, id: Uuid) -> Option<Execution> {
        self.executions.lock().await.get(&id).cloned()
    }
}

#[async_trait]
impl Journal for MemoryJournal {
    async fn create_execution(&self, execution: &Execution) -> Result<()> {
        self.executions
            .lock()
            .await
            .insert(execution.id, execution.clone());
        Ok(())
    }

    async fn create_step(&self, execution_id: Uuid, step: &StepRecord) -> Result<()> {
        if let Some(exec) = self.executions.lock().await.get_mut(&execution_id) {
            exec.steps.push(step.clone());
        }
        Ok(())
    }

    async fn update_step(&self, execution_id: Uuid, step: &StepRecord) -> Result<()> {
        if let Some(exec) = self.executions.lock().await.get_mut(&execution_id) {
            if let Some(existing) = exec.steps.iter_mut().rev().find(|s| s.name == step.name) {
                *existing = step.clone();
            }
        }
        Ok(())
    }

    async fn finalize_execution(&self, execution: &Execution) -> Result<()> {
        self.executions
            .lock()
            .await
            .insert(execution.id, execution.clone());
        Ok(())
    }
}
