//! The external collaborator responsible for persisting workflow YAML
//! documents and their enable/disable lifecycle.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{Result, SagaError};
use crate::workflow::definition::WorkflowDefinition;

/// Loads a workflow by id and reports whether it's currently enabled.
/// Definitions in a disabled state must not be executed; the orchestrator
/// itself doesn't check this, so callers must gate on `is_enabled` first.
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    async fn load(&self, id: &str) -> Result<WorkflowDefinition>;
    async fn is_enabled(&self, id: &str) -> Result<bool>;
}

struct Entry {
    definition: WorkflowDefinition,
    enabled: bool,
}

/// In-process reference store. Used by the CLI's `validate` command and by
/// tests that don't need a database-backed store.
#[derive(Default)]
pub struct MemoryWorkflowStore {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryWorkflowStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, id: impl Into<String>, definition: WorkflowDefinition) {
        self.entries.write().await.insert(
            id.into(),
            Entry {
                definition,
                enabled: true,
            },
        );
    }

    pub async fn set_enabled(&self, id: &str, enabled: bool) {
        if let Some(entry) = self.entries.write().await.get_mut(id) {
            entry.enabled = enabled;
        }
    }
}

#[async_trait]
impl WorkflowStore for MemoryWorkflowStore {
    async fn load(&self, id: &str) -> Result<WorkflowDefinition> {
        self.entries
            .read()
            .await
            .get(id)
            .map(|e| e.definition.clone())
            .ok_or_else(|| SagaError::NotFound(format!("workflow '{}' not found", id)))
    }

    async fn is_enabled(&self, id: &str) -> Result<bool> {
        self.entries
            .read()
            .await
            .get(id)
            .map(|e| e.enabled)
            .ok_or_else(|| SagaError::NotFound(format!("workflow '{}' not found", id)))
    }
}
