//! Library surface for the `saga` binary: wires `saga-core`'s orchestrator
//! to `saga-runtime`'s concrete adapters so the CLI itself stays thin.

pub mod cli;

use std::path::Path;

use saga_core::config::SagaConfig;
use saga_core::{execute, Adapters, Execution, Journal, MemoryJournal, Result, WorkflowDefinition};
use saga_runtime::{ReqwestHttpClient, SqlxJournal};

/// A workflow document read off disk, still carrying the name/version the
/// caller supplied since neither appears inside the YAML itself.
pub fn load_workflow(path: &Path, name: &str, version: u32) -> Result<WorkflowDefinition> {
    let yaml = std::fs::read_to_string(path)
        .map_err(|e| saga_core::SagaError::Config(format!("failed to read {}: {}", path.display(), e)))?;
    WorkflowDefinition::parse(name, version, &yaml)
}

/// Run a parsed workflow to completion against real I/O adapters, selecting
/// an in-memory or Postgres-backed journal depending on `config.journal.url`.
pub async fn run_workflow(
    workflow: &WorkflowDefinition,
    input: serde_json::Value,
    config: &SagaConfig,
) -> Result<Execution> {
    let http = ReqwestHttpClient::new();
    let bus = saga_runtime::RdKafkaBusPublisher::new(
        &config.bus.bootstrap_servers,
        config.bus.ack_timeout(),
    )?;

    let memory_journal;
    let sqlx_journal;
    let journal: &dyn Journal = if config.journal.url.is_empty() {
        memory_journal = MemoryJournal::new();
        &memory_journal
    } else {
        sqlx_journal = SqlxJournal::connect(&config.journal.url, config.journal.pool_size).await?;
        &sqlx_journal
    };

    let adapters = Adapters {
        http: &http,
        bus: &bus,
        journal,
        http_timeout: config.http.timeout(),
        bus_ack_timeout: config.bus.ack_timeout(),
    };

    execute(workflow, input, &adapters).await
}
