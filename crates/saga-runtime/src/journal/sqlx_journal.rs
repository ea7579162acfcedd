//! Postgres-backed [`Journal`] implementation.

use async_trait::async_trait;
use saga_core::workflow::{Execution, ExecutionStatus, StepRecord, StepStatus};
use saga_core::{Journal, Result, SagaError};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Durable execution journal. Tables are created on [`SqlxJournal::connect`]
/// rather than through a separate migration runner: the schema is small and
/// owned entirely by this crate.
pub struct SqlxJournal {
    pool: PgPool,
}

impl SqlxJournal {
    pub async fn connect(url: &str, pool_size: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(pool_size)
            .connect(url)
            .await
            .map_err(|e| SagaError::Journal(e.to_string()))?;

        let journal = Self { pool };
        journal.ensure_schema().await?;
        Ok(journal)
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS saga_executions (
                id UUID PRIMARY KEY,
                workflow_name TEXT NOT NULL,
                workflow_version INT NOT NULL,
                input JSONB NOT NULL,
                output JSONB,
                status TEXT NOT NULL,
                error TEXT,
                started_at TIMESTAMPTZ NOT NULL,
                completed_at TIMESTAMPTZ
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| SagaError::Journal(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS saga_execution_steps (
                execution_id UUID NOT NULL REFERENCES saga_executions(id),
                step_name TEXT NOT NULL,
                step_type TEXT NOT NULL,
                status TEXT NOT NULL,
                request JSONB,
                response JSONB,
                error TEXT,
                started_at TIMESTAMPTZ,
                completed_at TIMESTAMPTZ,
                PRIMARY KEY (execution_id, step_name)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| SagaError::Journal(e.to_string()))?;

        Ok(())
    }

    /// Load a persisted execution and its steps, mainly for inspection
    /// tooling rather than the hot execution path.
    pub async fn load(&self, id: Uuid) -> Result<Execution> {
        let row = sqlx::query(
            r#"
            SELECT id, workflow_name, workflow_version, input, output, status,
                   error, started_at, completed_at
            FROM saga_executions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| SagaError::Journal(e.to_string()))?
        .ok_or_else(|| SagaError::NotFound(format!("execution {} not found", id)))?;

        let status: String = row.get("status");
        let step_rows = sqlx::query(
            r#"
            SELECT step_name, step_type, status, request, response, error,
                   started_at, completed_at
            FROM saga_execution_steps
            WHERE execution_id = $1
            ORDER BY started_at ASC NULLS LAST
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| SagaError::Journal(e.to_string()))?;

        let steps = step_rows
            .into_iter()
            .map(|step_row| {
                let step_status: String = step_row.get("status");
                Ok(StepRecord {
                    name: step_row.get("step_name"),
                    step_type: step_row.get("step_type"),
                    status: step_status.parse::<StepStatus>()?,
                    request: step_row.get("request"),
                    response: step_row.get("response"),
                    error: step_row.get("error"),
                    started_at: step_row.get("started_at"),
                    completed_at: step_row.get("completed_at"),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Execution {
            id: row.get("id"),
            workflow_name: row.get("workflow_name"),
            workflow_version: row.get::<i32, _>("workflow_version") as u32,
            input: row.get("input"),
            status: status.parse::<ExecutionStatus>()?,
            output: row.get("output"),
            error: row.get("error"),
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
            steps,
        })
    }
}

#[async_trait]
impl Journal for SqlxJournal {
    async fn create_execution(&self, execution: &Execution) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO saga_executions (
                id, workflow_name, workflow_version, input, status, started_at
            ) VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(execution.id)
        .bind(&execution.workflow_name)
        .bind(execution.workflow_version as i32)
        .bind(&execution.input)
        .bind(execution.status.as_str())
        .bind(execution.started_at)
        .execute(&self.pool)
        .await
        .map_err(|e| SagaError::Journal(e.to_string()))?;

        Ok(())
    }

    async fn create_step(&self, execution_id: Uuid, step: &StepRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO saga_execution_steps (
                execution_id, step_name, step_type, status
            ) VALUES ($1, $2, $3, $4)
            ON CONFLICT (execution_id, step_name) DO NOTHING
            "#,
        )
        .bind(execution_id)
        .bind(&step.name)
        .bind(&step.step_type)
        .bind(step.status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| SagaError::Journal(e.to_string()))?;

        Ok(())
    }

    async fn update_step(&self, execution_id: Uuid, step: &StepRecord) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE saga_execution_steps
            SET status = $3, request = $4, response = $5, error = $6,
                started_at = $7, completed_at = $8
            WHERE execution_id = $1 AND step_name = $2
            "#,
        )
        .bind(execution_id)
        .bind(&step.name)
        .bind(step.status.as_str())
        .bind(&step.request)
        .bind(&step.response)
        .bind(&step.error)
        .bind(step.started_at)
        .bind(step.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| SagaError::Journal(e.to_string()))?;

        Ok(())
    }

    async fn finalize_execution(&self, execution: &Execution) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE saga_executions
            SET status = $2, output = $3, error = $4, completed_at = $5
            WHERE id = $1
            "#,
        )
        .bind(execution.id)
        .bind(execution.status.as_str())
        .bind(&execution.output)
        .bind(&execution.error)
        .bind(execution.completed_at)
        .execute(&self.pool)
        .await
        .map_err(|e| SagaError::Journal(e.to_string()))?;

        Ok(())
    }
}
