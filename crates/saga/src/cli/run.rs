use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;

use saga_core::ExecutionStatus;

use super::{init_tracing, load_config};

/// Execute a workflow and print the terminal execution as JSON.
#[derive(Parser)]
pub struct RunCommand {
    /// Path to the workflow YAML document.
    #[arg(short, long)]
    pub workflow: PathBuf,

    /// Path to the JSON input payload.
    #[arg(short, long)]
    pub input: PathBuf,

    /// Path to a TOML configuration file. Defaults to the in-memory,
    /// localhost-Kafka reference configuration.
    #[arg(short, long)]
    pub config: Option<String>,

    /// Workflow name to record on the execution (defaults to the
    /// workflow file's stem).
    #[arg(long)]
    pub name: Option<String>,

    /// Workflow version to record on the execution.
    #[arg(long, default_value_t = 1)]
    pub version: u32,
}

impl RunCommand {
    pub async fn execute(self) -> Result<()> {
        let config = load_config(self.config.as_deref())?;
        init_tracing(&config);

        let name = self.name.unwrap_or_else(|| {
            self.workflow
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("workflow")
                .to_string()
        });

        info!(workflow = %name, version = self.version, "loading workflow");
        let workflow = crate::load_workflow(&self.workflow, &name, self.version)?;

        let input_raw = std::fs::read_to_string(&self.input)?;
        let input: serde_json::Value = serde_json::from_str(&input_raw)?;

        let execution = crate::run_workflow(&workflow, input, &config).await?;

        println!("{}", serde_json::to_string_pretty(&execution)?);

        if execution.status != ExecutionStatus::Completed {
            bail!(
                "execution {} ended in {:?}",
                execution.id,
                execution.status
            );
        }

        Ok(())
    }
}
