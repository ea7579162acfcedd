use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

/// Parse a workflow document and report whether it is well-formed, without
/// executing it.
#[derive(Parser)]
pub struct ValidateCommand {
    /// Path to the workflow YAML document.
    #[arg(short, long)]
    pub workflow: PathBuf,

    /// Workflow name to validate under (defaults to the file's stem).
    #[arg(long)]
    pub name: Option<String>,

    /// Workflow version to validate under.
    #[arg(long, default_value_t = 1)]
    pub version: u32,
}

impl ValidateCommand {
    pub async fn execute(self) -> Result<()> {
        let name = self.name.unwrap_or_else(|| {
            self.workflow
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("workflow")
                .to_string()
        });

        let workflow = crate::load_workflow(&self.workflow, &name, self.version)?;

        println!(
            "{} v{}: {} step(s) - OK",
            workflow.name,
            workflow.version,
            workflow.steps.len()
        );

        Ok(())
    }
}
