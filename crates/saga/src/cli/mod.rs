mod run;
mod validate;

pub use run::RunCommand;
pub use validate::ValidateCommand;

use anyhow::Result;
use clap::{Parser, Subcommand};
use saga_core::config::SagaConfig;

/// Saga workflow orchestrator CLI.
#[derive(Parser)]
#[command(name = "saga")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a workflow against real HTTP/bus adapters.
    Run(RunCommand),

    /// Parse and validate a workflow document without executing it.
    Validate(ValidateCommand),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run(cmd) => cmd.execute().await,
            Commands::Validate(cmd) => cmd.execute().await,
        }
    }
}

/// Load configuration from `path` if given, otherwise fall back to the
/// runnable in-memory defaults.
fn load_config(path: Option<&str>) -> Result<SagaConfig> {
    match path {
        Some(path) => Ok(SagaConfig::from_file(path)?),
        None => Ok(SagaConfig::default()),
    }
}

fn init_tracing(config: &SagaConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.observability.logging.level.clone()));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    if config.observability.logging.json_format {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::try_parse_from([
            "saga",
            "run",
            "--workflow",
            "wf.yaml",
            "--input",
            "in.json",
        ]);
        assert!(cli.is_ok());
    }

    #[test]
    fn test_cli_parse_validate() {
        let cli = Cli::try_parse_from(["saga", "validate", "--workflow", "wf.yaml"]);
        assert!(cli.is_ok());
    }

    #[test]
    fn test_load_config_defaults_without_path() {
        let config = load_config(None).unwrap();
        assert_eq!(config.http.timeout_secs, 30);
    }
}
