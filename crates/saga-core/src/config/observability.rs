use serde::{Deserialize, Serialize};

/// Observability configuration: logging only — this crate has no
/// metrics/dashboard surface, unlike the larger framework its
/// configuration shape is modeled on.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ObservabilityConfig {
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter, e.g. `info`, `debug`, `saga_core=debug,info`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to emit structured JSON instead of pretty text.
    #[serde(default)]
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_observability_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json_format);
    }

    #[test]
    fn test_parse_observability_config() {
        let toml = r#"
            [logging]
            level = "debug"
            json_format = true
        "#;

        let config: ObservabilityConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json_format);
    }
}
