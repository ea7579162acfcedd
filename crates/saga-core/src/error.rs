use thiserror::Error;

/// Core error type for saga orchestration.
#[derive(Error, Debug)]
pub enum SagaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Workflow parse error: {0}")]
    WorkflowParse(String),

    #[error("Step transport error: {0}")]
    StepTransport(String),

    #[error("Condition not met: {0}")]
    StepPredicate(String),

    /// A step named a `type` other than `api` or `bus`. Kept distinct from
    /// `StepTransport` because it's a workflow-authoring mistake, not a
    /// network failure, even though both route through the same
    /// FAILED -> ROLLED_BACK path.
    #[error("Unknown step type: {0}")]
    UnknownStepType(String),

    #[error("Rollback failed: {0}")]
    RollbackFailure(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Journal error: {0}")]
    Journal(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

impl From<serde_json::Error> for SagaError {
    fn from(e: serde_json::Error) -> Self {
        SagaError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for SagaError {
    fn from(e: serde_yaml::Error) -> Self {
        SagaError::WorkflowParse(e.to_string())
    }
}

/// Result type alias using SagaError.
pub type Result<T> = std::result::Result<T, SagaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let e = SagaError::UnknownStepType("grpc".into());
        assert_eq!(e.to_string(), "Unknown step type: grpc");

        let e = SagaError::StepPredicate("response.status == 200".into());
        assert_eq!(e.to_string(), "Condition not met: response.status == 200");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let e: SagaError = json_err.into();
        assert!(matches!(e, SagaError::Serialization(_)));
    }
}
