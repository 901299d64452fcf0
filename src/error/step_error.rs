use thiserror::Error;

/// Step-level errors
#[derive(Debug, Error)]
pub enum StepError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Unsupported step type: {0}")]
    UnsupportedStepType(String),
    #[error("Unsupported tool type: {0}")]
    UnsupportedToolType(String),
    #[error("Tool not found: {0}")]
    ToolNotFound(String),
    #[error("Expression error: {0}")]
    ExpressionError(String),
    #[error("Execution error: {0}")]
    ExecutionError(String),
    #[error("Timeout: step execution exceeded {0}s")]
    Timeout(u64),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("HTTP error: {0}")]
    HttpError(String),
    #[error("Sandbox error: {0}")]
    SandboxError(String),
    #[error("Memory store error: {0}")]
    MemoryError(String),
    #[error("Provider error: {0}")]
    ProviderError(String),
}

impl From<serde_json::Error> for StepError {
    fn from(e: serde_json::Error) -> Self {
        StepError::SerializationError(e.to_string())
    }
}

impl From<crate::expr::ExprError> for StepError {
    fn from(e: crate::expr::ExprError) -> Self {
        StepError::ExpressionError(e.to_string())
    }
}
