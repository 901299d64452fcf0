//! Run-level error types.

use super::StepError;
use crate::graph::ValidationReport;
use thiserror::Error;

/// Run-level errors
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Graph build error: {0}")]
    GraphBuildError(String),
    #[error("Validation failed")]
    ValidationFailed(Box<ValidationReport>),
    #[error("Step not found: {0}")]
    StepNotFound(String),
    #[error("Run not found: {0}")]
    RunNotFound(String),
    #[error("Run already terminal: {0}")]
    RunAlreadyTerminal(String),
    #[error("Max rounds exceeded: {0}")]
    MaxRoundsExceeded(u32),
    #[error("Execution timeout")]
    ExecutionTimeout,
    #[error("No executable steps remain but the run is incomplete")]
    NoProgress,
    #[error("Step execution error: step={step_id}, error={error}")]
    StepExecutionError { step_id: String, error: String },
    #[error("Store error: {0}")]
    StoreError(String),
    #[error("Step error: {0}")]
    StepError(Box<StepError>),
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<StepError> for WorkflowError {
    fn from(value: StepError) -> Self {
        WorkflowError::StepError(Box::new(value))
    }
}
