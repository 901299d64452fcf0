//! Error types for the execution core.
//!
//! - [`StepError`] — errors raised while dispatching a single step.
//! - [`WorkflowError`] — top-level errors for validating, building, and
//!   driving a run.

pub mod step_error;
pub mod workflow_error;

pub use step_error::StepError;
pub use workflow_error::WorkflowError;

/// Convenience alias for run-level results.
pub type WorkflowResult<T> = Result<T, WorkflowError>;
/// Convenience alias for step-level results.
pub type StepResult<T> = Result<T, StepError>;
