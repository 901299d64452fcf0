//! Step dispatch: the executor trait, the type-keyed registry, and one
//! executor per step type.

pub mod executor;
pub mod inference;
pub mod inline;
pub mod llm;
pub mod memory;
pub mod tool;

pub use executor::{StepExecutor, StepExecutorRegistry};
pub use inference::InferenceStepExecutor;
pub use inline::InlineStepExecutor;
pub use llm::LlmStepExecutor;
pub use memory::{MemoryOperation, MemoryStepExecutor};
pub use tool::ToolStepExecutor;

use serde_json::Value;

use crate::error::StepError;
use crate::run::context::RuntimeContext;
use crate::sandbox::{SandboxLimits, SandboxRequest};

/// Run code in the configured sandbox under the hard wall-clock bound.
/// On expiry the execution is cancelled and the step fails with a timeout
/// error; it is never left running.
pub(crate) async fn run_sandboxed(
    context: &RuntimeContext,
    code: &str,
    input: &Value,
) -> Result<Value, StepError> {
    let sandbox = context.require_sandbox()?;
    let request = SandboxRequest {
        code: code.to_string(),
        input: input.clone(),
        limits: SandboxLimits {
            timeout: context.sandbox_timeout,
            ..SandboxLimits::default()
        },
    };

    match tokio::time::timeout(context.sandbox_timeout, sandbox.execute(request)).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(StepError::SandboxError(e.to_string())),
        Err(_) => Err(StepError::Timeout(context.sandbox_timeout.as_secs())),
    }
}
