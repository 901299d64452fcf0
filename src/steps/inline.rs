//! Inline code step executor: the same sandboxed-code contract as
//! inline-typed tools, with the code embedded in the step itself.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::StepError;
use crate::graph::Step;
use crate::run::context::{ContextSnapshot, RuntimeContext};

use super::executor::StepExecutor;
use super::run_sandboxed;

#[derive(Debug, Deserialize)]
struct InlineStepConfig {
    code: String,
}

pub struct InlineStepExecutor;

#[async_trait]
impl StepExecutor for InlineStepExecutor {
    async fn execute(
        &self,
        step: &Step,
        input: &Value,
        _snapshot: &ContextSnapshot,
        context: &RuntimeContext,
    ) -> Result<Value, StepError> {
        let config: InlineStepConfig = serde_json::from_value(step.config.clone())
            .map_err(|e| StepError::ConfigError(format!("inline step config: {}", e)))?;
        run_sandboxed(context, &config.code, input).await
    }
}
