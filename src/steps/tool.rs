//! Tool step executor.
//!
//! Resolves the referenced tool through the registry collaborator and runs
//! it according to its stored kind: inline code goes to the sandbox, http
//! tools are invoked with a JSON POST, lambda tools are not executable in
//! this environment and fail fast instead of hanging.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::StepError;
use crate::graph::Step;
use crate::providers::ToolKind;
use crate::run::context::{ContextSnapshot, RuntimeContext};

use super::executor::StepExecutor;
use super::run_sandboxed;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolStepConfig {
    tool_id: String,
}

pub struct ToolStepExecutor;

#[async_trait]
impl StepExecutor for ToolStepExecutor {
    async fn execute(
        &self,
        step: &Step,
        input: &Value,
        _snapshot: &ContextSnapshot,
        context: &RuntimeContext,
    ) -> Result<Value, StepError> {
        let config: ToolStepConfig = serde_json::from_value(step.config.clone())
            .map_err(|e| StepError::ConfigError(format!("tool step config: {}", e)))?;

        let registry = context.require_tools()?;
        let record = registry
            .lookup(&config.tool_id, &context.tool_owner)
            .await
            .map_err(|e| StepError::ProviderError(e.to_string()))?
            .ok_or_else(|| StepError::ToolNotFound(config.tool_id.clone()))?;

        match record.kind {
            ToolKind::Inline => run_sandboxed(context, &record.implementation, input).await,
            ToolKind::Http => {
                let response = context
                    .http()
                    .post(&record.implementation)
                    .timeout(context.sandbox_timeout)
                    .json(input)
                    .send()
                    .await
                    .map_err(|e| StepError::HttpError(e.to_string()))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(StepError::HttpError(format!(
                        "tool '{}' returned status {}",
                        record.id, status
                    )));
                }

                response
                    .json::<Value>()
                    .await
                    .map_err(|e| StepError::HttpError(format!("invalid JSON response: {}", e)))
            }
            ToolKind::Lambda => Err(StepError::UnsupportedToolType(format!(
                "tool '{}' is lambda-typed, which is unsupported in this execution environment",
                record.id
            ))),
        }
    }
}
