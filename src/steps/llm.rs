//! LLM step executor: renders the user prompt expression against the
//! context and issues a completion request to the model collaborator.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::StepError;
use crate::expr::render_string;
use crate::graph::Step;
use crate::providers::CompletionRequest;
use crate::run::context::{ContextSnapshot, RuntimeContext};

use super::executor::StepExecutor;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LlmStepConfig {
    model: String,
    #[serde(default)]
    system_prompt: Option<String>,
    user_prompt_expression: String,
    #[serde(default)]
    temperature: Option<f64>,
    #[serde(default)]
    max_tokens: Option<u32>,
}

pub struct LlmStepExecutor;

#[async_trait]
impl StepExecutor for LlmStepExecutor {
    async fn execute(
        &self,
        step: &Step,
        _input: &Value,
        snapshot: &ContextSnapshot,
        context: &RuntimeContext,
    ) -> Result<Value, StepError> {
        let config: LlmStepConfig = serde_json::from_value(step.config.clone())
            .map_err(|e| StepError::ConfigError(format!("llm step config: {}", e)))?;

        let user_prompt = render_string(&config.user_prompt_expression, &snapshot.eval_ctx())?;

        let provider = context.require_llm()?;
        provider
            .complete(CompletionRequest {
                model: config.model,
                system_prompt: config.system_prompt,
                user_prompt,
                temperature: config.temperature,
                max_tokens: config.max_tokens,
            })
            .await
            .map_err(|e| StepError::ProviderError(e.to_string()))
    }
}
