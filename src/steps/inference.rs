//! Inference step executor. The seed is threaded through untouched so a
//! pinned seed reproduces the same output across runs.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::StepError;
use crate::expr::render_string;
use crate::graph::Step;
use crate::providers::InferenceRequest;
use crate::run::context::{ContextSnapshot, RuntimeContext};

use super::executor::StepExecutor;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InferenceStepConfig {
    prompt_expression: String,
    #[serde(default)]
    top_p: Option<f64>,
    #[serde(default)]
    top_k: Option<u32>,
    #[serde(default)]
    seed: Option<u64>,
}

pub struct InferenceStepExecutor;

#[async_trait]
impl StepExecutor for InferenceStepExecutor {
    async fn execute(
        &self,
        step: &Step,
        _input: &Value,
        snapshot: &ContextSnapshot,
        context: &RuntimeContext,
    ) -> Result<Value, StepError> {
        let config: InferenceStepConfig = serde_json::from_value(step.config.clone())
            .map_err(|e| StepError::ConfigError(format!("inference step config: {}", e)))?;

        let prompt = render_string(&config.prompt_expression, &snapshot.eval_ctx())?;

        let provider = context.require_inference()?;
        provider
            .infer(InferenceRequest {
                prompt,
                top_p: config.top_p,
                top_k: config.top_k,
                seed: config.seed,
            })
            .await
            .map_err(|e| StepError::ProviderError(e.to_string()))
    }
}
