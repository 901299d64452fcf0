use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use crate::error::StepError;
use crate::graph::Step;
use crate::run::context::{ContextSnapshot, RuntimeContext};

/// Trait for step execution. Each step type implements this.
///
/// `execute` must be idempotent given the same step and input so that the
/// orchestrating caller can layer its own retry policy on top.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    async fn execute(
        &self,
        step: &Step,
        input: &Value,
        snapshot: &ContextSnapshot,
        context: &RuntimeContext,
    ) -> Result<Value, StepError>;
}

/// Registry of step executors by step type string.
pub struct StepExecutorRegistry {
    executors: HashMap<String, Box<dyn StepExecutor>>,
}

impl StepExecutorRegistry {
    pub fn new() -> Self {
        let mut registry = StepExecutorRegistry {
            executors: HashMap::new(),
        };
        registry.register("tool", Box::new(super::tool::ToolStepExecutor));
        registry.register("inline", Box::new(super::inline::InlineStepExecutor));
        registry.register("memory", Box::new(super::memory::MemoryStepExecutor));
        registry.register("llm", Box::new(super::llm::LlmStepExecutor));
        registry.register("inference", Box::new(super::inference::InferenceStepExecutor));
        registry
    }

    pub fn register(&mut self, step_type: &str, executor: Box<dyn StepExecutor>) {
        self.executors.insert(step_type.to_string(), executor);
    }

    pub fn get(&self, step_type: &str) -> Option<&dyn StepExecutor> {
        self.executors.get(step_type).map(|e| e.as_ref())
    }

    /// Route a step to the executor matching its type. A type with no
    /// registered executor is a configuration error, failed immediately.
    pub async fn dispatch(
        &self,
        step: &Step,
        input: &Value,
        snapshot: &ContextSnapshot,
        context: &RuntimeContext,
    ) -> Result<Value, StepError> {
        let executor = self
            .get(&step.step_type)
            .ok_or_else(|| StepError::UnsupportedStepType(step.step_type.clone()))?;
        executor.execute(step, input, snapshot, context).await
    }
}

impl Default for StepExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
