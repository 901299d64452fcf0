//! Execution contexts.
//!
//! [`ContextSnapshot`] is the read-only data view a step executes against:
//! the run input plus the latest output of every completed step. Concurrent
//! step executions each receive their own clone, so there is no shared
//! mutable state between them.
//!
//! [`RuntimeContext`] carries the collaborator handles (tool registry,
//! memory store, model providers, sandbox) as explicitly constructed,
//! passed-in dependencies with a process-long lifecycle.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::error::StepError;
use crate::expr::EvalContext;
use crate::providers::{InferenceProvider, LlmProvider, MemoryStore, ToolRegistry};
use crate::sandbox::CodeSandbox;

/// Read-only view of accumulated run state.
#[derive(Debug, Clone, Default)]
pub struct ContextSnapshot {
    pub workflow_input: Value,
    pub step_outputs: HashMap<String, Value>,
}

impl ContextSnapshot {
    pub fn new(workflow_input: Value) -> Self {
        ContextSnapshot {
            workflow_input,
            step_outputs: HashMap::new(),
        }
    }

    pub fn eval_ctx(&self) -> EvalContext<'_> {
        EvalContext {
            workflow_input: &self.workflow_input,
            step_outputs: &self.step_outputs,
        }
    }
}

/// Shared collaborator handles for step execution. Constructed once and
/// passed in; executors fail with a configuration error when a needed
/// collaborator is absent.
#[derive(Clone)]
pub struct RuntimeContext {
    tools: Option<Arc<dyn ToolRegistry>>,
    memory: Option<Arc<dyn MemoryStore>>,
    llm: Option<Arc<dyn LlmProvider>>,
    inference: Option<Arc<dyn InferenceProvider>>,
    sandbox: Option<Arc<dyn CodeSandbox>>,
    http: reqwest::Client,
    /// Hard wall-clock bound on a single sandboxed execution.
    pub sandbox_timeout: Duration,
    /// Owner scope passed to tool registry lookups.
    pub tool_owner: String,
}

impl RuntimeContext {
    pub fn new() -> Self {
        RuntimeContext {
            tools: None,
            memory: None,
            llm: None,
            inference: None,
            sandbox: None,
            http: reqwest::Client::new(),
            sandbox_timeout: Duration::from_secs(10),
            tool_owner: "default".to_string(),
        }
    }

    pub fn with_tools(mut self, tools: Arc<dyn ToolRegistry>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_memory(mut self, memory: Arc<dyn MemoryStore>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_llm(mut self, llm: Arc<dyn LlmProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn with_inference(mut self, inference: Arc<dyn InferenceProvider>) -> Self {
        self.inference = Some(inference);
        self
    }

    pub fn with_sandbox(mut self, sandbox: Arc<dyn CodeSandbox>) -> Self {
        self.sandbox = Some(sandbox);
        self
    }

    pub fn with_sandbox_timeout(mut self, timeout: Duration) -> Self {
        self.sandbox_timeout = timeout;
        self
    }

    pub fn with_tool_owner(mut self, owner: impl Into<String>) -> Self {
        self.tool_owner = owner.into();
        self
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn require_tools(&self) -> Result<&Arc<dyn ToolRegistry>, StepError> {
        self.tools
            .as_ref()
            .ok_or_else(|| StepError::ConfigError("tool registry is not configured".into()))
    }

    pub fn require_memory(&self) -> Result<&Arc<dyn MemoryStore>, StepError> {
        self.memory
            .as_ref()
            .ok_or_else(|| StepError::ConfigError("memory store is not configured".into()))
    }

    pub fn require_llm(&self) -> Result<&Arc<dyn LlmProvider>, StepError> {
        self.llm
            .as_ref()
            .ok_or_else(|| StepError::ConfigError("llm provider is not configured".into()))
    }

    pub fn require_inference(&self) -> Result<&Arc<dyn InferenceProvider>, StepError> {
        self.inference
            .as_ref()
            .ok_or_else(|| StepError::ConfigError("inference provider is not configured".into()))
    }

    pub fn require_sandbox(&self) -> Result<&Arc<dyn CodeSandbox>, StepError> {
        self.sandbox
            .as_ref()
            .ok_or_else(|| StepError::ConfigError("code sandbox is not configured".into()))
    }
}

impl Default for RuntimeContext {
    fn default() -> Self {
        Self::new()
    }
}
