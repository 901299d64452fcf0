//! # flowcore — a workflow execution core
//!
//! `flowcore` executes directed-graph workflows whose nodes are
//! heterogeneous units of work — registered tools, sandboxed inline code,
//! memory-store operations, language-model calls, and seed-pinned
//! inference jobs — connected by edges that may carry boolean conditions
//! evaluated against accumulated run state.
//!
//! The engine is built around four small contracts:
//!
//! - **Validation**: [`validate_definition`] checks a
//!   [`WorkflowDefinition`] before it is persisted or executed.
//! - **Readiness**: [`next_executable`] computes the frontier of steps
//!   whose dependencies are complete and whose edge conditions hold;
//!   [`is_complete`] decides termination. Both are pure functions of their
//!   inputs, which makes replay and resumption deterministic.
//! - **Dispatch**: [`StepExecutorRegistry`] routes each step to the
//!   executor matching its type and normalizes outputs and errors.
//! - **Run state**: [`WorkflowRun`] / [`StepRun`] records move through
//!   `queued → running → {completed, failed}` with timestamps, logs, and
//!   human-readable errors; a run is resumable from its persisted step
//!   history alone.
//!
//! Edge conditions use a narrow expression grammar (comparisons, boolean
//! connectives, property access over `workflowInput` / `stepOutputs`)
//! parsed and interpreted in-process — never dynamic code evaluation. A
//! malformed or failing condition blocks its edge rather than admitting it.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use flowcore::{RunnerStatus, WorkflowDefinition, WorkflowRunner};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let definition: WorkflowDefinition = serde_json::from_str(
//!         r#"{
//!             "nodes": [
//!                 {"id": "draft", "name": "Draft", "type": "llm", "config": {
//!                     "model": "small-1",
//!                     "userPromptExpression": "workflowInput.question"
//!                 }}
//!             ],
//!             "edges": []
//!         }"#,
//!     )
//!     .unwrap();
//!
//!     let handle = WorkflowRunner::builder(definition)
//!         .input(json!({"question": "hello?"}))
//!         .run()
//!         .await
//!         .unwrap();
//!
//!     if let RunnerStatus::Finished(run) = handle.wait().await {
//!         println!("{:?}: {:?}", run.status, run.output);
//!     }
//! }
//! ```
//!
//! Collaborators (tool registry, memory store, LLM and inference
//! providers, the code sandbox, run persistence) are traits wired in via
//! the builder; in-memory defaults live in [`providers`] and [`run`].

pub mod error;
pub mod expr;
pub mod graph;
pub mod providers;
pub mod run;
pub mod runner;
pub mod sandbox;
pub mod steps;

pub use crate::error::{StepError, WorkflowError, WorkflowResult};
pub use crate::expr::{evaluate_condition, EvalContext, ExprError};
pub use crate::graph::{
    build_graph, validate_definition, Diagnostic, DiagnosticLevel, Edge, Graph, Step,
    ValidationReport, WorkflowDefinition,
};
pub use crate::providers::{
    CompletionRequest, InMemoryStore, InferenceProvider, InferenceRequest, LlmProvider,
    MemoryRecord, MemoryStore, MemoryToolRegistry, ProviderError, ToolKind, ToolRecord,
    ToolRegistry,
};
pub use crate::run::{
    create_event_channel, is_complete, next_executable, CompletedStep, ContextSnapshot,
    EngineConfig, EventEmitter, ExecutableStep, MemoryRunStore, RunDriver, RunEvent, RunStatus,
    RunStore, RuntimeContext, StepRun, StepStatus, WorkflowRun,
};
pub use crate::runner::{RunHandle, RunnerStatus, WorkflowRunner, WorkflowRunnerBuilder};
pub use crate::sandbox::{CodeSandbox, SandboxError, SandboxLimits, SandboxRequest};
pub use crate::steps::{StepExecutor, StepExecutorRegistry};
