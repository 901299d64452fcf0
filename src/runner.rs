//! High-level workflow runner and builder.
//!
//! [`WorkflowRunner`] (constructed via [`WorkflowRunner::builder`]) is the
//! main entry point for executing a workflow definition. It validates the
//! definition, compiles the graph, wires the collaborators into a runtime
//! context, and spawns the run driver, returning a [`RunHandle`] for
//! status polling, waiting, and event collection.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{watch, Mutex};

use crate::error::{WorkflowError, WorkflowResult};
use crate::graph::{build_graph, validate_definition, ValidationReport, WorkflowDefinition};
use crate::providers::{InferenceProvider, LlmProvider, MemoryStore, ToolRegistry};
use crate::run::context::RuntimeContext;
use crate::run::driver::{EngineConfig, RunDriver};
use crate::run::events::{create_event_channel, EventEmitter, RunEvent};
use crate::run::state::WorkflowRun;
use crate::run::store::{MemoryRunStore, RunStore};
use crate::sandbox::CodeSandbox;
use crate::steps::StepExecutorRegistry;

/// Terminal-or-not view of a spawned run.
#[derive(Debug, Clone)]
pub enum RunnerStatus {
    Running,
    /// The run reached a terminal status; inspect
    /// [`WorkflowRun::status`](crate::run::RunStatus) for the outcome.
    Finished(WorkflowRun),
    /// Driver infrastructure error (store failure and the like).
    Error(String),
}

/// Handle to a spawned run.
#[derive(Debug)]
pub struct RunHandle {
    run_id: String,
    status_rx: watch::Receiver<RunnerStatus>,
    events: Option<Arc<Mutex<Vec<RunEvent>>>>,
}

impl RunHandle {
    /// Id of the underlying run record; usable with
    /// [`WorkflowRunnerBuilder::resume`] later.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Current status (non-blocking).
    pub fn status(&self) -> RunnerStatus {
        self.status_rx.borrow().clone()
    }

    /// Block until the run reaches a terminal status.
    pub async fn wait(&self) -> RunnerStatus {
        let mut rx = self.status_rx.clone();
        loop {
            let status = rx.borrow().clone();
            match status {
                RunnerStatus::Running => {
                    if rx.changed().await.is_err() {
                        return rx.borrow().clone();
                    }
                }
                _ => return status,
            }
        }
    }

    /// Snapshot of the events collected so far.
    pub async fn events(&self) -> Vec<RunEvent> {
        match &self.events {
            Some(events) => events.lock().await.clone(),
            None => Vec::new(),
        }
    }
}

/// Workflow runner with builder-based configuration.
pub struct WorkflowRunner;

impl WorkflowRunner {
    pub fn builder(definition: WorkflowDefinition) -> WorkflowRunnerBuilder {
        WorkflowRunnerBuilder {
            definition,
            input: Value::Object(serde_json::Map::new()),
            config: EngineConfig::default(),
            store: None,
            tools: None,
            memory: None,
            llm: None,
            inference: None,
            sandbox: None,
            tool_owner: None,
            collect_events: true,
        }
    }
}

/// Builder for configuring and launching a run.
pub struct WorkflowRunnerBuilder {
    definition: WorkflowDefinition,
    input: Value,
    config: EngineConfig,
    store: Option<Arc<dyn RunStore>>,
    tools: Option<Arc<dyn ToolRegistry>>,
    memory: Option<Arc<dyn MemoryStore>>,
    llm: Option<Arc<dyn LlmProvider>>,
    inference: Option<Arc<dyn InferenceProvider>>,
    sandbox: Option<Arc<dyn CodeSandbox>>,
    tool_owner: Option<String>,
    collect_events: bool,
}

impl WorkflowRunnerBuilder {
    /// Set the workflow input.
    pub fn input(mut self, input: Value) -> Self {
        self.input = input;
        self
    }

    /// Set the engine configuration (round/time limits, parallelism,
    /// sandbox timeout).
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the persistence collaborator. Defaults to an in-memory store.
    pub fn store(mut self, store: Arc<dyn RunStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn tools(mut self, tools: Arc<dyn ToolRegistry>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn memory(mut self, memory: Arc<dyn MemoryStore>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn llm(mut self, llm: Arc<dyn LlmProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    pub fn inference(mut self, inference: Arc<dyn InferenceProvider>) -> Self {
        self.inference = Some(inference);
        self
    }

    pub fn sandbox(mut self, sandbox: Arc<dyn CodeSandbox>) -> Self {
        self.sandbox = Some(sandbox);
        self
    }

    /// Owner scope for tool registry lookups.
    pub fn tool_owner(mut self, owner: impl Into<String>) -> Self {
        self.tool_owner = Some(owner.into());
        self
    }

    /// Enable or disable event collection on the handle.
    pub fn collect_events(mut self, collect: bool) -> Self {
        self.collect_events = collect;
        self
    }

    /// Validate the definition without running it.
    pub fn validate(&self) -> ValidationReport {
        validate_definition(&self.definition)
    }

    /// Validate, build, and launch a fresh run.
    pub async fn run(self) -> WorkflowResult<RunHandle> {
        let run = WorkflowRun::new(self.definition.id.clone(), self.input.clone());
        self.spawn(run, false).await
    }

    /// Re-enter an existing run by id, continuing from the persisted
    /// frontier. The configured store must hold the run's history.
    pub async fn resume(self, run_id: &str) -> WorkflowResult<RunHandle> {
        let mut run = WorkflowRun::new(self.definition.id.clone(), Value::Null);
        run.id = run_id.to_string();
        self.spawn(run, true).await
    }

    async fn spawn(self, run: WorkflowRun, resuming: bool) -> WorkflowResult<RunHandle> {
        let report = validate_definition(&self.definition);
        if !report.is_valid {
            return Err(WorkflowError::ValidationFailed(Box::new(report)));
        }

        let graph = Arc::new(build_graph(&self.definition)?);
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryRunStore::new()));

        let mut context = RuntimeContext::new()
            .with_sandbox_timeout(Duration::from_secs(self.config.sandbox_timeout_secs));
        if let Some(tools) = self.tools {
            context = context.with_tools(tools);
        }
        if let Some(memory) = self.memory {
            context = context.with_memory(memory);
        }
        if let Some(llm) = self.llm {
            context = context.with_llm(llm);
        }
        if let Some(inference) = self.inference {
            context = context.with_inference(inference);
        }
        if let Some(sandbox) = self.sandbox {
            context = context.with_sandbox(sandbox);
        }
        if let Some(owner) = self.tool_owner {
            context = context.with_tool_owner(owner);
        }

        let (emitter, events) = if self.collect_events {
            let (tx, mut rx) = create_event_channel();
            let events = Arc::new(Mutex::new(Vec::new()));
            let collector = Arc::clone(&events);
            tokio::spawn(async move {
                while let Some(event) = rx.recv().await {
                    collector.lock().await.push(event);
                }
            });
            (EventEmitter::new(tx), Some(events))
        } else {
            (EventEmitter::disabled(), None)
        };

        let driver = RunDriver::new(
            graph,
            Arc::new(StepExecutorRegistry::new()),
            Arc::new(context),
            store,
            self.config,
            emitter,
        );

        let (status_tx, status_rx) = watch::channel(RunnerStatus::Running);
        let run_id = run.id.clone();
        tokio::spawn(async move {
            let outcome = if resuming {
                driver.resume(&run.id).await
            } else {
                driver.execute(run).await
            };
            let status = match outcome {
                Ok(run) => RunnerStatus::Finished(run),
                Err(e) => RunnerStatus::Error(e.to_string()),
            };
            let _ = status_tx.send(status);
        });

        Ok(RunHandle {
            run_id,
            status_rx,
            events,
        })
    }
}
