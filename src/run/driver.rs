//! The run driver: drives a workflow run round by round.
//!
//! Each iteration takes the latest completed/step-output snapshot, asks the
//! readiness analyzer for the frontier, dispatches it (concurrently when
//! enabled), records every step transition through the store, and rechecks
//! completion. Failures stay local to their step until the graph offers no
//! viable path forward, at which point the run fails with the triggering
//! step's error.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::{StepError, WorkflowError, WorkflowResult};
use crate::graph::Graph;
use crate::steps::StepExecutorRegistry;

use super::context::{ContextSnapshot, RuntimeContext};
use super::events::{EventEmitter, RunEvent};
use super::readiness::{is_complete, next_executable, ExecutableStep};
use super::state::{CompletedStep, RunStatus, StepRun, WorkflowRun};
use super::store::RunStore;

/// Configuration for the run driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
    #[serde(default = "default_max_execution_time_secs")]
    pub max_execution_time_secs: u64,
    #[serde(default = "default_parallel_enabled")]
    pub parallel_enabled: bool,
    /// 0 means unbounded.
    #[serde(default)]
    pub max_concurrency: usize,
    #[serde(default = "default_sandbox_timeout_secs")]
    pub sandbox_timeout_secs: u64,
}

fn default_max_rounds() -> u32 {
    500
}

fn default_max_execution_time_secs() -> u64 {
    600
}

fn default_parallel_enabled() -> bool {
    true
}

fn default_sandbox_timeout_secs() -> u64 {
    10
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_rounds: default_max_rounds(),
            max_execution_time_secs: default_max_execution_time_secs(),
            parallel_enabled: default_parallel_enabled(),
            max_concurrency: 0,
            sandbox_timeout_secs: default_sandbox_timeout_secs(),
        }
    }
}

/// Drives runs of one compiled graph.
pub struct RunDriver {
    graph: Arc<Graph>,
    registry: Arc<StepExecutorRegistry>,
    context: Arc<RuntimeContext>,
    store: Arc<dyn RunStore>,
    config: EngineConfig,
    emitter: EventEmitter,
}

impl RunDriver {
    pub fn new(
        graph: Arc<Graph>,
        registry: Arc<StepExecutorRegistry>,
        context: Arc<RuntimeContext>,
        store: Arc<dyn RunStore>,
        config: EngineConfig,
        emitter: EventEmitter,
    ) -> Self {
        RunDriver {
            graph,
            registry,
            context,
            store,
            config,
            emitter,
        }
    }

    /// Persist and drive a fresh run to a terminal status.
    pub async fn execute(&self, run: WorkflowRun) -> WorkflowResult<WorkflowRun> {
        self.store.insert_run(&run).await?;
        self.drive(run, Vec::new(), HashMap::new()).await
    }

    /// Re-enter a run by id: the frontier is reconstructed from persisted
    /// step history, so completed work is never re-executed. Previously
    /// failed steps become eligible again — resuming is the caller's
    /// retry decision.
    pub async fn resume(&self, run_id: &str) -> WorkflowResult<WorkflowRun> {
        let run = self
            .store
            .get_run(run_id)
            .await?
            .ok_or_else(|| WorkflowError::RunNotFound(run_id.to_string()))?;
        if run.status.is_terminal() {
            return Err(WorkflowError::RunAlreadyTerminal(run_id.to_string()));
        }

        let history = self.store.step_runs(run_id).await?;
        let mut outputs: HashMap<String, Value> = HashMap::new();
        let mut completed_order: Vec<String> = Vec::new();
        for record in &history {
            if record.status == super::state::StepStatus::Completed {
                if !outputs.contains_key(&record.step_id) {
                    completed_order.push(record.step_id.clone());
                }
                outputs.insert(
                    record.step_id.clone(),
                    record.output.clone().unwrap_or(Value::Null),
                );
            }
        }
        let completed: Vec<CompletedStep> = completed_order
            .into_iter()
            .map(|step_id| {
                let output = outputs.get(&step_id).cloned().unwrap_or(Value::Null);
                CompletedStep::new(step_id, output)
            })
            .collect();

        self.drive(run, completed, outputs).await
    }

    async fn drive(
        &self,
        mut run: WorkflowRun,
        mut completed: Vec<CompletedStep>,
        mut step_outputs: HashMap<String, Value>,
    ) -> WorkflowResult<WorkflowRun> {
        let run_id = run.id.clone();
        let started = Instant::now();
        let mut rounds = 0u32;
        // step id → error message, in failure order; the first entry is the
        // run error if the graph stalls
        let mut failures: Vec<(String, String)> = Vec::new();

        self.emitter.emit(RunEvent::RunStarted {
            run_id: run_id.clone(),
            timestamp: Utc::now(),
        });

        loop {
            if is_complete(&self.graph, &completed) {
                let output = self.collect_run_output(&step_outputs);
                run.complete(output.clone());
                self.store.update_run(&run).await?;
                self.emitter.emit(RunEvent::RunCompleted {
                    run_id: run_id.clone(),
                    output,
                    timestamp: Utc::now(),
                });
                tracing::info!(run_id = %run_id, rounds, "run completed");
                return Ok(run);
            }

            rounds += 1;
            if rounds > self.config.max_rounds {
                return self
                    .fail_run(
                        run,
                        WorkflowError::MaxRoundsExceeded(self.config.max_rounds).to_string(),
                    )
                    .await;
            }
            if started.elapsed().as_secs() > self.config.max_execution_time_secs {
                return self
                    .fail_run(run, WorkflowError::ExecutionTimeout.to_string())
                    .await;
            }

            let frontier: Vec<ExecutableStep> = next_executable(
                &self.graph,
                &completed,
                &step_outputs,
                &run.input,
            )
            .into_iter()
            .filter(|s| !failures.iter().any(|(id, _)| id == &s.step_id))
            .collect();

            if frontier.is_empty() {
                let error = failures
                    .first()
                    .map(|(step_id, error)| format!("step '{}' failed: {}", step_id, error))
                    .unwrap_or_else(|| WorkflowError::NoProgress.to_string());
                return self.fail_run(run, error).await;
            }

            if run.status == RunStatus::Queued {
                run.mark_running();
                self.store.update_run(&run).await?;
            }

            tracing::debug!(
                run_id = %run_id,
                round = rounds,
                frontier = ?frontier.iter().map(|s| s.step_id.as_str()).collect::<Vec<_>>(),
                "dispatching round"
            );

            let snapshot = ContextSnapshot {
                workflow_input: run.input.clone(),
                step_outputs: step_outputs.clone(),
            };
            let results = self.dispatch_round(&run_id, &frontier, snapshot).await;

            // apply in frontier order so the triggering failure is
            // deterministic
            for step in &frontier {
                let Some(result) = results.get(&step.step_id) else {
                    continue;
                };
                match result {
                    Ok(output) => {
                        step_outputs.insert(step.step_id.clone(), output.clone());
                        completed.push(CompletedStep::new(step.step_id.clone(), output.clone()));
                    }
                    Err(error) => {
                        failures.push((step.step_id.clone(), error.clone()));
                    }
                }
            }
        }
    }

    async fn fail_run(&self, mut run: WorkflowRun, error: String) -> WorkflowResult<WorkflowRun> {
        run.fail(error.clone());
        self.store.update_run(&run).await?;
        self.emitter.emit(RunEvent::RunFailed {
            run_id: run.id.clone(),
            error: error.clone(),
            timestamp: Utc::now(),
        });
        tracing::warn!(run_id = %run.id, error = %error, "run failed");
        Ok(run)
    }

    /// Dispatch one frontier. Steps in a round are mutually independent by
    /// construction, so they may run concurrently; each task gets its own
    /// snapshot clone and writes only its own step-run record.
    async fn dispatch_round(
        &self,
        run_id: &str,
        frontier: &[ExecutableStep],
        snapshot: ContextSnapshot,
    ) -> HashMap<String, Result<Value, String>> {
        let mut results = HashMap::new();

        if self.config.parallel_enabled && frontier.len() > 1 {
            let semaphore = (self.config.max_concurrency > 0)
                .then(|| Arc::new(Semaphore::new(self.config.max_concurrency)));
            let mut join_set = JoinSet::new();
            for step in frontier {
                let graph = Arc::clone(&self.graph);
                let registry = Arc::clone(&self.registry);
                let context = Arc::clone(&self.context);
                let store = Arc::clone(&self.store);
                let emitter = self.emitter.clone();
                let run_id = run_id.to_string();
                let step_id = step.step_id.clone();
                let snapshot = snapshot.clone();
                let semaphore = semaphore.clone();
                join_set.spawn(async move {
                    let _permit = match &semaphore {
                        Some(s) => Some(s.acquire().await.expect("semaphore never closed")),
                        None => None,
                    };
                    let result = dispatch_step(
                        &graph, &registry, &context, &store, &emitter, &run_id, &step_id,
                        &snapshot,
                    )
                    .await;
                    (step_id, result)
                });
            }
            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok((step_id, result)) => {
                        results.insert(step_id, result.map_err(|e| e.to_string()));
                    }
                    Err(join_error) => {
                        tracing::error!(error = %join_error, "step task panicked");
                    }
                }
            }
        } else {
            for step in frontier {
                let result = dispatch_step(
                    &self.graph,
                    &self.registry,
                    &self.context,
                    &self.store,
                    &self.emitter,
                    run_id,
                    &step.step_id,
                    &snapshot,
                )
                .await;
                results.insert(step.step_id.clone(), result.map_err(|e| e.to_string()));
            }
        }

        results
    }

    fn collect_run_output(&self, step_outputs: &HashMap<String, Value>) -> Value {
        let mut object = Map::new();
        for leaf_id in self.graph.leaf_ids() {
            if let Some(output) = step_outputs.get(leaf_id) {
                object.insert(leaf_id.to_string(), output.clone());
            }
        }
        Value::Object(object)
    }
}

/// Execute a single step, recording the queued → running → terminal
/// transitions on its step-run record.
#[allow(clippy::too_many_arguments)]
async fn dispatch_step(
    graph: &Graph,
    registry: &StepExecutorRegistry,
    context: &RuntimeContext,
    store: &Arc<dyn RunStore>,
    emitter: &EventEmitter,
    run_id: &str,
    step_id: &str,
    snapshot: &ContextSnapshot,
) -> Result<Value, StepError> {
    let step = graph
        .get_step(step_id)
        .map_err(|e| StepError::ExecutionError(e.to_string()))?
        .clone();
    let input = snapshot.workflow_input.clone();

    let mut step_run = StepRun::new(run_id, step_id, input.clone());
    step_run.log(format!("queued step '{}' ({})", step.name, step.step_type));
    store
        .insert_step_run(&step_run)
        .await
        .map_err(|e| StepError::ExecutionError(e.to_string()))?;

    step_run.start();
    step_run.log("executor dispatched".to_string());
    store
        .update_step_run(&step_run)
        .await
        .map_err(|e| StepError::ExecutionError(e.to_string()))?;
    emitter.emit(RunEvent::StepStarted {
        run_id: run_id.to_string(),
        step_id: step_id.to_string(),
        timestamp: Utc::now(),
    });

    let result = registry.dispatch(&step, &input, snapshot, context).await;

    match &result {
        Ok(output) => {
            step_run.log("completed".to_string());
            step_run.complete(output.clone());
            emitter.emit(RunEvent::StepCompleted {
                run_id: run_id.to_string(),
                step_id: step_id.to_string(),
                output: output.clone(),
                timestamp: Utc::now(),
            });
            tracing::debug!(run_id = %run_id, step_id = %step_id, "step completed");
        }
        Err(error) => {
            step_run.log(format!("failed: {}", error));
            step_run.fail(error.to_string());
            emitter.emit(RunEvent::StepFailed {
                run_id: run_id.to_string(),
                step_id: step_id.to_string(),
                error: error.to_string(),
                timestamp: Utc::now(),
            });
            tracing::warn!(run_id = %run_id, step_id = %step_id, error = %error, "step failed");
        }
    }

    store
        .update_step_run(&step_run)
        .await
        .map_err(|e| StepError::ExecutionError(e.to_string()))?;

    result
}
