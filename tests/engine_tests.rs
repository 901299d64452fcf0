//! End-to-end engine scenarios exercised through the public API.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use flowcore::{
    is_complete, next_executable, build_graph, CodeSandbox, CompletedStep, Edge, EngineConfig,
    MemoryRunStore, MemoryToolRegistry, RunEvent, RunStatus, RunStore, RunnerStatus, SandboxError,
    SandboxRequest, Step, StepStatus, ToolKind, ToolRecord, WorkflowDefinition, WorkflowRunner,
};

struct OkSandbox;

#[async_trait]
impl CodeSandbox for OkSandbox {
    async fn execute(&self, request: SandboxRequest) -> Result<Value, SandboxError> {
        Ok(json!({"ok": true, "input": request.input}))
    }
}

fn inline_step(id: &str) -> Step {
    Step {
        id: id.to_string(),
        name: id.to_uppercase(),
        step_type: "inline".to_string(),
        description: None,
        input_schema: None,
        output_schema: None,
        config: json!({"code": "function run(input) { return input; }"}),
    }
}

fn edge(id: &str, source: &str, target: &str, condition: Option<&str>) -> Edge {
    Edge {
        id: id.to_string(),
        source: source.to_string(),
        target: target.to_string(),
        condition: condition.map(|c| c.to_string()),
    }
}

// Scenario: a single step with no edges is immediately executable, and
// completing it completes the graph.
#[test]
fn single_node_graph() {
    let def = WorkflowDefinition::new(vec![inline_step("a")], vec![]);
    let graph = build_graph(&def).unwrap();

    let frontier = next_executable(&graph, &[], &HashMap::new(), &json!({}));
    assert_eq!(frontier.len(), 1);
    assert_eq!(frontier[0].step_id, "a");
    assert!(!is_complete(&graph, &[]));

    let done = vec![CompletedStep::new("a", json!(null))];
    assert!(is_complete(&graph, &done));
}

// Scenario: a → b without a condition runs a first, then b.
#[test]
fn two_node_chain() {
    let def = WorkflowDefinition::new(
        vec![inline_step("a"), inline_step("b")],
        vec![edge("e1", "a", "b", None)],
    );
    let graph = build_graph(&def).unwrap();

    let frontier = next_executable(&graph, &[], &HashMap::new(), &json!({}));
    assert_eq!(frontier[0].step_id, "a");

    let done = vec![CompletedStep::new("a", json!({"v": 1}))];
    let outs: HashMap<String, Value> = [("a".to_string(), json!({"v": 1}))].into();
    let frontier = next_executable(&graph, &done, &outs, &json!({}));
    assert_eq!(frontier.len(), 1);
    assert_eq!(frontier[0].step_id, "b");
}

// Scenario: a → b gated on `stepOutputs.a.ok === true` with a's output
// {ok: false} — the frontier stays empty and the run never completes.
#[tokio::test]
async fn false_condition_blocks_forever() {
    struct NotOkSandbox;

    #[async_trait]
    impl CodeSandbox for NotOkSandbox {
        async fn execute(&self, _request: SandboxRequest) -> Result<Value, SandboxError> {
            Ok(json!({"ok": false}))
        }
    }

    let def = WorkflowDefinition::new(
        vec![inline_step("a"), inline_step("b")],
        vec![edge("e1", "a", "b", Some("stepOutputs.a.ok === true"))],
    );

    let handle = WorkflowRunner::builder(def)
        .sandbox(Arc::new(NotOkSandbox))
        .run()
        .await
        .unwrap();

    match handle.wait().await {
        RunnerStatus::Finished(run) => {
            assert_eq!(run.status, RunStatus::Failed);
            assert!(run.error.unwrap().contains("No executable steps remain"));
        }
        other => panic!("expected Finished, got {:?}", other),
    }
}

// Scenario: a lambda-typed tool fails with an unsupported error well
// within the timeout window instead of hanging or silently succeeding.
#[tokio::test]
async fn lambda_tool_fails_fast() {
    let tools = MemoryToolRegistry::new();
    tools.register(
        "default",
        ToolRecord {
            id: "legacy-fn".into(),
            name: "Legacy".into(),
            kind: ToolKind::Lambda,
            implementation: "arn:aws:lambda:us-east-1:123:function:legacy".into(),
        },
    );

    let mut step = inline_step("t");
    step.step_type = "tool".into();
    step.config = json!({"toolId": "legacy-fn"});
    let def = WorkflowDefinition::new(vec![step], vec![]);

    let store = Arc::new(MemoryRunStore::new());
    let started = std::time::Instant::now();
    let handle = WorkflowRunner::builder(def)
        .tools(Arc::new(tools))
        .store(store.clone())
        .run()
        .await
        .unwrap();

    match handle.wait().await {
        RunnerStatus::Finished(run) => {
            assert_eq!(run.status, RunStatus::Failed);
            assert!(run.error.unwrap().to_lowercase().contains("unsupported"));
        }
        other => panic!("expected Finished, got {:?}", other),
    }
    assert!(started.elapsed() < Duration::from_secs(10));

    let records = store.step_runs(handle.run_id()).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, StepStatus::Failed);
    assert!(records[0].error.is_some());
    assert!(records[0].finished_at.is_some());
}

// A diamond graph runs to completion, visiting each step exactly once and
// leaving a full audit trail.
#[tokio::test]
async fn diamond_runs_each_step_once() {
    let def = WorkflowDefinition::new(
        vec![
            inline_step("a"),
            inline_step("b"),
            inline_step("c"),
            inline_step("d"),
        ],
        vec![
            edge("e1", "a", "b", None),
            edge("e2", "a", "c", None),
            edge("e3", "b", "d", None),
            edge("e4", "c", "d", None),
        ],
    );

    let store = Arc::new(MemoryRunStore::new());
    let handle = WorkflowRunner::builder(def)
        .sandbox(Arc::new(OkSandbox))
        .store(store.clone())
        .run()
        .await
        .unwrap();

    match handle.wait().await {
        RunnerStatus::Finished(run) => assert_eq!(run.status, RunStatus::Completed),
        other => panic!("expected Finished, got {:?}", other),
    }

    let records = store.step_runs(handle.run_id()).await.unwrap();
    assert_eq!(records.len(), 4);
    for id in ["a", "b", "c", "d"] {
        assert_eq!(
            records.iter().filter(|r| r.step_id == id).count(),
            1,
            "step {} should run exactly once",
            id
        );
    }

    // give the collector task a beat to drain the channel
    tokio::time::sleep(Duration::from_millis(50)).await;
    let events = handle.events().await;
    let completions = events
        .iter()
        .filter(|e| matches!(e, RunEvent::StepCompleted { .. }))
        .count();
    assert_eq!(completions, 4);
}

// Conditional branching: only the branch whose gate holds executes; the
// other target stays out of the frontier, and the run still fails at the
// end because the gated-out step never completes (strict AND, no OR-join).
#[tokio::test]
async fn condition_selects_branch() {
    struct ScoreSandbox;

    #[async_trait]
    impl CodeSandbox for ScoreSandbox {
        async fn execute(&self, request: SandboxRequest) -> Result<Value, SandboxError> {
            if request.code.contains("score") {
                Ok(json!({"score": 80}))
            } else {
                Ok(json!({"ran": true}))
            }
        }
    }

    let mut scorer = inline_step("score");
    scorer.config = json!({"code": "score()"});
    let def = WorkflowDefinition::new(
        vec![scorer, inline_step("high"), inline_step("low")],
        vec![
            edge("e1", "score", "high", Some("stepOutputs.score.score >= 50")),
            edge("e2", "score", "low", Some("stepOutputs.score.score < 50")),
        ],
    );

    let store = Arc::new(MemoryRunStore::new());
    let handle = WorkflowRunner::builder(def)
        .sandbox(Arc::new(ScoreSandbox))
        .store(store.clone())
        .run()
        .await
        .unwrap();
    let status = handle.wait().await;

    let records = store.step_runs(handle.run_id()).await.unwrap();
    let ran: Vec<&str> = records.iter().map(|r| r.step_id.as_str()).collect();
    assert!(ran.contains(&"high"));
    assert!(!ran.contains(&"low"));

    // "low" can never complete, so the run cannot reach completed
    match status {
        RunnerStatus::Finished(run) => assert_eq!(run.status, RunStatus::Failed),
        other => panic!("expected Finished, got {:?}", other),
    }
}

// Run-level resumability: kill one driver mid-flight (simulated by a
// sandbox that fails the second step the first time), then resume from the
// stored history — the first step is not re-executed.
#[tokio::test]
async fn resume_does_not_rerun_completed_steps() {
    use flowcore::{
        EventEmitter, RunDriver, RuntimeContext, StepExecutorRegistry, WorkflowRun,
    };

    struct CountingSandbox {
        calls: parking_lot::Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CodeSandbox for CountingSandbox {
        async fn execute(&self, request: SandboxRequest) -> Result<Value, SandboxError> {
            self.calls.lock().push(request.code.clone());
            Ok(json!({"done": request.code}))
        }
    }

    let mut a = inline_step("a");
    a.config = json!({"code": "a()"});
    let mut b = inline_step("b");
    b.config = json!({"code": "b()"});
    let def = WorkflowDefinition::new(vec![a, b], vec![edge("e1", "a", "b", None)]);

    let graph = Arc::new(build_graph(&def).unwrap());
    let store: Arc<MemoryRunStore> = Arc::new(MemoryRunStore::new());
    let sandbox = Arc::new(CountingSandbox {
        calls: parking_lot::Mutex::new(Vec::new()),
    });
    let context = Arc::new(RuntimeContext::new().with_sandbox(sandbox.clone()));

    // seed the run and its partial history by hand, as if a previous
    // process completed "a" and stopped
    let run = WorkflowRun::new(&def.id, json!({}));
    let run_id = run.id.clone();
    store.insert_run(&run).await.unwrap();
    let mut a_record = flowcore::StepRun::new(&run_id, "a", json!({}));
    a_record.start();
    a_record.complete(json!({"done": "a()"}));
    store.insert_step_run(&a_record).await.unwrap();

    let driver = RunDriver::new(
        graph,
        Arc::new(StepExecutorRegistry::new()),
        context,
        store.clone(),
        EngineConfig::default(),
        EventEmitter::disabled(),
    );
    let resumed = driver.resume(&run_id).await.unwrap();
    assert_eq!(resumed.status, RunStatus::Completed);

    // "a" was never re-executed
    let calls = sandbox.calls.lock();
    assert!(!calls.iter().any(|c| c.contains("a()")));
    assert_eq!(calls.iter().filter(|c| c.contains("b()")).count(), 1);
}

// Events trace the run in order: started, per-step transitions, completed.
#[tokio::test]
async fn events_cover_the_run() {
    let def = WorkflowDefinition::new(
        vec![inline_step("a"), inline_step("b")],
        vec![edge("e1", "a", "b", None)],
    );

    let handle = WorkflowRunner::builder(def)
        .sandbox(Arc::new(OkSandbox))
        .run()
        .await
        .unwrap();
    let _ = handle.wait().await;

    // the collector task drains the channel asynchronously
    tokio::time::sleep(Duration::from_millis(50)).await;
    let events = handle.events().await;

    assert!(matches!(events.first(), Some(RunEvent::RunStarted { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, RunEvent::StepStarted { step_id, .. } if step_id == "a")));
    assert!(events
        .iter()
        .any(|e| matches!(e, RunEvent::StepCompleted { step_id, .. } if step_id == "b")));
    assert!(matches!(events.last(), Some(RunEvent::RunCompleted { .. })));
}

// Engine limits: a sandbox that outlives the configured timeout fails the
// step, and the failure is recorded rather than hanging the run.
#[tokio::test]
async fn sandbox_timeout_fails_step() {
    struct SlowSandbox;

    #[async_trait]
    impl CodeSandbox for SlowSandbox {
        async fn execute(&self, _request: SandboxRequest) -> Result<Value, SandboxError> {
            tokio::time::sleep(Duration::from_secs(120)).await;
            Ok(json!(null))
        }
    }

    let def = WorkflowDefinition::new(vec![inline_step("slow")], vec![]);
    let handle = WorkflowRunner::builder(def)
        .sandbox(Arc::new(SlowSandbox))
        .config(EngineConfig {
            sandbox_timeout_secs: 1,
            ..EngineConfig::default()
        })
        .run()
        .await
        .unwrap();

    let started = std::time::Instant::now();
    match handle.wait().await {
        RunnerStatus::Finished(run) => {
            assert_eq!(run.status, RunStatus::Failed);
            assert!(run.error.unwrap().contains("Timeout"));
        }
        other => panic!("expected Finished, got {:?}", other),
    }
    assert!(started.elapsed() < Duration::from_secs(30));
}
