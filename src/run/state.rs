//! Run and step lifecycle records.
//!
//! A [`WorkflowRun`] owns its [`StepRun`]s; step runs are append-only (an
//! audit trail — a re-attempted step gets a fresh record, the old one is
//! kept). Both carry human-readable errors and timestamps; no failure is
//! silently dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Lifecycle of a workflow run. `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

/// Lifecycle of a single step attempt within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

/// A completed step, as consumed by readiness analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedStep {
    pub step_id: String,
    pub output: Value,
}

impl CompletedStep {
    pub fn new(step_id: impl Into<String>, output: Value) -> Self {
        CompletedStep {
            step_id: step_id.into(),
            output,
        }
    }
}

/// Persistent record of one workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: String,
    pub workflow_id: String,
    pub status: RunStatus,
    pub input: Value,
    pub output: Option<Value>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl WorkflowRun {
    pub fn new(workflow_id: impl Into<String>, input: Value) -> Self {
        WorkflowRun {
            id: Uuid::new_v4().to_string(),
            workflow_id: workflow_id.into(),
            status: RunStatus::Queued,
            input,
            output: None,
            error: None,
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    /// queued → running, on first successful dispatch of any step.
    pub fn mark_running(&mut self) {
        if self.status == RunStatus::Queued {
            self.status = RunStatus::Running;
            self.started_at = Some(Utc::now());
        }
    }

    pub fn complete(&mut self, output: Value) {
        self.status = RunStatus::Completed;
        self.output = Some(output);
        self.finished_at = Some(Utc::now());
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.error = Some(error.into());
        self.finished_at = Some(Utc::now());
    }
}

/// Persistent record of one step attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRun {
    pub id: String,
    pub run_id: String,
    pub step_id: String,
    pub status: StepStatus,
    pub input: Value,
    pub output: Option<Value>,
    pub error: Option<String>,
    pub logs: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl StepRun {
    pub fn new(run_id: impl Into<String>, step_id: impl Into<String>, input: Value) -> Self {
        StepRun {
            id: Uuid::new_v4().to_string(),
            run_id: run_id.into(),
            step_id: step_id.into(),
            status: StepStatus::Queued,
            input,
            output: None,
            error: None,
            logs: Vec::new(),
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn start(&mut self) {
        self.status = StepStatus::Running;
        self.started_at = Some(Utc::now());
    }

    pub fn complete(&mut self, output: Value) {
        self.status = StepStatus::Completed;
        self.output = Some(output);
        self.finished_at = Some(Utc::now());
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = StepStatus::Failed;
        self.error = Some(error.into());
        self.finished_at = Some(Utc::now());
    }

    pub fn log(&mut self, line: impl Into<String>) {
        self.logs.push(line.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_run_transitions() {
        let mut run = WorkflowRun::new("wf-1", json!({}));
        assert_eq!(run.status, RunStatus::Queued);
        assert!(!run.status.is_terminal());

        run.mark_running();
        assert_eq!(run.status, RunStatus::Running);
        assert!(run.started_at.is_some());

        run.complete(json!({"done": true}));
        assert!(run.status.is_terminal());
        assert!(run.finished_at.is_some());
        assert!(run.error.is_none());
    }

    #[test]
    fn test_run_failure_records_error() {
        let mut run = WorkflowRun::new("wf-1", json!({}));
        run.mark_running();
        run.fail("step a exploded");
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.error.as_deref(), Some("step a exploded"));
    }

    #[test]
    fn test_mark_running_is_idempotent() {
        let mut run = WorkflowRun::new("wf-1", json!({}));
        run.mark_running();
        let first = run.started_at;
        run.mark_running();
        assert_eq!(run.started_at, first);
    }

    #[test]
    fn test_step_run_lifecycle() {
        let mut step_run = StepRun::new("run-1", "a", json!({"x": 1}));
        assert_eq!(step_run.status, StepStatus::Queued);

        step_run.start();
        step_run.log("dispatching");
        step_run.complete(json!("out"));

        assert_eq!(step_run.status, StepStatus::Completed);
        assert_eq!(step_run.output, Some(json!("out")));
        assert_eq!(step_run.logs.len(), 1);
        assert!(step_run.started_at.is_some());
        assert!(step_run.finished_at.is_some());
    }

    #[test]
    fn test_status_serde() {
        assert_eq!(
            serde_json::to_string(&RunStatus::Completed).unwrap(),
            "\"completed\""
        );
        let s: StepStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(s, StepStatus::Failed);
    }
}
