//! Persistence collaborator for run and step records.
//!
//! Durable storage (and definition version history) belongs to the
//! embedder; the core only needs this narrow surface to record progress
//! and to rebuild a run's frontier on resume. [`MemoryRunStore`] is the
//! default used by tests and single-process embedding.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::state::{StepRun, WorkflowRun};
use crate::error::WorkflowError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Run not found: {0}")]
    RunNotFound(String),
}

impl From<StoreError> for WorkflowError {
    fn from(e: StoreError) -> Self {
        WorkflowError::StoreError(e.to_string())
    }
}

#[async_trait]
pub trait RunStore: Send + Sync {
    async fn insert_run(&self, run: &WorkflowRun) -> Result<(), StoreError>;
    async fn update_run(&self, run: &WorkflowRun) -> Result<(), StoreError>;
    async fn get_run(&self, run_id: &str) -> Result<Option<WorkflowRun>, StoreError>;
    /// Append a new step-run record. Records are never deleted.
    async fn insert_step_run(&self, step_run: &StepRun) -> Result<(), StoreError>;
    async fn update_step_run(&self, step_run: &StepRun) -> Result<(), StoreError>;
    /// All step-run records of a run, in insertion order.
    async fn step_runs(&self, run_id: &str) -> Result<Vec<StepRun>, StoreError>;
}

#[derive(Default)]
pub struct MemoryRunStore {
    runs: RwLock<HashMap<String, WorkflowRun>>,
    step_runs: RwLock<HashMap<String, Vec<StepRun>>>,
}

impl MemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn insert_run(&self, run: &WorkflowRun) -> Result<(), StoreError> {
        self.runs.write().insert(run.id.clone(), run.clone());
        Ok(())
    }

    async fn update_run(&self, run: &WorkflowRun) -> Result<(), StoreError> {
        let mut guard = self.runs.write();
        if !guard.contains_key(&run.id) {
            return Err(StoreError::RunNotFound(run.id.clone()));
        }
        guard.insert(run.id.clone(), run.clone());
        Ok(())
    }

    async fn get_run(&self, run_id: &str) -> Result<Option<WorkflowRun>, StoreError> {
        Ok(self.runs.read().get(run_id).cloned())
    }

    async fn insert_step_run(&self, step_run: &StepRun) -> Result<(), StoreError> {
        self.step_runs
            .write()
            .entry(step_run.run_id.clone())
            .or_default()
            .push(step_run.clone());
        Ok(())
    }

    async fn update_step_run(&self, step_run: &StepRun) -> Result<(), StoreError> {
        let mut guard = self.step_runs.write();
        let records = guard
            .get_mut(&step_run.run_id)
            .ok_or_else(|| StoreError::RunNotFound(step_run.run_id.clone()))?;
        match records.iter_mut().find(|r| r.id == step_run.id) {
            Some(existing) => {
                *existing = step_run.clone();
                Ok(())
            }
            None => Err(StoreError::StorageError(format!(
                "step run not found: {}",
                step_run.id
            ))),
        }
    }

    async fn step_runs(&self, run_id: &str) -> Result<Vec<StepRun>, StoreError> {
        Ok(self
            .step_runs
            .read()
            .get(run_id)
            .cloned()
            .unwrap_or_default())
    }
}
