//! Memory step executor.
//!
//! Dispatches one of the memory collaborator's operations, building call
//! arguments from expressions evaluated against the current context.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::StepError;
use crate::expr::{render_string, render_value};
use crate::graph::Step;
use crate::run::context::{ContextSnapshot, RuntimeContext};

use super::executor::StepExecutor;

const DEFAULT_SEARCH_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MemoryOperation {
    Search,
    Add,
    Update,
    Delete,
    Get,
    GetAll,
    DeleteAll,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MemoryStepConfig {
    operation: MemoryOperation,
    #[serde(default)]
    query_expression: Option<String>,
    #[serde(default)]
    memory_id_expression: Option<String>,
    /// Output value keys mapped to expressions over the context; used to
    /// build the stored value for add/update. Falls back to the raw step
    /// input when absent.
    #[serde(default)]
    input_mapping: Option<HashMap<String, String>>,
    #[serde(default)]
    limit: Option<usize>,
}

pub struct MemoryStepExecutor;

#[async_trait]
impl StepExecutor for MemoryStepExecutor {
    async fn execute(
        &self,
        step: &Step,
        input: &Value,
        snapshot: &ContextSnapshot,
        context: &RuntimeContext,
    ) -> Result<Value, StepError> {
        let config: MemoryStepConfig = serde_json::from_value(step.config.clone())
            .map_err(|e| StepError::ConfigError(format!("memory step config: {}", e)))?;

        let store = context.require_memory()?;
        let ctx = snapshot.eval_ctx();

        match config.operation {
            MemoryOperation::Search => {
                let expr = config.query_expression.as_deref().ok_or_else(|| {
                    StepError::ConfigError("search requires queryExpression".into())
                })?;
                let query = render_string(expr, &ctx)?;
                let limit = config.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
                let records = store
                    .search(&query, limit)
                    .await
                    .map_err(|e| StepError::MemoryError(e.to_string()))?;
                Ok(serde_json::to_value(records)?)
            }
            MemoryOperation::Add => {
                let value = build_value(&config, input, snapshot)?;
                let record = store
                    .add(value)
                    .await
                    .map_err(|e| StepError::MemoryError(e.to_string()))?;
                Ok(serde_json::to_value(record)?)
            }
            MemoryOperation::Update => {
                let id = required_id(&config, snapshot)?;
                let value = build_value(&config, input, snapshot)?;
                let record = store
                    .update(&id, value)
                    .await
                    .map_err(|e| StepError::MemoryError(e.to_string()))?;
                Ok(serde_json::to_value(record)?)
            }
            MemoryOperation::Delete => {
                let id = required_id(&config, snapshot)?;
                store
                    .delete(&id)
                    .await
                    .map_err(|e| StepError::MemoryError(e.to_string()))?;
                Ok(json!({"deleted": true, "id": id}))
            }
            MemoryOperation::Get => {
                let id = required_id(&config, snapshot)?;
                let record = store
                    .get(&id)
                    .await
                    .map_err(|e| StepError::MemoryError(e.to_string()))?;
                Ok(serde_json::to_value(record)?)
            }
            MemoryOperation::GetAll => {
                let records = store
                    .get_all()
                    .await
                    .map_err(|e| StepError::MemoryError(e.to_string()))?;
                Ok(serde_json::to_value(records)?)
            }
            MemoryOperation::DeleteAll => {
                store
                    .delete_all()
                    .await
                    .map_err(|e| StepError::MemoryError(e.to_string()))?;
                Ok(json!({"deleted": true}))
            }
        }
    }
}

fn required_id(config: &MemoryStepConfig, snapshot: &ContextSnapshot) -> Result<String, StepError> {
    let expr = config
        .memory_id_expression
        .as_deref()
        .ok_or_else(|| StepError::ConfigError("operation requires memoryIdExpression".into()))?;
    let id = render_string(expr, &snapshot.eval_ctx())?;
    if id.is_empty() {
        return Err(StepError::ExpressionError(
            "memoryIdExpression evaluated to an empty id".into(),
        ));
    }
    Ok(id)
}

fn build_value(
    config: &MemoryStepConfig,
    input: &Value,
    snapshot: &ContextSnapshot,
) -> Result<Value, StepError> {
    match &config.input_mapping {
        Some(mapping) => {
            let ctx = snapshot.eval_ctx();
            let mut object = Map::new();
            for (key, expr) in mapping {
                object.insert(key.clone(), render_value(expr, &ctx)?);
            }
            Ok(Value::Object(object))
        }
        None => Ok(input.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{InMemoryStore, MemoryStore};
    use std::sync::Arc;

    fn memory_step(config: Value) -> Step {
        Step {
            id: "m".into(),
            name: "Memory".into(),
            step_type: "memory".into(),
            description: None,
            input_schema: None,
            output_schema: None,
            config,
        }
    }

    fn context_with(store: Arc<InMemoryStore>) -> RuntimeContext {
        RuntimeContext::new().with_memory(store)
    }

    #[tokio::test]
    async fn test_add_from_input() {
        let store = Arc::new(InMemoryStore::new());
        let context = context_with(store.clone());
        let snapshot = ContextSnapshot::new(json!({}));
        let step = memory_step(json!({"operation": "add"}));

        let out = MemoryStepExecutor
            .execute(&step, &json!({"note": "hi"}), &snapshot, &context)
            .await
            .unwrap();
        assert_eq!(out["value"], json!({"note": "hi"}));
        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_add_with_input_mapping() {
        let store = Arc::new(InMemoryStore::new());
        let context = context_with(store.clone());
        let mut snapshot = ContextSnapshot::new(json!({"topic": "rust"}));
        snapshot
            .step_outputs
            .insert("prev".into(), json!({"summary": "ownership"}));

        let step = memory_step(json!({
            "operation": "add",
            "inputMapping": {
                "topic": "workflowInput.topic",
                "summary": "stepOutputs.prev.summary"
            }
        }));

        let out = MemoryStepExecutor
            .execute(&step, &json!({}), &snapshot, &context)
            .await
            .unwrap();
        assert_eq!(out["value"], json!({"topic": "rust", "summary": "ownership"}));
    }

    #[tokio::test]
    async fn test_search_routes_query_expression() {
        let store = Arc::new(InMemoryStore::new());
        store.add(json!("rust ownership notes")).await.unwrap();
        store.add(json!("python gc notes")).await.unwrap();
        let context = context_with(store);
        let snapshot = ContextSnapshot::new(json!({"q": "rust"}));

        let step = memory_step(json!({
            "operation": "search",
            "queryExpression": "workflowInput.q"
        }));
        let out = MemoryStepExecutor
            .execute(&step, &json!({}), &snapshot, &context)
            .await
            .unwrap();
        assert_eq!(out.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_update_delete_by_id_expression() {
        let store = Arc::new(InMemoryStore::new());
        let added = store.add(json!("v1")).await.unwrap();
        let context = context_with(store.clone());
        let mut snapshot = ContextSnapshot::new(json!({}));
        snapshot
            .step_outputs
            .insert("add".into(), json!({"id": added.id}));

        let get = memory_step(json!({
            "operation": "get",
            "memoryIdExpression": "stepOutputs.add.id"
        }));
        let out = MemoryStepExecutor
            .execute(&get, &json!({}), &snapshot, &context)
            .await
            .unwrap();
        assert_eq!(out["value"], json!("v1"));

        let update = memory_step(json!({
            "operation": "update",
            "memoryIdExpression": "stepOutputs.add.id"
        }));
        MemoryStepExecutor
            .execute(&update, &json!("v2"), &snapshot, &context)
            .await
            .unwrap();
        assert_eq!(store.get(&added.id).await.unwrap().unwrap().value, json!("v2"));

        let delete = memory_step(json!({
            "operation": "delete",
            "memoryIdExpression": "stepOutputs.add.id"
        }));
        let out = MemoryStepExecutor
            .execute(&delete, &json!({}), &snapshot, &context)
            .await
            .unwrap();
        assert_eq!(out["deleted"], json!(true));
        assert!(store.get(&added.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_all() {
        let store = Arc::new(InMemoryStore::new());
        store.add(json!(1)).await.unwrap();
        store.add(json!(2)).await.unwrap();
        let context = context_with(store.clone());
        let snapshot = ContextSnapshot::new(json!({}));

        let step = memory_step(json!({"operation": "deleteAll"}));
        MemoryStepExecutor
            .execute(&step, &json!({}), &snapshot, &context)
            .await
            .unwrap();
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_without_query_expression() {
        let context = context_with(Arc::new(InMemoryStore::new()));
        let snapshot = ContextSnapshot::new(json!({}));
        let step = memory_step(json!({"operation": "search"}));
        let err = MemoryStepExecutor
            .execute(&step, &json!({}), &snapshot, &context)
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::ConfigError(_)));
    }

    #[tokio::test]
    async fn test_unknown_operation_rejected() {
        let context = context_with(Arc::new(InMemoryStore::new()));
        let snapshot = ContextSnapshot::new(json!({}));
        let step = memory_step(json!({"operation": "compact"}));
        let err = MemoryStepExecutor
            .execute(&step, &json!({}), &snapshot, &context)
            .await
            .unwrap_err();
        assert!(matches!(err, StepError::ConfigError(_)));
    }
}
