//! Definition types for workflow graphs.
//!
//! A [`WorkflowDefinition`] is the immutable snapshot a run binds to: an
//! ordered list of [`Step`]s connected by [`Edge`]s whose optional
//! `condition` strings gate traversal. Type-specific step settings live in
//! the opaque `config` value and are deserialized by the matching executor
//! at dispatch time.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Step types understood by the dispatcher.
pub const KNOWN_STEP_TYPES: [&str; 5] = ["tool", "inline", "memory", "llm", "inference"];

/// A single unit of work in a workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Unique within a definition.
    pub id: String,
    pub name: String,
    /// One of [`KNOWN_STEP_TYPES`].
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Structural input contract, opaque to the core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
    /// Structural output contract, opaque to the core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Value>,
    /// Type-specific settings (tool id, code, prompts, ...).
    #[serde(default)]
    pub config: Value,
}

/// A directed edge between two steps, optionally gated by a boolean
/// expression evaluated against the run context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    /// Source step id.
    pub source: String,
    /// Target step id.
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// An immutable workflow definition snapshot. Node and edge order is
/// preserved; readiness emits steps in node order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    #[serde(default = "default_definition_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub nodes: Vec<Step>,
    pub edges: Vec<Edge>,
}

fn default_definition_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl WorkflowDefinition {
    pub fn new(nodes: Vec<Step>, edges: Vec<Edge>) -> Self {
        Self {
            id: default_definition_id(),
            name: String::new(),
            nodes,
            edges,
        }
    }

    pub fn get_step(&self, step_id: &str) -> Option<&Step> {
        self.nodes.iter().find(|s| s.id == step_id)
    }
}
