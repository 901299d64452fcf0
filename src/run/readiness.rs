//! Readiness analysis: which steps may run next.
//!
//! [`next_executable`] is a pure function of the graph and accumulated run
//! state — identical inputs always yield the identical frontier, which is
//! what makes replay and resumption deterministic.
//!
//! Gating is a strict AND-join: a step runs only when every incoming
//! edge's source has completed *and* every conditioned incoming edge
//! evaluates true. A condition that fails to parse or evaluate blocks the
//! edge (fail closed) instead of admitting it.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::state::CompletedStep;
use crate::expr::{evaluate_condition, EvalContext};
use crate::graph::Graph;

/// A step eligible for dispatch in the current round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutableStep {
    pub step_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

/// Compute the next batch of executable steps, in original node order.
///
/// Steps emitted in one round are mutually independent by construction:
/// none of them can depend on an uncompleted sibling, so callers may
/// dispatch them concurrently.
pub fn next_executable(
    graph: &Graph,
    completed_steps: &[CompletedStep],
    step_outputs: &HashMap<String, Value>,
    workflow_input: &Value,
) -> Vec<ExecutableStep> {
    let completed: HashSet<&str> = completed_steps
        .iter()
        .map(|c| c.step_id.as_str())
        .collect();
    let ctx = EvalContext {
        workflow_input,
        step_outputs,
    };

    let mut frontier = Vec::new();
    for step_id in graph.node_order() {
        if completed.contains(step_id.as_str()) {
            continue;
        }

        let incoming = graph.incoming_edges(step_id);

        // Dependency-ready: every incoming edge's source is completed. A
        // step with no incoming edges qualifies from the first round.
        if !incoming
            .iter()
            .all(|edge| completed.contains(edge.source.as_str()))
        {
            continue;
        }

        // Condition gate across all incoming edges.
        let gated_out = incoming.iter().any(|edge| match &edge.condition {
            None => false,
            Some(condition) => match evaluate_condition(condition, &ctx) {
                Ok(satisfied) => !satisfied,
                Err(err) => {
                    tracing::debug!(
                        edge_id = %edge.id,
                        error = %err,
                        "edge condition failed closed"
                    );
                    true
                }
            },
        });
        if gated_out {
            continue;
        }

        let Ok(step) = graph.get_step(step_id) else {
            continue;
        };
        frontier.push(ExecutableStep {
            step_id: step.id.clone(),
            name: step.name.clone(),
            description: step.description.clone(),
            step_type: step.step_type.clone(),
            input_schema: step.input_schema.clone(),
        });
    }

    frontier
}

/// True iff every step id in the graph is present in the completed set.
pub fn is_complete(graph: &Graph, completed_steps: &[CompletedStep]) -> bool {
    let completed: HashSet<&str> = completed_steps
        .iter()
        .map(|c| c.step_id.as_str())
        .collect();
    graph
        .node_order()
        .iter()
        .all(|id| completed.contains(id.as_str()))
}
