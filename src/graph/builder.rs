//! Compiled graph representation.
//!
//! [`build_graph`] turns a validated [`WorkflowDefinition`] into a
//! petgraph-backed [`Graph`] with an id → index map, preserving the
//! definition's node order for deterministic frontier emission.

use std::collections::HashMap;

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;

use crate::error::WorkflowError;

use super::schema::{Edge, Step, WorkflowDefinition};

/// Compiled workflow graph. Immutable once built; a run holds one snapshot.
#[derive(Debug)]
pub struct Graph {
    graph: StableDiGraph<Step, Edge>,
    node_index_map: HashMap<String, NodeIndex>,
    /// Step ids in original definition order.
    node_order: Vec<String>,
}

impl Graph {
    pub fn get_step(&self, step_id: &str) -> Result<&Step, WorkflowError> {
        let idx = self
            .node_index_map
            .get(step_id)
            .ok_or_else(|| WorkflowError::StepNotFound(step_id.to_string()))?;
        self.graph
            .node_weight(*idx)
            .ok_or_else(|| WorkflowError::StepNotFound(step_id.to_string()))
    }

    /// Step ids in original definition order.
    pub fn node_order(&self) -> &[String] {
        &self.node_order
    }

    pub fn node_count(&self) -> usize {
        self.node_order.len()
    }

    /// Incoming edges of a step, i.e. the edges whose `target` is the step.
    pub fn incoming_edges(&self, step_id: &str) -> Vec<&Edge> {
        let Some(idx) = self.node_index_map.get(step_id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(*idx, petgraph::Direction::Incoming)
            .map(|e| e.weight())
            .collect()
    }

    /// Ids of the steps the given step depends on (sources of its incoming
    /// edges).
    pub fn dependencies(&self, step_id: &str) -> Vec<String> {
        self.incoming_edges(step_id)
            .iter()
            .map(|e| e.source.clone())
            .collect()
    }

    /// Outgoing edges of a step.
    pub fn outgoing_edges(&self, step_id: &str) -> Vec<&Edge> {
        let Some(idx) = self.node_index_map.get(step_id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(*idx, petgraph::Direction::Outgoing)
            .map(|e| e.weight())
            .collect()
    }

    /// Ids of steps with no outgoing edges, in node order. Their outputs
    /// form the run output.
    pub fn leaf_ids(&self) -> Vec<&str> {
        self.node_order
            .iter()
            .filter(|id| self.outgoing_edges(id).is_empty())
            .map(|id| id.as_str())
            .collect()
    }
}

/// Build a compiled graph from a definition.
///
/// Callers are expected to have run
/// [`validate_definition`](super::validate_definition) first; dangling
/// references still surface as [`WorkflowError::GraphBuildError`] rather
/// than a panic.
pub fn build_graph(definition: &WorkflowDefinition) -> Result<Graph, WorkflowError> {
    let mut graph = StableDiGraph::<Step, Edge>::new();
    let mut node_index_map: HashMap<String, NodeIndex> = HashMap::new();
    let mut node_order = Vec::with_capacity(definition.nodes.len());

    for step in &definition.nodes {
        if node_index_map.contains_key(&step.id) {
            return Err(WorkflowError::GraphBuildError(format!(
                "duplicate step id: {}",
                step.id
            )));
        }
        let idx = graph.add_node(step.clone());
        node_index_map.insert(step.id.clone(), idx);
        node_order.push(step.id.clone());
    }

    for edge in &definition.edges {
        let source_idx = node_index_map.get(&edge.source).ok_or_else(|| {
            WorkflowError::GraphBuildError(format!("edge source not found: {}", edge.source))
        })?;
        let target_idx = node_index_map.get(&edge.target).ok_or_else(|| {
            WorkflowError::GraphBuildError(format!("edge target not found: {}", edge.target))
        })?;
        graph.add_edge(*source_idx, *target_idx, edge.clone());
    }

    Ok(Graph {
        graph,
        node_index_map,
        node_order,
    })
}
