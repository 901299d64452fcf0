//! Structural validation of workflow definitions.
//!
//! Validation is pure and runs before a definition is persisted or
//! executed, never during execution. The driver assumes a previously
//! validated definition.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::schema::{WorkflowDefinition, KNOWN_STEP_TYPES};

/// Severity level of a validation diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticLevel {
    Error,
    Warning,
}

/// A single validation finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub code: String,
    pub message: String,
    pub node_id: Option<String>,
    pub edge_id: Option<String>,
}

impl Diagnostic {
    fn error(code: &str, message: String) -> Self {
        Diagnostic {
            level: DiagnosticLevel::Error,
            code: code.to_string(),
            message,
            node_id: None,
            edge_id: None,
        }
    }

    fn for_node(mut self, node_id: &str) -> Self {
        self.node_id = Some(node_id.to_string());
        self
    }

    fn for_edge(mut self, edge_id: &str) -> Self {
        self.edge_id = Some(edge_id.to_string());
        self
    }
}

/// Aggregated result of definition validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    pub fn errors(&self) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.level == DiagnosticLevel::Error)
            .collect()
    }
}

pub const INVALID_NODE_TYPE: &str = "invalid_node_type";
pub const DANGLING_EDGE_REFERENCE: &str = "dangling_edge_reference";
pub const DUPLICATE_NODE_ID: &str = "duplicate_node_id";
pub const MISSING_NODE_FIELD: &str = "missing_node_field";

/// Validate a definition, collecting every finding rather than stopping at
/// the first.
pub fn validate_definition(definition: &WorkflowDefinition) -> ValidationReport {
    let mut diagnostics = Vec::new();
    let mut seen_ids: HashSet<&str> = HashSet::new();

    for step in &definition.nodes {
        if step.id.is_empty() {
            diagnostics.push(Diagnostic::error(
                MISSING_NODE_FIELD,
                "step is missing an id".to_string(),
            ));
        } else if !seen_ids.insert(step.id.as_str()) {
            diagnostics.push(
                Diagnostic::error(
                    DUPLICATE_NODE_ID,
                    format!("duplicate step id: {}", step.id),
                )
                .for_node(&step.id),
            );
        }

        if step.name.is_empty() {
            diagnostics.push(
                Diagnostic::error(
                    MISSING_NODE_FIELD,
                    format!("step '{}' is missing a name", step.id),
                )
                .for_node(&step.id),
            );
        }

        if !KNOWN_STEP_TYPES.contains(&step.step_type.as_str()) {
            diagnostics.push(
                Diagnostic::error(
                    INVALID_NODE_TYPE,
                    format!("step '{}' has unknown type '{}'", step.id, step.step_type),
                )
                .for_node(&step.id),
            );
        }
    }

    let node_ids: HashSet<&str> = definition.nodes.iter().map(|s| s.id.as_str()).collect();
    for edge in &definition.edges {
        for (role, endpoint) in [("source", &edge.source), ("target", &edge.target)] {
            if !node_ids.contains(endpoint.as_str()) {
                diagnostics.push(
                    Diagnostic::error(
                        DANGLING_EDGE_REFERENCE,
                        format!("edge '{}' {} references unknown step '{}'", edge.id, role, endpoint),
                    )
                    .for_edge(&edge.id),
                );
            }
        }
    }

    ValidationReport {
        is_valid: diagnostics
            .iter()
            .all(|d| d.level != DiagnosticLevel::Error),
        diagnostics,
    }
}
