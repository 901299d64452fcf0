//! Workflow graph model: definition types, validation, and the compiled
//! petgraph-backed graph used by readiness analysis.

pub mod builder;
pub mod schema;
pub mod validator;

pub use builder::{build_graph, Graph};
pub use schema::{Edge, Step, WorkflowDefinition, KNOWN_STEP_TYPES};
pub use validator::{validate_definition, Diagnostic, DiagnosticLevel, ValidationReport};
