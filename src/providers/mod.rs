//! Collaborator contracts consumed by the execution core, with in-memory
//! defaults suitable for tests and embedding.
//!
//! - [`ToolRegistry`] — resolves tool ids to stored implementations.
//! - [`MemoryStore`] — the memory subsystem's operation surface.
//! - [`LlmProvider`] — language-model completion.
//! - [`InferenceProvider`] — deterministic inference (seed-pinned).

pub mod inference;
pub mod llm;
pub mod memory;
pub mod tools;

pub use inference::{InferenceProvider, InferenceRequest};
pub use llm::{CompletionRequest, LlmProvider};
pub use memory::{InMemoryStore, MemoryRecord, MemoryStore, MemoryStoreError};
pub use tools::{MemoryToolRegistry, ToolKind, ToolRecord, ToolRegistry};

use thiserror::Error;

/// Errors surfaced by LLM/inference/tool collaborators.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
    #[error("Request failed: {0}")]
    RequestFailed(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
