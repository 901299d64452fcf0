//! Tool registry collaborator.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::ProviderError;

/// How a stored tool is implemented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// Inline code executed in the sandbox.
    Inline,
    /// HTTP endpoint invoked with a JSON POST.
    Http,
    /// Hosted function runtime; not executable in this environment.
    Lambda,
}

/// A registered tool record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRecord {
    pub id: String,
    pub name: String,
    pub kind: ToolKind,
    /// Source code for [`ToolKind::Inline`], endpoint URL for
    /// [`ToolKind::Http`].
    pub implementation: String,
}

#[async_trait]
pub trait ToolRegistry: Send + Sync {
    async fn lookup(&self, tool_id: &str, owner: &str)
        -> Result<Option<ToolRecord>, ProviderError>;
}

/// In-memory tool registry keyed by (owner, tool id).
#[derive(Default)]
pub struct MemoryToolRegistry {
    tools: RwLock<HashMap<(String, String), ToolRecord>>,
}

impl MemoryToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, owner: &str, record: ToolRecord) {
        self.tools
            .write()
            .insert((owner.to_string(), record.id.clone()), record);
    }
}

#[async_trait]
impl ToolRegistry for MemoryToolRegistry {
    async fn lookup(
        &self,
        tool_id: &str,
        owner: &str,
    ) -> Result<Option<ToolRecord>, ProviderError> {
        Ok(self
            .tools
            .read()
            .get(&(owner.to_string(), tool_id.to_string()))
            .cloned())
    }
}
