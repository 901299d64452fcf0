//! Sandboxed code execution contract.
//!
//! The engine never evaluates user code in-process. Inline and tool code is
//! handed to a [`CodeSandbox`] implementation — a capability-scoped
//! boundary such as a subprocess or WASM runtime supplied by the embedder.
//! The contract: the code exposes exactly one callable entry point that
//! takes the step input and returns (or asynchronously resolves) an
//! output. The engine owns wall-clock enforcement around `execute`.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

/// Sandbox errors
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("Compilation error: {0}")]
    CompilationError(String),
    #[error("Execution error: {0}")]
    ExecutionError(String),
    #[error("Memory limit exceeded")]
    MemoryLimitExceeded,
    #[error("Sandbox unavailable: {0}")]
    Unavailable(String),
}

/// Resource limits for a single execution.
#[derive(Debug, Clone)]
pub struct SandboxLimits {
    pub timeout: Duration,
    pub max_memory_bytes: usize,
}

impl Default for SandboxLimits {
    fn default() -> Self {
        SandboxLimits {
            timeout: Duration::from_secs(10),
            max_memory_bytes: 64 * 1024 * 1024,
        }
    }
}

/// A single execution request.
#[derive(Debug, Clone)]
pub struct SandboxRequest {
    pub code: String,
    pub input: Value,
    pub limits: SandboxLimits,
}

/// Code sandbox execution interface.
///
/// Implementations must isolate executions from host state and from each
/// other; concurrent calls only share the request data they are given.
#[async_trait]
pub trait CodeSandbox: Send + Sync {
    async fn execute(&self, request: SandboxRequest) -> Result<Value, SandboxError>;
}
