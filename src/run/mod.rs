//! Run-side machinery: readiness analysis, run/step records, the driver
//! loop, persistence, and run events.

pub mod context;
pub mod driver;
pub mod events;
pub mod readiness;
pub mod state;
pub mod store;

pub use context::{ContextSnapshot, RuntimeContext};
pub use driver::{EngineConfig, RunDriver};
pub use events::{create_event_channel, EventEmitter, RunEvent};
pub use readiness::{is_complete, next_executable, ExecutableStep};
pub use state::{CompletedStep, RunStatus, StepRun, StepStatus, WorkflowRun};
pub use store::{MemoryRunStore, RunStore, StoreError};
