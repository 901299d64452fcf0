//! Run progress events.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

/// Events emitted while a run progresses.
#[derive(Clone, Debug, Serialize)]
pub enum RunEvent {
    RunStarted {
        run_id: String,
        timestamp: DateTime<Utc>,
    },
    StepStarted {
        run_id: String,
        step_id: String,
        timestamp: DateTime<Utc>,
    },
    StepCompleted {
        run_id: String,
        step_id: String,
        output: Value,
        timestamp: DateTime<Utc>,
    },
    StepFailed {
        run_id: String,
        step_id: String,
        error: String,
        timestamp: DateTime<Utc>,
    },
    RunCompleted {
        run_id: String,
        output: Value,
        timestamp: DateTime<Utc>,
    },
    RunFailed {
        run_id: String,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

pub type EventSender = mpsc::UnboundedSender<RunEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<RunEvent>;

pub fn create_event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Sender wrapper that is cheap to clone and silently no-ops when no
/// listener is attached.
#[derive(Clone, Default)]
pub struct EventEmitter {
    tx: Option<EventSender>,
}

impl EventEmitter {
    pub fn new(tx: EventSender) -> Self {
        EventEmitter { tx: Some(tx) }
    }

    pub fn disabled() -> Self {
        EventEmitter { tx: None }
    }

    pub fn emit(&self, event: RunEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
