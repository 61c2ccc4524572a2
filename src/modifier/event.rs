//! Lifecycle events emitted by the external harness.

use serde::{Deserialize, Serialize};

/// Kind of lifecycle event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Full initialization at the start of a run
    Initialize,
    /// Current index reached a modifier's start
    Start,
    /// A batch is about to be processed
    BatchStart,
    /// A batch finished processing
    BatchEnd,
    /// The run ended
    End,
    /// Terminal cleanup
    Finalize,
}

/// One lifecycle event: a type plus the run's current progress index.
///
/// `current_index` is epoch or step progress, producer's choice; the engine
/// assumes a non-decreasing sequence within a run but does not re-validate
/// ordering. Events are transient and consumed once.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LifecycleEvent {
    /// Kind of event
    pub event_type: EventType,
    /// Epoch or step progress at emission time
    pub current_index: f64,
}

impl LifecycleEvent {
    /// Create an event.
    pub fn new(event_type: EventType, current_index: f64) -> Self {
        Self { event_type, current_index }
    }

    /// A batch-start event at the given index.
    pub fn batch_start(current_index: f64) -> Self {
        Self::new(EventType::BatchStart, current_index)
    }

    /// A batch-end event at the given index.
    pub fn batch_end(current_index: f64) -> Self {
        Self::new(EventType::BatchEnd, current_index)
    }
}
