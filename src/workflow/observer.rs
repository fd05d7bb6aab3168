//! Transition observers
//!
//! Components that react to committed workflow events.

use crate::domain::InternshipEvent;

/// Receives every event the workflow emits after persistence succeeded
pub trait TransitionObserver: Send + Sync {
    fn on_event(&self, event: &InternshipEvent);
}

/// Observer that only logs, useful when no cache is wired
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingObserver;

impl TransitionObserver for LoggingObserver {
    fn on_event(&self, event: &InternshipEvent) {
        tracing::debug!(
            event_type = event.event_type(),
            internship_id = event.internship_id(),
            "Workflow event"
        );
    }
}
