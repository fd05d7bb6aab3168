//! Domain Events
//!
//! Facts emitted by the workflow after a transition has been persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::InternshipState;

/// Internship workflow events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InternshipEvent {
    /// A new internship entered the workflow
    Created {
        internship_id: i64,
        state: InternshipState,
        created_at: DateTime<Utc>,
    },

    /// A transition was committed
    StateChanged {
        internship_id: i64,
        previous: InternshipState,
        next: InternshipState,
        /// Campaign the internship was counted under before the change
        previous_campaign: Option<i64>,
        /// Campaign the internship is counted under after the change
        campaign: Option<i64>,
        changed_at: DateTime<Utc>,
    },
}

impl InternshipEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            InternshipEvent::Created { .. } => "Created",
            InternshipEvent::StateChanged { .. } => "StateChanged",
        }
    }

    /// Get the internship ID this event relates to
    pub fn internship_id(&self) -> i64 {
        match self {
            InternshipEvent::Created { internship_id, .. } => *internship_id,
            InternshipEvent::StateChanged { internship_id, .. } => *internship_id,
        }
    }
}
