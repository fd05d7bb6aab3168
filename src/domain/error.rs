//! Domain Error Types
//!
//! Pure workflow errors that don't depend on infrastructure.

use std::fmt;

use thiserror::Error;

use super::state::InternshipState;

/// Kind of record an internship links to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelatedEntity {
    Student,
    Mentor,
    Campaign,
}

impl fmt::Display for RelatedEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Student => "student",
            Self::Mentor => "mentor",
            Self::Campaign => "campaign",
        })
    }
}

/// Workflow rule violations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// The transition's required source state is not the current state
    #[error("Forbidden transition from {current} to {target}, expected next state is {expected}")]
    ForbiddenTransition {
        current: InternshipState,
        target: InternshipState,
        expected: InternshipState,
    },

    /// No internship with this id
    #[error("Internship not found: {0}")]
    InternshipNotFound(i64),

    /// An explicitly supplied related id did not resolve
    #[error("Related {entity} not found: {id}")]
    RelatedNotFound { entity: RelatedEntity, id: i64 },

    /// The record has no id yet and cannot go through the workflow
    #[error("Internship has not been persisted")]
    Unpersisted,
}

impl DomainError {
    /// Build a forbidden transition error, deriving the legal next state
    pub fn forbidden(current: InternshipState, target: InternshipState) -> Self {
        Self::ForbiddenTransition {
            current,
            target,
            expected: current.next_state(),
        }
    }

    /// Check if this is a client error (caller's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::ForbiddenTransition { .. } | Self::RelatedNotFound { .. } | Self::Unpersisted
        )
    }
}
