//! Workflow module
//!
//! Internship lifecycle state machine and its wiring to persistence and
//! observers.

mod handler;
mod locks;
mod observer;

use std::sync::Arc;

use chrono::Utc;

use crate::domain::{DomainError, Internship, InternshipEvent, InternshipState};
use crate::error::AppResult;
use crate::repository::InternshipRepository;

pub use handler::{InternshipHandler, LinkPolicy};
pub use locks::TransitionLocks;
pub use observer::{LoggingObserver, TransitionObserver};

/// Entry point controllers use to reach the state machine
///
/// Cheap to clone; clones share the repository, the per-id locks and the
/// observer list.
#[derive(Clone)]
pub struct Workflow {
    repository: Arc<dyn InternshipRepository>,
    locks: TransitionLocks,
    observers: Vec<Arc<dyn TransitionObserver>>,
    link_policy: LinkPolicy,
}

impl Workflow {
    pub fn new(repository: Arc<dyn InternshipRepository>) -> Self {
        Self {
            repository,
            locks: TransitionLocks::new(),
            observers: Vec::new(),
            link_policy: LinkPolicy::default(),
        }
    }

    /// Register an observer for committed events
    pub fn with_observer(mut self, observer: Arc<dyn TransitionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn with_link_policy(mut self, link_policy: LinkPolicy) -> Self {
        self.link_policy = link_policy;
        self
    }

    pub fn link_policy(&self) -> LinkPolicy {
        self.link_policy
    }

    pub fn repository(&self) -> &Arc<dyn InternshipRepository> {
        &self.repository
    }

    /// Load the handler for `internship_id`
    pub async fn handler(&self, internship_id: i64) -> AppResult<InternshipHandler> {
        let internship = self
            .repository
            .find_by_id(internship_id)
            .await?
            .ok_or(DomainError::InternshipNotFound(internship_id))?;

        InternshipHandler::new(
            internship,
            self.repository.clone(),
            self.locks.for_internship(internship_id),
            self.observers.clone(),
            self.link_policy,
        )
    }

    /// Persist a new internship in `WAITING` and announce it
    pub async fn create(&self, mut internship: Internship) -> AppResult<Internship> {
        internship.id = None;
        internship.state = InternshipState::Waiting;

        let saved = self.repository.save(&internship).await?;
        let internship_id = saved.id.ok_or(DomainError::Unpersisted)?;

        tracing::info!(internship_id, "Internship created");

        let event = InternshipEvent::Created {
            internship_id,
            state: saved.state,
            created_at: Utc::now(),
        };
        for observer in &self.observers {
            observer.on_event(&event);
        }

        Ok(saved)
    }
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("observers", &self.observers.len())
            .field("link_policy", &self.link_policy)
            .finish()
    }
}
