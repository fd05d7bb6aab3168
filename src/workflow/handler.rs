//! Internship Handler
//!
//! The workflow state machine for a single internship. Each public method
//! is one legal transition: it checks the current state, resolves related
//! records, persists, and notifies observers.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::{
    DomainError, Internship, InternshipEvent, InternshipResult, InternshipState, RelatedEntity,
};
use crate::error::{AppError, AppResult};
use crate::repository::InternshipRepository;

use super::TransitionObserver;

/// What to do when a caller-supplied related id does not resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkPolicy {
    /// Reject the transition before anything is written
    #[default]
    Strict,
    /// Log and advance the state without the link
    Lenient,
}

impl FromStr for LinkPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(format!("unknown link policy: {}", other)),
        }
    }
}

impl fmt::Display for LinkPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        })
    }
}

/// A related record a transition wants to point at
#[derive(Debug, Clone, Copy)]
enum Link {
    Student(i64),
    Mentor(i64),
    AvailableCampaign(i64),
    ValidatedCampaign(i64),
}

impl Link {
    fn entity(self) -> RelatedEntity {
        match self {
            Link::Student(_) => RelatedEntity::Student,
            Link::Mentor(_) => RelatedEntity::Mentor,
            Link::AvailableCampaign(_) | Link::ValidatedCampaign(_) => RelatedEntity::Campaign,
        }
    }

    fn id(self) -> i64 {
        match self {
            Link::Student(id)
            | Link::Mentor(id)
            | Link::AvailableCampaign(id)
            | Link::ValidatedCampaign(id) => id,
        }
    }

    /// Copy the linked field from the stored record onto `next`
    fn carry(self, linked: &Internship, next: &mut Internship) {
        match self {
            Link::Student(_) => next.student = linked.student,
            Link::Mentor(_) => next.mentor = linked.mentor,
            Link::AvailableCampaign(_) => next.available_campaign = linked.available_campaign,
            Link::ValidatedCampaign(_) => next.validated_campaign = linked.validated_campaign,
        }
    }
}

// =========================================================================
// InternshipHandler
// =========================================================================

/// State machine wrapper around one persisted internship
pub struct InternshipHandler {
    id: i64,
    internship: Internship,
    repository: Arc<dyn InternshipRepository>,
    lock: Arc<AsyncMutex<()>>,
    observers: Vec<Arc<dyn TransitionObserver>>,
    link_policy: LinkPolicy,
}

impl fmt::Debug for InternshipHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InternshipHandler")
            .field("id", &self.id)
            .field("state", &self.internship.state)
            .field("link_policy", &self.link_policy)
            .finish()
    }
}

impl InternshipHandler {
    pub(super) fn new(
        internship: Internship,
        repository: Arc<dyn InternshipRepository>,
        lock: Arc<AsyncMutex<()>>,
        observers: Vec<Arc<dyn TransitionObserver>>,
        link_policy: LinkPolicy,
    ) -> AppResult<Self> {
        let id = internship.id.ok_or(DomainError::Unpersisted)?;

        Ok(Self {
            id,
            internship,
            repository,
            lock,
            observers,
            link_policy,
        })
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// PUBLISHED → WAITING, clearing the publication date
    pub async fn to_waiting(&mut self) -> AppResult<&mut Self> {
        let guard = self
            .begin(InternshipState::Waiting, Some(InternshipState::Published))
            .await?;

        let mut next = self.internship.clone();
        next.publish_at = None;

        self.commit(next, InternshipState::Waiting, guard).await
    }

    /// WAITING → PUBLISHED, stamping the publication date
    pub async fn to_published(&mut self) -> AppResult<&mut Self> {
        let guard = self
            .begin(InternshipState::Published, Some(InternshipState::Waiting))
            .await?;

        let mut next = self.internship.clone();
        next.publish_at = Some(Utc::now());

        self.commit(next, InternshipState::Published, guard).await
    }

    /// PUBLISHED → ATTRIBUTED_STUDENT, linking the student when given
    pub async fn to_attributed_student(&mut self, student_id: Option<i64>) -> AppResult<&mut Self> {
        let guard = self
            .begin(
                InternshipState::AttributedStudent,
                Some(InternshipState::Published),
            )
            .await?;

        let links = self.resolve_links(student_id.map(Link::Student).into_iter().collect()).await?;

        let mut next = self.internship.clone();
        self.apply_links(links, &mut next).await?;

        self.commit(next, InternshipState::AttributedStudent, guard).await
    }

    /// ATTRIBUTED_STUDENT → AVAILABLE_CAMPAIGN, linking the campaign when
    /// given
    pub async fn to_campaign_available(&mut self, campaign_id: Option<i64>) -> AppResult<&mut Self> {
        let guard = self
            .begin(
                InternshipState::AvailableCampaign,
                Some(InternshipState::AttributedStudent),
            )
            .await?;

        let links = self
            .resolve_links(campaign_id.map(Link::AvailableCampaign).into_iter().collect())
            .await?;

        let mut next = self.internship.clone();
        self.apply_links(links, &mut next).await?;

        self.commit(next, InternshipState::AvailableCampaign, guard).await
    }

    /// AVAILABLE_CAMPAIGN → ATTRIBUTED_MENTOR, linking the mentor and
    /// confirming the available campaign as the validated one. Both ids
    /// are resolved before either link is written.
    pub async fn to_attributed_mentor(&mut self, mentor_id: Option<i64>) -> AppResult<&mut Self> {
        let guard = self
            .begin(
                InternshipState::AttributedMentor,
                Some(InternshipState::AvailableCampaign),
            )
            .await?;

        let wanted = mentor_id
            .map(Link::Mentor)
            .into_iter()
            .chain(self.internship.available_campaign.map(Link::ValidatedCampaign))
            .collect();
        let links = self.resolve_links(wanted).await?;

        let mut next = self.internship.clone();
        self.apply_links(links, &mut next).await?;

        self.commit(next, InternshipState::AttributedMentor, guard).await
    }

    /// ATTRIBUTED_MENTOR → RUNNING. `end_at` is epoch milliseconds and is
    /// only applied when it is a representable instant.
    pub async fn to_running(&mut self, end_at: Option<i64>) -> AppResult<&mut Self> {
        let guard = self
            .begin(InternshipState::Running, Some(InternshipState::AttributedMentor))
            .await?;

        let mut next = self.internship.clone();
        next.start_at = Some(Utc::now());
        if let Some(millis) = end_at {
            match DateTime::from_timestamp_millis(millis) {
                Some(end) => next.end_at = Some(end),
                None => tracing::warn!(internship_id = self.id, millis, "Ignoring unrepresentable end date"),
            }
        }

        self.commit(next, InternshipState::Running, guard).await
    }

    /// RUNNING → VALIDATION
    pub async fn to_validation(&mut self) -> AppResult<&mut Self> {
        let guard = self
            .begin(InternshipState::Validation, Some(InternshipState::Running))
            .await?;

        let next = self.internship.clone();

        self.commit(next, InternshipState::Validation, guard).await
    }

    /// Any state → ARCHIVED. Any recognized result closes the internship
    /// as `VALIDATED`; no result records `UNKNOWN`.
    pub async fn archive(&mut self, result: Option<InternshipResult>) -> AppResult<&mut Self> {
        let guard = self.begin(InternshipState::Archived, None).await?;

        let mut next = self.internship.clone();
        next.result = match result {
            Some(_) => InternshipResult::Validated,
            None => InternshipResult::Unknown,
        };

        self.commit(next, InternshipState::Archived, guard).await
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn state(&self) -> InternshipState {
        self.internship.state
    }

    pub fn internship(&self) -> &Internship {
        &self.internship
    }

    pub fn into_internship(self) -> Internship {
        self.internship
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Take the per-id lock, refresh from storage and run the guard.
    ///
    /// `required` is the only state `target` may be entered from; `None`
    /// accepts any state.
    async fn begin(
        &mut self,
        target: InternshipState,
        required: Option<InternshipState>,
    ) -> AppResult<OwnedMutexGuard<()>> {
        let guard = self.lock.clone().lock_owned().await;

        self.internship = self
            .repository
            .find_by_id(self.id)
            .await?
            .ok_or(DomainError::InternshipNotFound(self.id))?;

        let current = self.internship.state;
        if required.is_some_and(|required| required != current) {
            tracing::debug!(
                internship_id = self.id,
                current = %current,
                target = %target,
                "Transition rejected"
            );
            return Err(DomainError::forbidden(current, target).into());
        }

        Ok(guard)
    }

    /// Check every wanted link before any of them is written. Under the
    /// lenient policy unknown ids are dropped from the returned list.
    async fn resolve_links(&self, wanted: Vec<Link>) -> AppResult<Vec<Link>> {
        let mut resolved = Vec::with_capacity(wanted.len());

        for link in wanted {
            if self.repository.related_exists(link.entity(), link.id()).await? {
                resolved.push(link);
            } else {
                self.unresolved(link)?;
            }
        }

        Ok(resolved)
    }

    /// Write resolved links and carry the stored values onto `next`
    async fn apply_links(&self, links: Vec<Link>, next: &mut Internship) -> AppResult<()> {
        for link in links {
            let linked = match link {
                Link::Student(id) => self.repository.link_student(self.id, id).await?,
                Link::Mentor(id) => self.repository.link_mentor(self.id, id).await?,
                Link::AvailableCampaign(id) => {
                    self.repository.link_available_campaign(self.id, id).await?
                }
                Link::ValidatedCampaign(id) => {
                    self.repository.link_validated_campaign(self.id, id).await?
                }
            };

            // Only a concurrent delete after resolution lands here
            match linked {
                Some(linked) => link.carry(&linked, next),
                None => self.unresolved(link)?,
            }
        }

        Ok(())
    }

    /// Apply the link policy to an id that did not resolve
    fn unresolved(&self, link: Link) -> AppResult<()> {
        match self.link_policy {
            LinkPolicy::Strict => Err(DomainError::RelatedNotFound {
                entity: link.entity(),
                id: link.id(),
            }
            .into()),
            LinkPolicy::Lenient => {
                tracing::warn!(
                    internship_id = self.id,
                    entity = %link.entity(),
                    related_id = link.id(),
                    "Related record not found, advancing without link"
                );
                Ok(())
            }
        }
    }

    /// Persist `next` in `target`, notify observers, then release the lock.
    ///
    /// Observers see events for one internship in commit order.
    async fn commit(
        &mut self,
        mut next: Internship,
        target: InternshipState,
        guard: OwnedMutexGuard<()>,
    ) -> AppResult<&mut Self> {
        let previous = self.internship.state;
        let previous_campaign = self.internship.campaign();

        next.state = target;
        let saved = self.repository.save(&next).await?;
        if saved.id != Some(self.id) {
            return Err(AppError::Internal(format!(
                "repository returned internship {:?} while saving {}",
                saved.id, self.id
            )));
        }
        self.internship = saved;

        tracing::info!(
            internship_id = self.id,
            from = %previous,
            to = %target,
            "Internship transitioned"
        );

        let event = InternshipEvent::StateChanged {
            internship_id: self.id,
            previous,
            next: target,
            previous_campaign,
            campaign: self.internship.campaign(),
            changed_at: Utc::now(),
        };
        for observer in &self.observers {
            observer.on_event(&event);
        }
        drop(guard);

        Ok(self)
    }
}
