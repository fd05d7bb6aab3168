//! In-memory repository
//!
//! Process-local implementation of the persistence port. Backs the
//! integration tests and local runs without a database.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{Campaign, Internship, RelatedEntity};

use super::{InternshipRepository, RepositoryError};

#[derive(Debug, Default)]
struct MemoryState {
    internships: BTreeMap<i64, Internship>,
    students: HashSet<i64>,
    mentors: HashSet<i64>,
    campaigns: HashMap<i64, Campaign>,
    last_id: i64,
    writes: u64,
}

/// Internship repository held entirely in memory
#[derive(Debug, Default)]
pub struct InMemoryInternshipRepository {
    state: RwLock<MemoryState>,
}

impl InMemoryInternshipRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register_student(&self, student_id: i64) {
        self.state.write().await.students.insert(student_id);
    }

    pub async fn register_mentor(&self, mentor_id: i64) {
        self.state.write().await.mentors.insert(mentor_id);
    }

    pub async fn register_campaign(&self, campaign: Campaign) {
        self.state.write().await.campaigns.insert(campaign.id, campaign);
    }

    pub async fn campaign(&self, campaign_id: i64) -> Option<Campaign> {
        self.state.read().await.campaigns.get(&campaign_id).cloned()
    }

    /// Number of successful writes (saves and links) so far
    pub async fn write_count(&self) -> u64 {
        self.state.read().await.writes
    }

    async fn link_with<F>(
        &self,
        internship_id: i64,
        related_exists: impl FnOnce(&MemoryState) -> bool,
        apply: F,
    ) -> Result<Option<Internship>, RepositoryError>
    where
        F: FnOnce(&mut Internship),
    {
        let mut state = self.state.write().await;

        if !related_exists(&*state) {
            return Ok(None);
        }

        let Some(internship) = state.internships.get_mut(&internship_id) else {
            return Ok(None);
        };
        apply(internship);
        let linked = internship.clone();
        state.writes += 1;

        Ok(Some(linked))
    }
}

#[async_trait]
impl InternshipRepository for InMemoryInternshipRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Internship>, RepositoryError> {
        Ok(self.state.read().await.internships.get(&id).cloned())
    }

    async fn save(&self, internship: &Internship) -> Result<Internship, RepositoryError> {
        let mut state = self.state.write().await;

        let id = match internship.id {
            Some(id) => id,
            None => state.last_id + 1,
        };
        state.last_id = state.last_id.max(id);

        let mut stored = internship.clone();
        stored.id = Some(id);
        state.internships.insert(id, stored.clone());
        state.writes += 1;

        Ok(stored)
    }

    async fn related_exists(&self, entity: RelatedEntity, id: i64) -> Result<bool, RepositoryError> {
        let state = self.state.read().await;

        Ok(match entity {
            RelatedEntity::Student => state.students.contains(&id),
            RelatedEntity::Mentor => state.mentors.contains(&id),
            RelatedEntity::Campaign => state.campaigns.contains_key(&id),
        })
    }

    async fn link_student(
        &self,
        internship_id: i64,
        student_id: i64,
    ) -> Result<Option<Internship>, RepositoryError> {
        self.link_with(
            internship_id,
            |state| state.students.contains(&student_id),
            |internship| internship.student = Some(student_id),
        )
        .await
    }

    async fn link_mentor(
        &self,
        internship_id: i64,
        mentor_id: i64,
    ) -> Result<Option<Internship>, RepositoryError> {
        self.link_with(
            internship_id,
            |state| state.mentors.contains(&mentor_id),
            |internship| internship.mentor = Some(mentor_id),
        )
        .await
    }

    async fn link_available_campaign(
        &self,
        internship_id: i64,
        campaign_id: i64,
    ) -> Result<Option<Internship>, RepositoryError> {
        let linked = self
            .link_with(
                internship_id,
                |state| state.campaigns.contains_key(&campaign_id),
                |internship| internship.available_campaign = Some(campaign_id),
            )
            .await?;

        if linked.is_some() {
            let mut state = self.state.write().await;
            if let Some(campaign) = state.campaigns.get_mut(&campaign_id) {
                if !campaign.internships.contains(&internship_id) {
                    campaign.internships.push(internship_id);
                }
            }
        }

        Ok(linked)
    }

    async fn link_validated_campaign(
        &self,
        internship_id: i64,
        campaign_id: i64,
    ) -> Result<Option<Internship>, RepositoryError> {
        self.link_with(
            internship_id,
            |state| state.campaigns.contains_key(&campaign_id),
            |internship| internship.validated_campaign = Some(campaign_id),
        )
        .await
    }
}
