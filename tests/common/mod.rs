//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use internship_tracker::api::{self, AppState};
use internship_tracker::domain::{Campaign, Internship, InternshipState};
use internship_tracker::repository::{InMemoryInternshipRepository, InternshipRepository};
use internship_tracker::statistics::{Statistics, StatisticsCache};
use internship_tracker::workflow::{LinkPolicy, Workflow};

pub const STUDENT_ID: i64 = 7;
pub const MENTOR_ID: i64 = 5;
pub const CAMPAIGN_ID: i64 = 10;

/// Everything a workflow test needs, wired the way the server wires it
pub struct TestContext {
    pub repository: Arc<InMemoryInternshipRepository>,
    pub cache: Arc<StatisticsCache>,
    pub workflow: Workflow,
}

impl TestContext {
    pub async fn new(link_policy: LinkPolicy) -> Self {
        let repository = Arc::new(InMemoryInternshipRepository::new());
        repository.register_student(STUDENT_ID).await;
        repository.register_mentor(MENTOR_ID).await;
        repository
            .register_campaign(Campaign::new(CAMPAIGN_ID, "Spring placements"))
            .await;

        let cache = Arc::new(StatisticsCache::new());
        cache.init(Statistics::default(), Vec::new());

        let workflow = Workflow::new(repository.clone())
            .with_link_policy(link_policy)
            .with_observer(cache.clone());

        Self {
            repository,
            cache,
            workflow,
        }
    }

    pub async fn strict() -> Self {
        Self::new(LinkPolicy::Strict).await
    }

    pub async fn lenient() -> Self {
        Self::new(LinkPolicy::Lenient).await
    }

    /// Create an internship through the workflow
    pub async fn create(&self, subject: &str) -> i64 {
        let created = self
            .workflow
            .create(sample_internship(subject))
            .await
            .expect("Failed to create internship");
        created.id.expect("Created internship has no id")
    }

    /// Store an internship directly in `state`, bypassing the workflow
    pub async fn seed_in_state(&self, state: InternshipState) -> i64 {
        let mut internship = sample_internship("Seeded");
        internship.state = state;
        self.seed(internship).await
    }

    /// Store `internship` as given, bypassing the workflow
    pub async fn seed(&self, internship: Internship) -> i64 {
        let saved = self
            .repository
            .save(&internship)
            .await
            .expect("Failed to seed internship");
        saved.id.expect("Seeded internship has no id")
    }

    pub async fn load(&self, internship_id: i64) -> Internship {
        self.repository
            .find_by_id(internship_id)
            .await
            .expect("Repository failed")
            .expect("Internship not found")
    }

    pub fn app(&self) -> axum::Router {
        api::build_router(AppState::new(self.workflow.clone(), self.cache.clone()))
    }
}

pub fn sample_internship(subject: &str) -> Internship {
    Internship::new(subject)
        .with_description("Backend development in a small team")
        .with_location("France", "Nantes", "44000", "12 rue de la Paix")
        .with_business(3)
}
