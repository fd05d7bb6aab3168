//! Repository module
//!
//! Persistence port the workflow talks through, with an in-memory adapter
//! and a PostgreSQL adapter.

mod error;
mod memory;
mod postgres;

use async_trait::async_trait;

use crate::domain::{Internship, RelatedEntity};

pub use error::RepositoryError;
pub use memory::InMemoryInternshipRepository;
pub use postgres::PgInternshipRepository;

/// Internship persistence port
///
/// Link operations return `Ok(None)` when either the internship or the
/// related record does not exist; nothing is written in that case.
#[async_trait]
pub trait InternshipRepository: Send + Sync {
    /// Load an internship by id
    async fn find_by_id(&self, id: i64) -> Result<Option<Internship>, RepositoryError>;

    /// Insert or update, returning the stored shape re-read after the write
    async fn save(&self, internship: &Internship) -> Result<Internship, RepositoryError>;

    /// Whether a related record exists, without writing anything
    async fn related_exists(&self, entity: RelatedEntity, id: i64) -> Result<bool, RepositoryError>;

    async fn link_student(
        &self,
        internship_id: i64,
        student_id: i64,
    ) -> Result<Option<Internship>, RepositoryError>;

    async fn link_mentor(
        &self,
        internship_id: i64,
        mentor_id: i64,
    ) -> Result<Option<Internship>, RepositoryError>;

    async fn link_available_campaign(
        &self,
        internship_id: i64,
        campaign_id: i64,
    ) -> Result<Option<Internship>, RepositoryError>;

    async fn link_validated_campaign(
        &self,
        internship_id: i64,
        campaign_id: i64,
    ) -> Result<Option<Internship>, RepositoryError>;
}
