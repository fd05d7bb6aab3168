//! PostgreSQL repository
//!
//! Production implementation of the persistence port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::{Internship, InternshipResult, InternshipState, RelatedEntity};

use super::{InternshipRepository, RepositoryError};

const SELECT_INTERNSHIP: &str = r#"
    SELECT id, subject, description, country, city, postal_code, address,
           additional, is_abroad, state, result, publish_at, start_at, end_at,
           student_id, mentor_id, available_campaign_id, validated_campaign_id,
           business_id, category_id
    FROM internships
    WHERE id = $1
"#;

/// Internship repository backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgInternshipRepository {
    pool: PgPool,
}

impl PgInternshipRepository {
    /// Create a new PgInternshipRepository with a database pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Map an `internships` row, without its ordered collections
    fn map_row(row: &PgRow) -> Result<Internship, RepositoryError> {
        let state: String = row.try_get("state")?;
        let result: String = row.try_get("result")?;

        Ok(Internship {
            id: Some(row.try_get("id")?),
            subject: row.try_get("subject")?,
            description: row.try_get("description")?,
            country: row.try_get("country")?,
            city: row.try_get("city")?,
            postal_code: row.try_get("postal_code")?,
            address: row.try_get("address")?,
            additional: row.try_get("additional")?,
            is_abroad: row.try_get("is_abroad")?,
            state: state
                .parse::<InternshipState>()
                .map_err(|e| RepositoryError::InvalidRow(e.to_string()))?,
            result: result
                .parse::<InternshipResult>()
                .map_err(|e| RepositoryError::InvalidRow(e.to_string()))?,
            publish_at: row.try_get::<Option<DateTime<Utc>>, _>("publish_at")?,
            start_at: row.try_get::<Option<DateTime<Utc>>, _>("start_at")?,
            end_at: row.try_get::<Option<DateTime<Utc>>, _>("end_at")?,
            student: row.try_get("student_id")?,
            mentor: row.try_get("mentor_id")?,
            available_campaign: row.try_get("available_campaign_id")?,
            validated_campaign: row.try_get("validated_campaign_id")?,
            business: row.try_get("business_id")?,
            category: row.try_get("category_id")?,
            files: Vec::new(),
            propositions: Vec::new(),
        })
    }

    /// Ordered ids from a child table keyed by `internship_id`
    async fn child_ids(&self, table: &'static str, internship_id: i64) -> Result<Vec<i64>, RepositoryError> {
        let ids: Vec<i64> = sqlx::query_scalar(&format!(
            "SELECT id FROM {} WHERE internship_id = $1 ORDER BY id",
            table
        ))
        .bind(internship_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    /// Point `column` at `related_id` if a row exists in `related_table`
    async fn link(
        &self,
        internship_id: i64,
        column: &'static str,
        related_table: &'static str,
        related_id: i64,
    ) -> Result<Option<Internship>, RepositoryError> {
        let rows_affected = sqlx::query(&format!(
            r#"
            UPDATE internships
            SET {column} = $2, updated_at = NOW()
            WHERE id = $1
              AND EXISTS (SELECT 1 FROM {related_table} WHERE id = $2)
            "#
        ))
        .bind(internship_id)
        .bind(related_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows_affected == 0 {
            return Ok(None);
        }

        self.find_by_id(internship_id).await
    }
}

#[async_trait]
impl InternshipRepository for PgInternshipRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Internship>, RepositoryError> {
        let row = sqlx::query(SELECT_INTERNSHIP)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut internship = Self::map_row(&row)?;
        internship.files = self.child_ids("internship_files", id).await?;
        internship.propositions = self.child_ids("propositions", id).await?;

        Ok(Some(internship))
    }

    async fn save(&self, internship: &Internship) -> Result<Internship, RepositoryError> {
        let id: i64 = match internship.id {
            None => {
                sqlx::query_scalar(
                    r#"
                    INSERT INTO internships (
                        subject, description, country, city, postal_code, address,
                        additional, is_abroad, state, result, publish_at, start_at, end_at,
                        student_id, mentor_id, available_campaign_id, validated_campaign_id,
                        business_id, category_id
                    )
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                            $14, $15, $16, $17, $18, $19)
                    RETURNING id
                    "#,
                )
                .bind(&internship.subject)
                .bind(&internship.description)
                .bind(&internship.country)
                .bind(&internship.city)
                .bind(&internship.postal_code)
                .bind(&internship.address)
                .bind(&internship.additional)
                .bind(internship.is_abroad)
                .bind(internship.state.as_str())
                .bind(internship.result.as_str())
                .bind(internship.publish_at)
                .bind(internship.start_at)
                .bind(internship.end_at)
                .bind(internship.student)
                .bind(internship.mentor)
                .bind(internship.available_campaign)
                .bind(internship.validated_campaign)
                .bind(internship.business)
                .bind(internship.category)
                .fetch_one(&self.pool)
                .await?
            }
            Some(id) => {
                let rows_affected = sqlx::query(
                    r#"
                    UPDATE internships
                    SET subject = $2, description = $3, country = $4, city = $5,
                        postal_code = $6, address = $7, additional = $8, is_abroad = $9,
                        state = $10, result = $11, publish_at = $12, start_at = $13,
                        end_at = $14, student_id = $15, mentor_id = $16,
                        available_campaign_id = $17, validated_campaign_id = $18,
                        business_id = $19, category_id = $20, updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .bind(&internship.subject)
                .bind(&internship.description)
                .bind(&internship.country)
                .bind(&internship.city)
                .bind(&internship.postal_code)
                .bind(&internship.address)
                .bind(&internship.additional)
                .bind(internship.is_abroad)
                .bind(internship.state.as_str())
                .bind(internship.result.as_str())
                .bind(internship.publish_at)
                .bind(internship.start_at)
                .bind(internship.end_at)
                .bind(internship.student)
                .bind(internship.mentor)
                .bind(internship.available_campaign)
                .bind(internship.validated_campaign)
                .bind(internship.business)
                .bind(internship.category)
                .execute(&self.pool)
                .await?
                .rows_affected();

                if rows_affected == 0 {
                    return Err(RepositoryError::Missing(id));
                }
                id
            }
        };

        // Re-read so callers hold exactly what was stored
        self.find_by_id(id)
            .await?
            .ok_or(RepositoryError::Missing(id))
    }

    async fn related_exists(&self, entity: RelatedEntity, id: i64) -> Result<bool, RepositoryError> {
        let table = match entity {
            RelatedEntity::Student => "students",
            RelatedEntity::Mentor => "mentors",
            RelatedEntity::Campaign => "campaigns",
        };

        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)",
            table
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn link_student(
        &self,
        internship_id: i64,
        student_id: i64,
    ) -> Result<Option<Internship>, RepositoryError> {
        self.link(internship_id, "student_id", "students", student_id).await
    }

    async fn link_mentor(
        &self,
        internship_id: i64,
        mentor_id: i64,
    ) -> Result<Option<Internship>, RepositoryError> {
        self.link(internship_id, "mentor_id", "mentors", mentor_id).await
    }

    async fn link_available_campaign(
        &self,
        internship_id: i64,
        campaign_id: i64,
    ) -> Result<Option<Internship>, RepositoryError> {
        self.link(internship_id, "available_campaign_id", "campaigns", campaign_id)
            .await
    }

    async fn link_validated_campaign(
        &self,
        internship_id: i64,
        campaign_id: i64,
    ) -> Result<Option<Internship>, RepositoryError> {
        self.link(internship_id, "validated_campaign_id", "campaigns", campaign_id)
            .await
    }
}
