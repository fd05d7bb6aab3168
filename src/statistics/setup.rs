//! Statistics rebuild
//!
//! Recomputes every counter from the database and reseeds the cache.
//! Runs once at startup, before the server accepts requests.

use std::collections::BTreeMap;

use sqlx::PgPool;

use crate::domain::InternshipState;

use super::snapshot::{CampaignStatistics, InternshipCounters, Statistics};
use super::StatisticsCache;

/// Fold per-state internship counts into global bucket counters
pub fn fold_state_counts(
    counts: impl IntoIterator<Item = (InternshipState, u64)>,
) -> InternshipCounters {
    let mut counters = InternshipCounters::default();
    for (state, count) in counts {
        *counters.bucket_mut(state.bucket()) += count;
        counters.total += count;
    }
    counters
}

/// Fold per-state counts of one campaign's internships into its snapshot
pub fn fold_campaign_counts(
    campaign: i64,
    counts: impl IntoIterator<Item = (InternshipState, u64)>,
) -> CampaignStatistics {
    let mut snapshot = CampaignStatistics::empty(campaign);
    for (state, count) in counts {
        if let Some(counter) = state.bucket().campaign_counter() {
            *snapshot.internships.bucket_mut(counter) += count;
        }
        snapshot.internships.total += count;
    }
    snapshot
}

/// Reload counters from PostgreSQL and reseed `cache`
pub async fn rebuild(pool: &PgPool, cache: &StatisticsCache) -> Result<Statistics, SetupError> {
    let by_state: Vec<(String, i64)> =
        sqlx::query_as("SELECT state, COUNT(*) FROM internships GROUP BY state")
            .fetch_all(pool)
            .await?;

    let mentors: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM mentors")
        .fetch_one(pool)
        .await?;
    let students: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
        .fetch_one(pool)
        .await?;
    let propositions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM propositions")
        .fetch_one(pool)
        .await?;

    let global = Statistics {
        internships: fold_state_counts(parse_counts(by_state)),
        mentors: to_count(mentors),
        students: to_count(students),
        propositions: to_count(propositions),
    };

    let campaigns = load_campaigns(pool).await?;

    cache.reset();
    cache.init(global, campaigns.clone());

    tracing::info!(
        internships = global.internships.total,
        campaigns = campaigns.len(),
        "Statistics rebuilt from database"
    );

    Ok(global)
}

/// Per-campaign snapshots, one for every campaign row
async fn load_campaigns(pool: &PgPool) -> Result<Vec<CampaignStatistics>, SetupError> {
    let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM campaigns ORDER BY id")
        .fetch_all(pool)
        .await?;

    let internship_rows: Vec<(i64, String, i64)> = sqlx::query_as(
        r#"
        SELECT COALESCE(validated_campaign_id, available_campaign_id) AS campaign_id,
               state,
               COUNT(*)
        FROM internships
        WHERE COALESCE(validated_campaign_id, available_campaign_id) IS NOT NULL
        GROUP BY 1, 2
        "#,
    )
    .fetch_all(pool)
    .await?;

    let student_rows: Vec<(i64, i64)> = sqlx::query_as(
        r#"
        SELECT available_campaign_id, COUNT(DISTINCT student_id)
        FROM internships
        WHERE available_campaign_id IS NOT NULL AND student_id IS NOT NULL
        GROUP BY available_campaign_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mentor_rows: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT campaign_id, COUNT(*) FROM campaign_mentors GROUP BY campaign_id",
    )
    .fetch_all(pool)
    .await?;

    let proposition_rows: Vec<(i64, i64)> = sqlx::query_as(
        r#"
        SELECT campaign_id, COUNT(*)
        FROM propositions
        WHERE campaign_id IS NOT NULL
        GROUP BY campaign_id
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut per_campaign: BTreeMap<i64, Vec<(String, i64)>> =
        ids.into_iter().map(|id| (id, Vec::new())).collect();
    for (campaign, state, count) in internship_rows {
        per_campaign.entry(campaign).or_default().push((state, count));
    }

    let mut snapshots: BTreeMap<i64, CampaignStatistics> = per_campaign
        .into_iter()
        .map(|(id, rows)| (id, fold_campaign_counts(id, parse_counts(rows))))
        .collect();

    for (campaign, count) in student_rows {
        if let Some(snapshot) = snapshots.get_mut(&campaign) {
            snapshot.students = to_count(count);
        }
    }
    for (campaign, count) in mentor_rows {
        if let Some(snapshot) = snapshots.get_mut(&campaign) {
            snapshot.mentors = to_count(count);
        }
    }
    for (campaign, count) in proposition_rows {
        if let Some(snapshot) = snapshots.get_mut(&campaign) {
            snapshot.propositions = to_count(count);
        }
    }

    Ok(snapshots.into_values().collect())
}

/// Parse textual states, skipping rows the enum does not know
fn parse_counts(rows: Vec<(String, i64)>) -> Vec<(InternshipState, u64)> {
    rows.into_iter()
        .filter_map(|(state, count)| match state.parse::<InternshipState>() {
            Ok(state) => Some((state, to_count(count))),
            Err(e) => {
                tracing::warn!(state = %state, count, "Skipping unknown state during rebuild: {}", e);
                None
            }
        })
        .collect()
}

fn to_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Rebuild errors
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_state_counts() {
        let counters = fold_state_counts(vec![
            (InternshipState::Waiting, 4),
            (InternshipState::Published, 2),
            (InternshipState::AttributedStudent, 3),
            (InternshipState::Running, 1),
            (InternshipState::AttributedMentor, 5),
            (InternshipState::Archived, 7),
        ]);

        assert_eq!(counters.suggested, 4);
        assert_eq!(counters.waiting, 5);
        assert_eq!(counters.attributed, 6);
        assert_eq!(counters.archived, 7);
        assert_eq!(counters.availables, 0);
        assert_eq!(counters.total, 22);
    }

    #[test]
    fn test_fold_campaign_counts_keeps_untracked_in_total() {
        let snapshot = fold_campaign_counts(
            3,
            vec![
                (InternshipState::AvailableCampaign, 6),
                (InternshipState::AttributedMentor, 2),
                (InternshipState::Archived, 4),
            ],
        );

        assert_eq!(snapshot.campaign, 3);
        assert_eq!(snapshot.internships.availables, 6);
        assert_eq!(snapshot.internships.attributed, 2);
        assert_eq!(snapshot.internships.total, 12);
    }

    #[test]
    fn test_parse_counts_skips_unknown_states() {
        let parsed = parse_counts(vec![
            ("RUNNING".to_string(), 3),
            ("DRAFT".to_string(), 9),
            ("WAITING".to_string(), -1),
        ]);

        assert_eq!(
            parsed,
            vec![(InternshipState::Running, 3), (InternshipState::Waiting, 0)]
        );
    }
}
