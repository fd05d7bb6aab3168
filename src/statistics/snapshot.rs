//! Statistics snapshots
//!
//! Counter value types held by the statistics cache, and the
//! canonicalization that turns partial seed data into complete snapshots.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Bucket, CampaignBucket};

/// Global internship counters, one per bucket plus a running total
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InternshipCounters {
    pub total: u64,
    pub suggested: u64,
    pub waiting: u64,
    pub availables: u64,
    pub attributed: u64,
    pub validated: u64,
    pub archived: u64,
}

impl InternshipCounters {
    pub fn get(&self, bucket: Bucket) -> u64 {
        match bucket {
            Bucket::Suggested => self.suggested,
            Bucket::Waiting => self.waiting,
            Bucket::Available => self.availables,
            Bucket::Attributed => self.attributed,
            Bucket::Validated => self.validated,
            Bucket::Archived => self.archived,
        }
    }

    pub fn bucket_mut(&mut self, bucket: Bucket) -> &mut u64 {
        match bucket {
            Bucket::Suggested => &mut self.suggested,
            Bucket::Waiting => &mut self.waiting,
            Bucket::Available => &mut self.availables,
            Bucket::Attributed => &mut self.attributed,
            Bucket::Validated => &mut self.validated,
            Bucket::Archived => &mut self.archived,
        }
    }
}

/// Global dashboard snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Statistics {
    pub internships: InternshipCounters,
    pub mentors: u64,
    pub students: u64,
    pub propositions: u64,
}

/// Internship counters tracked per campaign
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignInternshipCounters {
    pub total: u64,
    pub availables: u64,
    #[serde(alias = "validated")]
    pub attributed: u64,
}

impl CampaignInternshipCounters {
    pub fn get(&self, bucket: CampaignBucket) -> u64 {
        match bucket {
            CampaignBucket::Availables => self.availables,
            CampaignBucket::Attributed => self.attributed,
        }
    }

    pub fn bucket_mut(&mut self, bucket: CampaignBucket) -> &mut u64 {
        match bucket {
            CampaignBucket::Availables => &mut self.availables,
            CampaignBucket::Attributed => &mut self.attributed,
        }
    }
}

/// Snapshot for a single campaign
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignStatistics {
    pub internships: CampaignInternshipCounters,
    pub students: u64,
    pub mentors: u64,
    pub propositions: u64,
    pub campaign: i64,
}

impl CampaignStatistics {
    /// Zero-filled snapshot for `campaign`
    pub fn empty(campaign: i64) -> Self {
        Self {
            campaign,
            ..Self::default()
        }
    }
}

/// Apply a signed delta to a counter, flooring at zero.
///
/// Returns `false` when the floor clipped the delta.
pub(crate) fn apply_delta(counter: &mut u64, delta: i64) -> bool {
    if delta >= 0 {
        *counter = counter.saturating_add(delta.unsigned_abs());
        true
    } else {
        let magnitude = delta.unsigned_abs();
        let clipped = *counter < magnitude;
        *counter = counter.saturating_sub(magnitude);
        !clipped
    }
}

/// Read a non-negative integer at `pointer`, zero when absent or malformed
fn count_at(raw: &Value, pointer: &str) -> u64 {
    raw.pointer(pointer).and_then(Value::as_u64).unwrap_or(0)
}

/// Canonicalize loosely shaped global seed data.
///
/// Missing, negative or non-numeric fields become zero. `availables` also
/// accepts the singular `available`.
pub fn clean_statistics(raw: &Value) -> Statistics {
    let availables = match raw.pointer("/internships/availables") {
        Some(_) => count_at(raw, "/internships/availables"),
        None => count_at(raw, "/internships/available"),
    };

    Statistics {
        internships: InternshipCounters {
            total: count_at(raw, "/internships/total"),
            suggested: count_at(raw, "/internships/suggested"),
            waiting: count_at(raw, "/internships/waiting"),
            availables,
            attributed: count_at(raw, "/internships/attributed"),
            validated: count_at(raw, "/internships/validated"),
            archived: count_at(raw, "/internships/archived"),
        },
        mentors: count_at(raw, "/mentors"),
        students: count_at(raw, "/students"),
        propositions: count_at(raw, "/propositions"),
    }
}

/// Canonicalize loosely shaped campaign seed data.
///
/// Returns `None` when no positive campaign id is present. The attributed
/// counter also accepts the legacy `validated` key.
pub fn clean_campaign_statistics(raw: &Value) -> Option<CampaignStatistics> {
    let campaign = raw.get("campaign").and_then(Value::as_i64).filter(|id| *id > 0)?;

    let attributed = match raw.pointer("/internships/attributed") {
        Some(_) => count_at(raw, "/internships/attributed"),
        None => count_at(raw, "/internships/validated"),
    };

    Some(CampaignStatistics {
        internships: CampaignInternshipCounters {
            total: count_at(raw, "/internships/total"),
            availables: count_at(raw, "/internships/availables"),
            attributed,
        },
        students: count_at(raw, "/students"),
        mentors: count_at(raw, "/mentors"),
        propositions: count_at(raw, "/propositions"),
        campaign,
    })
}
