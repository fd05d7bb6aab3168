//! Workflow States
//!
//! The internship lifecycle enumeration, the archival result, and the
//! coarse statistics buckets the lifecycle is folded into.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Internship lifecycle state.
///
/// Variants are declared in workflow order; the derived `Ord` is the
/// total order transitions advance along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InternshipState {
    Waiting,
    Published,
    AttributedStudent,
    AvailableCampaign,
    AttributedMentor,
    Running,
    Validation,
    Archived,
}

impl InternshipState {
    /// Every state, in workflow order
    pub const ALL: [InternshipState; 8] = [
        Self::Waiting,
        Self::Published,
        Self::AttributedStudent,
        Self::AvailableCampaign,
        Self::AttributedMentor,
        Self::Running,
        Self::Validation,
        Self::Archived,
    ];

    /// The single forward step from this state. `Archived` is terminal and
    /// maps onto itself.
    pub fn next_state(self) -> InternshipState {
        match self {
            Self::Waiting => Self::Published,
            Self::Published => Self::AttributedStudent,
            Self::AttributedStudent => Self::AvailableCampaign,
            Self::AvailableCampaign => Self::AttributedMentor,
            Self::AttributedMentor => Self::Running,
            Self::Running => Self::Validation,
            Self::Validation => Self::Archived,
            Self::Archived => Self::Archived,
        }
    }

    /// Statistics bucket an internship in this state is counted under.
    ///
    /// This is the only place workflow states are folded into buckets;
    /// both the live cache and the startup rebuild go through it.
    pub fn bucket(self) -> Bucket {
        match self {
            Self::Waiting => Bucket::Suggested,
            Self::Published | Self::AttributedStudent => Bucket::Waiting,
            Self::AvailableCampaign => Bucket::Available,
            Self::AttributedMentor | Self::Running => Bucket::Attributed,
            Self::Validation => Bucket::Validated,
            Self::Archived => Bucket::Archived,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::Published => "PUBLISHED",
            Self::AttributedStudent => "ATTRIBUTED_STUDENT",
            Self::AvailableCampaign => "AVAILABLE_CAMPAIGN",
            Self::AttributedMentor => "ATTRIBUTED_MENTOR",
            Self::Running => "RUNNING",
            Self::Validation => "VALIDATION",
            Self::Archived => "ARCHIVED",
        }
    }
}

impl Default for InternshipState {
    fn default() -> Self {
        Self::Waiting
    }
}

impl fmt::Display for InternshipState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InternshipState {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

/// Outcome recorded when an internship is archived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InternshipResult {
    Validated,
    NonValidated,
    Unknown,
    Canceled,
}

impl InternshipResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validated => "VALIDATED",
            Self::NonValidated => "NON_VALIDATED",
            Self::Unknown => "UNKNOWN",
            Self::Canceled => "CANCELED",
        }
    }
}

impl Default for InternshipResult {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for InternshipResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InternshipResult {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VALIDATED" => Ok(Self::Validated),
            "NON_VALIDATED" => Ok(Self::NonValidated),
            "UNKNOWN" => Ok(Self::Unknown),
            "CANCELED" => Ok(Self::Canceled),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// Coarse lifecycle category used by the statistics cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Suggested,
    Waiting,
    Available,
    Attributed,
    Validated,
    Archived,
}

impl Bucket {
    pub const ALL: [Bucket; 6] = [
        Self::Suggested,
        Self::Waiting,
        Self::Available,
        Self::Attributed,
        Self::Validated,
        Self::Archived,
    ];

    /// The per-campaign counter this bucket feeds, if campaigns track it.
    /// Campaign snapshots only follow internships that are open for, or
    /// assigned to, a mentor.
    pub fn campaign_counter(self) -> Option<CampaignBucket> {
        match self {
            Self::Available => Some(CampaignBucket::Availables),
            Self::Attributed => Some(CampaignBucket::Attributed),
            _ => None,
        }
    }
}

/// Internship counters held by a campaign snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CampaignBucket {
    Availables,
    Attributed,
}

/// Unrecognized textual state or result
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown variant: {0}")]
pub struct UnknownVariant(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_state_follows_declared_order() {
        for pair in InternshipState::ALL.windows(2) {
            assert_eq!(pair[0].next_state(), pair[1]);
            assert!(pair[0] < pair[1]);
        }
        assert_eq!(InternshipState::Archived.next_state(), InternshipState::Archived);
    }

    #[test]
    fn test_state_round_trips_through_text() {
        for state in InternshipState::ALL {
            assert_eq!(state.to_string().parse::<InternshipState>(), Ok(state));
        }
        assert!("DRAFT".parse::<InternshipState>().is_err());
    }

    #[test]
    fn test_state_serializes_screaming_snake() {
        let json = serde_json::to_string(&InternshipState::AttributedStudent).unwrap();
        assert_eq!(json, "\"ATTRIBUTED_STUDENT\"");
    }

    #[test]
    fn test_bucket_mapping() {
        assert_eq!(InternshipState::Waiting.bucket(), Bucket::Suggested);
        assert_eq!(InternshipState::Published.bucket(), Bucket::Waiting);
        assert_eq!(InternshipState::AvailableCampaign.bucket(), Bucket::Available);
        assert_eq!(InternshipState::Running.bucket(), Bucket::Attributed);
        assert_eq!(InternshipState::Validation.bucket(), Bucket::Validated);
        assert_eq!(InternshipState::Archived.bucket(), Bucket::Archived);
    }

    #[test]
    fn test_only_mentor_buckets_reach_campaigns() {
        let tracked: Vec<_> = Bucket::ALL
            .into_iter()
            .filter(|b| b.campaign_counter().is_some())
            .collect();
        assert_eq!(tracked, vec![Bucket::Available, Bucket::Attributed]);
    }

    #[test]
    fn test_result_parse() {
        assert_eq!("NON_VALIDATED".parse(), Ok(InternshipResult::NonValidated));
        assert!("validated".parse::<InternshipResult>().is_err());
    }
}
