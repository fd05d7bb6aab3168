//! Statistics module
//!
//! Live placement counters for dashboards, and the routine that rebuilds
//! them from persisted data.

mod cache;
pub mod setup;
mod snapshot;

pub use cache::StatisticsCache;
pub use setup::{rebuild, SetupError};
pub use snapshot::{
    clean_campaign_statistics, clean_statistics, CampaignInternshipCounters, CampaignStatistics,
    InternshipCounters, Statistics,
};
