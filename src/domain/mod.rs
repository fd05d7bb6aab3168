//! Domain module
//!
//! Core domain types and business rules of the placement workflow.

pub mod error;
pub mod events;
pub mod internship;
pub mod state;

pub use error::{DomainError, RelatedEntity};
pub use events::InternshipEvent;
pub use internship::{Campaign, Internship};
pub use state::{Bucket, CampaignBucket, InternshipResult, InternshipState, UnknownVariant};
