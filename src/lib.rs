//! Internship tracker library
//!
//! Re-exports modules for integration testing and the server binary.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod repository;
pub mod statistics;
pub mod workflow;

mod error;

pub use config::Config;
pub use domain::{DomainError, Internship, InternshipEvent, InternshipResult, InternshipState};
pub use error::{AppError, AppResult, ErrorResponse};
pub use statistics::StatisticsCache;
pub use workflow::{InternshipHandler, LinkPolicy, Workflow};
