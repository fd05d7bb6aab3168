//! API Routes
//!
//! HTTP endpoint definitions.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::domain::{Internship, InternshipResult, InternshipState};
use crate::error::AppError;
use crate::statistics::{CampaignStatistics, Statistics, StatisticsCache};
use crate::workflow::Workflow;

/// Shared state handed to every route
#[derive(Debug, Clone)]
pub struct AppState {
    pub workflow: Workflow,
    pub statistics: Arc<StatisticsCache>,
}

impl AppState {
    pub fn new(workflow: Workflow, statistics: Arc<StatisticsCache>) -> Self {
        Self {
            workflow,
            statistics,
        }
    }
}

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInternshipRequest {
    pub subject: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub additional: Option<String>,
    #[serde(default)]
    pub is_abroad: bool,
    #[serde(default)]
    pub business: Option<i64>,
    #[serde(default)]
    pub category: Option<i64>,
}

impl CreateInternshipRequest {
    fn into_internship(self) -> Result<Internship, AppError> {
        if self.subject.trim().is_empty() {
            return Err(AppError::InvalidRequest("subject must not be empty".to_string()));
        }

        let mut internship = Internship::new(self.subject)
            .with_description(self.description)
            .with_location(self.country, self.city, self.postal_code, self.address);
        internship.additional = self.additional;
        internship.is_abroad = self.is_abroad;
        internship.business = self.business;
        internship.category = self.category;
        Ok(internship)
    }
}

/// Body for transitions that may link a related record
#[derive(Debug, Default, Deserialize)]
pub struct LinkRequest {
    #[serde(default)]
    pub id: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    /// Epoch milliseconds
    #[serde(default)]
    pub end_at: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ArchiveRequest {
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransitionResponse {
    pub previous: InternshipState,
    pub internship: Internship,
}

#[derive(Debug, Serialize)]
pub struct CampaignsResponse {
    pub campaigns: Vec<CampaignStatistics>,
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/internships", post(create_internship))
        .route("/internships/:internship_id", get(get_internship))
        // Transitions
        .route("/internships/:internship_id/unpublish", post(unpublish))
        .route("/internships/:internship_id/publish", post(publish))
        .route("/internships/:internship_id/student", post(attribute_student))
        .route("/internships/:internship_id/campaign", post(make_available))
        .route("/internships/:internship_id/mentor", post(attribute_mentor))
        .route("/internships/:internship_id/run", post(run))
        .route("/internships/:internship_id/validation", post(validate))
        .route("/internships/:internship_id/archive", post(archive))
        // Counters
        .route("/statistics", get(get_statistics))
        .route("/statistics/campaigns", get(list_campaign_statistics))
        .route("/statistics/campaigns/:campaign_id", get(get_campaign_statistics))
}

// =========================================================================
// Internships
// =========================================================================

/// Create a new internship in WAITING
async fn create_internship(
    State(state): State<AppState>,
    Json(request): Json<CreateInternshipRequest>,
) -> Result<(StatusCode, Json<Internship>), AppError> {
    let internship = state.workflow.create(request.into_internship()?).await?;

    Ok((StatusCode::CREATED, Json(internship)))
}

async fn get_internship(
    State(state): State<AppState>,
    Path(internship_id): Path<i64>,
) -> Result<Json<Internship>, AppError> {
    let handler = state.workflow.handler(internship_id).await?;

    Ok(Json(handler.into_internship()))
}

// =========================================================================
// Transitions
// =========================================================================

async fn unpublish(
    State(state): State<AppState>,
    Path(internship_id): Path<i64>,
) -> Result<Json<TransitionResponse>, AppError> {
    let mut handler = state.workflow.handler(internship_id).await?;
    let previous = handler.state();
    handler.to_waiting().await?;

    Ok(Json(TransitionResponse {
        previous,
        internship: handler.into_internship(),
    }))
}

async fn publish(
    State(state): State<AppState>,
    Path(internship_id): Path<i64>,
) -> Result<Json<TransitionResponse>, AppError> {
    let mut handler = state.workflow.handler(internship_id).await?;
    let previous = handler.state();
    handler.to_published().await?;

    Ok(Json(TransitionResponse {
        previous,
        internship: handler.into_internship(),
    }))
}

async fn attribute_student(
    State(state): State<AppState>,
    Path(internship_id): Path<i64>,
    request: Option<Json<LinkRequest>>,
) -> Result<Json<TransitionResponse>, AppError> {
    let request = request.map(|Json(body)| body).unwrap_or_default();
    let mut handler = state.workflow.handler(internship_id).await?;
    let previous = handler.state();
    handler.to_attributed_student(request.id).await?;

    Ok(Json(TransitionResponse {
        previous,
        internship: handler.into_internship(),
    }))
}

async fn make_available(
    State(state): State<AppState>,
    Path(internship_id): Path<i64>,
    request: Option<Json<LinkRequest>>,
) -> Result<Json<TransitionResponse>, AppError> {
    let request = request.map(|Json(body)| body).unwrap_or_default();
    let mut handler = state.workflow.handler(internship_id).await?;
    let previous = handler.state();
    handler.to_campaign_available(request.id).await?;

    Ok(Json(TransitionResponse {
        previous,
        internship: handler.into_internship(),
    }))
}

async fn attribute_mentor(
    State(state): State<AppState>,
    Path(internship_id): Path<i64>,
    request: Option<Json<LinkRequest>>,
) -> Result<Json<TransitionResponse>, AppError> {
    let request = request.map(|Json(body)| body).unwrap_or_default();
    let mut handler = state.workflow.handler(internship_id).await?;
    let previous = handler.state();
    handler.to_attributed_mentor(request.id).await?;

    Ok(Json(TransitionResponse {
        previous,
        internship: handler.into_internship(),
    }))
}

async fn run(
    State(state): State<AppState>,
    Path(internship_id): Path<i64>,
    request: Option<Json<RunRequest>>,
) -> Result<Json<TransitionResponse>, AppError> {
    let request = request.map(|Json(body)| body).unwrap_or_default();
    let mut handler = state.workflow.handler(internship_id).await?;
    let previous = handler.state();
    handler.to_running(request.end_at).await?;

    Ok(Json(TransitionResponse {
        previous,
        internship: handler.into_internship(),
    }))
}

async fn validate(
    State(state): State<AppState>,
    Path(internship_id): Path<i64>,
) -> Result<Json<TransitionResponse>, AppError> {
    let mut handler = state.workflow.handler(internship_id).await?;
    let previous = handler.state();
    handler.to_validation().await?;

    Ok(Json(TransitionResponse {
        previous,
        internship: handler.into_internship(),
    }))
}

/// Archive; a recognized result string closes as `VALIDATED`
async fn archive(
    State(state): State<AppState>,
    Path(internship_id): Path<i64>,
    request: Option<Json<ArchiveRequest>>,
) -> Result<Json<TransitionResponse>, AppError> {
    let request = request.map(|Json(body)| body).unwrap_or_default();
    let result = request
        .result
        .as_deref()
        .and_then(|raw| raw.parse::<InternshipResult>().ok());

    let mut handler = state.workflow.handler(internship_id).await?;
    let previous = handler.state();
    handler.archive(result).await?;

    Ok(Json(TransitionResponse {
        previous,
        internship: handler.into_internship(),
    }))
}

// =========================================================================
// Statistics
// =========================================================================

async fn get_statistics(State(state): State<AppState>) -> Json<Statistics> {
    Json(state.statistics.statistics())
}

async fn list_campaign_statistics(State(state): State<AppState>) -> Json<CampaignsResponse> {
    Json(CampaignsResponse {
        campaigns: state.statistics.campaigns(),
    })
}

async fn get_campaign_statistics(
    State(state): State<AppState>,
    Path(campaign_id): Path<i64>,
) -> Result<Json<CampaignStatistics>, AppError> {
    state
        .statistics
        .get_campaign(campaign_id)
        .map(Json)
        .ok_or(AppError::CampaignNotFound(campaign_id))
}
