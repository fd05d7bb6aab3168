//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::DomainError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Campaign statistics not found: {0}")]
    CampaignNotFound(i64),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Server errors (5xx)
    #[error(transparent)]
    Repository(#[from] crate::repository::RepositoryError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    /// Status, machine-readable code and optional structured details
    fn parts(&self) -> (StatusCode, &'static str, Option<serde_json::Value>) {
        match self {
            // 400 Bad Request
            AppError::InvalidRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_request",
                Some(serde_json::json!(msg)),
            ),

            // 404 Not Found
            AppError::CampaignNotFound(id) => (
                StatusCode::NOT_FOUND,
                "campaign_not_found",
                Some(serde_json::json!({ "campaign": id })),
            ),

            // Domain errors - map to appropriate HTTP status
            AppError::Domain(domain_err) => match domain_err {
                DomainError::ForbiddenTransition {
                    current,
                    target,
                    expected,
                } => (
                    StatusCode::FORBIDDEN,
                    "forbidden_transition",
                    Some(serde_json::json!({
                        "current": current,
                        "target": target,
                        "expected": expected,
                    })),
                ),
                DomainError::InternshipNotFound(id) => (
                    StatusCode::NOT_FOUND,
                    "internship_not_found",
                    Some(serde_json::json!({ "internship": id })),
                ),
                DomainError::RelatedNotFound { entity, id } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "related_not_found",
                    Some(serde_json::json!({ "entity": entity.to_string(), "id": id })),
                ),
                DomainError::Unpersisted => {
                    (StatusCode::BAD_REQUEST, "internship_unpersisted", None)
                }
            },

            // 500 Internal Server Error
            AppError::Repository(e) => {
                tracing::error!("Repository error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "repository_error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        }
    }

    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        self.parts().0
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = self.parts();

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{InternshipState, RelatedEntity};

    #[test]
    fn test_forbidden_transition_maps_to_403() {
        let err: AppError =
            DomainError::forbidden(InternshipState::Waiting, InternshipState::Running).into();

        let (status, code, details) = err.parts();
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(code, "forbidden_transition");
        let details = details.unwrap();
        assert_eq!(details["current"], "WAITING");
        assert_eq!(details["target"], "RUNNING");
        assert_eq!(details["expected"], "PUBLISHED");
    }

    #[test]
    fn test_not_found_statuses() {
        let err: AppError = DomainError::InternshipNotFound(3).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::CampaignNotFound(3).status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_related_not_found_is_unprocessable() {
        let err: AppError = DomainError::RelatedNotFound {
            entity: RelatedEntity::Student,
            id: 8,
        }
        .into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_internal_error_hides_details() {
        let (status, _, details) = AppError::Internal("boom".to_string()).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(details.is_none());
    }
}
