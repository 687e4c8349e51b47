//! Outcome convention shared by every boundary operation.
//!
//! Each operation returns exactly one of a value or an [`ApiError`] drawn
//! from a fixed taxonomy. Persistence failures never escape raw: services
//! convert them here and log the technical detail, so callers only branch on
//! the kind and pick a short message.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::records::RepositoryError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Record families that can be reported missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    User,
    EnrollmentForm,
    ProgramEnrollment,
    ScreeningRequest,
    HealthyHabitsTrackingForm,
    ScheduledMeeting,
}

impl Resource {
    pub const fn label(self) -> &'static str {
        match self {
            Resource::User => "user",
            Resource::EnrollmentForm => "enrollment form",
            Resource::ProgramEnrollment => "program enrollment",
            Resource::ScreeningRequest => "screening request",
            Resource::HealthyHabitsTrackingForm => "healthy habits tracking form",
            Resource::ScheduledMeeting => "scheduled meeting",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Failure kinds a boundary operation may report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum ApiError {
    #[error("duplicate record")]
    Duplicate,
    #[error("user already exists")]
    UserAlreadyExists,
    #[error("enrollment form already exists")]
    EnrollmentFormAlreadyExists,
    #[error("{0} not found")]
    NotFound(Resource),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("unauthorized")]
    Unauthorized,
    #[error("internal error")]
    Generic,
}

impl ApiError {
    /// Collapse an underlying failure into [`ApiError::Generic`], logging the detail.
    pub fn internal(context: &str, detail: impl fmt::Display) -> Self {
        error!(%detail, "{context}");
        ApiError::Generic
    }

    /// Map a repository failure, keeping `NotFound` distinguishable.
    pub fn from_repository(context: &str, resource: Resource, err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ApiError::NotFound(resource),
            RepositoryError::Conflict => ApiError::Duplicate,
            other => Self::internal(context, other),
        }
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Duplicate
            | ApiError::UserAlreadyExists
            | ApiError::EnrollmentFormAlreadyExists => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidCredentials | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Generic => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short, non-technical text safe to show to end users.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Duplicate => "A record with these details already exists".to_string(),
            ApiError::UserAlreadyExists => "You already have an account".to_string(),
            ApiError::EnrollmentFormAlreadyExists => {
                "You have already submitted this form".to_string()
            }
            ApiError::NotFound(resource) => {
                let label = resource.label();
                let mut chars = label.chars();
                match chars.next() {
                    Some(first) => format!("{}{} not found", first.to_uppercase(), chars.as_str()),
                    None => "Not found".to_string(),
                }
            }
            ApiError::InvalidCredentials => "Invalid email or password".to_string(),
            ApiError::Unauthorized => "Unauthorized".to_string(),
            ApiError::Generic => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.user_message(),
            "kind": &self,
        }));
        (self.status_code(), body).into_response()
    }
}
