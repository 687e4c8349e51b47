//! Staff review of pending program applications.

use std::sync::Arc;

use axum::{
    extract::{FromRef, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::programs::Program;
use super::service::EnrollmentService;
use crate::records::{CaseRepository, EnrollmentStatus, ProgramEnrollment, ProgramEnrollmentId};
use crate::workflows::accounts::{AdminSession, SharedSessions};

/// A pending enrollment with the applicant's contact details from their form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingApplication {
    #[serde(flatten)]
    pub enrollment: ProgramEnrollment,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
}

impl PendingApplication {
    /// `needle` must already be lowercase.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        [
            &self.first_name,
            &self.last_name,
            &self.phone_number,
            &self.enrollment.email,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }
}

pub struct ApplicationsState<R> {
    pub enrollment: Arc<EnrollmentService<R>>,
    pub sessions: SharedSessions,
}

impl<R> Clone for ApplicationsState<R> {
    fn clone(&self) -> Self {
        Self {
            enrollment: Arc::clone(&self.enrollment),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

impl<R> FromRef<ApplicationsState<R>> for SharedSessions {
    fn from_ref(state: &ApplicationsState<R>) -> Self {
        Arc::clone(&state.sessions)
    }
}

/// Admin-only listing and review of pending applications.
pub fn applications_router<R>(state: ApplicationsState<R>) -> Router
where
    R: CaseRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/program-enrollments/pending",
            get(pending_handler::<R>),
        )
        .route(
            "/api/v1/program-enrollments/:enrollment_id/status",
            put(update_status_handler::<R>),
        )
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PendingParams {
    pub search: Option<String>,
    pub program: Option<Program>,
}

pub(crate) async fn pending_handler<R>(
    State(state): State<ApplicationsState<R>>,
    _admin: AdminSession,
    Query(params): Query<PendingParams>,
) -> Response
where
    R: CaseRepository + 'static,
{
    let search = params.search.unwrap_or_default();
    match state.enrollment.pending_applications(params.program, &search) {
        Ok(applications) => {
            (StatusCode::OK, Json(json!({ "applications": applications }))).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: EnrollmentStatus,
}

pub(crate) async fn update_status_handler<R>(
    State(state): State<ApplicationsState<R>>,
    _admin: AdminSession,
    Path(enrollment_id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> Response
where
    R: CaseRepository + 'static,
{
    match state
        .enrollment
        .update_program_enrollment_status(&ProgramEnrollmentId(enrollment_id), update.status)
    {
        Ok(enrollment) => (StatusCode::OK, Json(enrollment)).into_response(),
        Err(err) => err.into_response(),
    }
}
