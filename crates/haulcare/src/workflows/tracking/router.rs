use std::sync::Arc;

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get},
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use super::{validate_tracking_form, HealthyHabitsTrackingService, TrackingFormDraft};
use crate::records::{CaseRepository, HealthyHabitsTrackingFormId, UserId};
use crate::workflows::accounts::{AdminSession, AuthenticatedSession, SharedSessions};

pub struct TrackingState<R> {
    pub tracking: Arc<HealthyHabitsTrackingService<R>>,
    pub sessions: SharedSessions,
}

impl<R> Clone for TrackingState<R> {
    fn clone(&self) -> Self {
        Self {
            tracking: Arc::clone(&self.tracking),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

impl<R> FromRef<TrackingState<R>> for SharedSessions {
    fn from_ref(state: &TrackingState<R>) -> Self {
        Arc::clone(&state.sessions)
    }
}

/// Clients submit and review their weekly forms; admins read any client's.
pub fn tracking_router<R>(state: TrackingState<R>) -> Router
where
    R: CaseRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/healthy-habits/tracking-forms",
            get(own_forms_handler::<R>).post(submit_handler::<R>),
        )
        .route(
            "/api/v1/healthy-habits/tracking-forms/users/:user_id",
            get(client_forms_handler::<R>),
        )
        .route(
            "/api/v1/healthy-habits/tracking-forms/:form_id",
            delete(delete_handler::<R>),
        )
        .with_state(state)
}

pub(crate) async fn submit_handler<R>(
    State(state): State<TrackingState<R>>,
    AuthenticatedSession(session): AuthenticatedSession,
    Json(draft): Json<TrackingFormDraft>,
) -> Response
where
    R: CaseRepository + 'static,
{
    let entry = match validate_tracking_form(draft, Utc::now().date_naive()) {
        Ok(entry) => entry,
        Err(errors) => {
            return (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "errors": errors.errors })))
                .into_response()
        }
    };
    match state.tracking.submit(&session.user_id, entry) {
        Ok(form) => (StatusCode::CREATED, Json(form)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn own_forms_handler<R>(
    State(state): State<TrackingState<R>>,
    AuthenticatedSession(session): AuthenticatedSession,
) -> Response
where
    R: CaseRepository + 'static,
{
    match state.tracking.forms_for_user(&session.user_id) {
        Ok(forms) => (StatusCode::OK, Json(json!({ "forms": forms }))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn client_forms_handler<R>(
    State(state): State<TrackingState<R>>,
    _admin: AdminSession,
    Path(user_id): Path<String>,
) -> Response
where
    R: CaseRepository + 'static,
{
    match state.tracking.forms_for_user(&UserId(user_id)) {
        Ok(forms) => (StatusCode::OK, Json(json!({ "forms": forms }))).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn delete_handler<R>(
    State(state): State<TrackingState<R>>,
    AuthenticatedSession(session): AuthenticatedSession,
    Path(form_id): Path<String>,
) -> Response
where
    R: CaseRepository + 'static,
{
    match state
        .tracking
        .delete(&session, &HealthyHabitsTrackingFormId(form_id))
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => err.into_response(),
    }
}
