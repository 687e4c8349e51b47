use std::sync::Arc;

use axum::{
    extract::{FromRef, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;

use super::{DashboardService, ExportCollection};
use crate::records::CaseRepository;
use crate::workflows::accounts::{AdminSession, SharedSessions};
use crate::workflows::enrollment::programs::Program;

pub struct DashboardState<R> {
    pub dashboard: Arc<DashboardService<R>>,
    pub sessions: SharedSessions,
}

impl<R> Clone for DashboardState<R> {
    fn clone(&self) -> Self {
        Self {
            dashboard: Arc::clone(&self.dashboard),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

impl<R> FromRef<DashboardState<R>> for SharedSessions {
    fn from_ref(state: &DashboardState<R>) -> Self {
        Arc::clone(&state.sessions)
    }
}

/// Admin-only metrics and CSV downloads.
pub fn dashboard_router<R>(state: DashboardState<R>) -> Router
where
    R: CaseRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/dashboard/screenings",
            get(screening_dashboard_handler::<R>),
        )
        .route(
            "/api/v1/dashboard/programs/:program",
            get(program_registrations_handler::<R>),
        )
        .route(
            "/api/v1/data-export/:collection",
            get(export_handler::<R>),
        )
        .with_state(state)
}

pub(crate) async fn screening_dashboard_handler<R>(
    State(state): State<DashboardState<R>>,
    _admin: AdminSession,
) -> Response
where
    R: CaseRepository + 'static,
{
    match state.dashboard.screening_dashboard(Utc::now()) {
        Ok(dashboard) => (StatusCode::OK, Json(dashboard)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn program_registrations_handler<R>(
    State(state): State<DashboardState<R>>,
    _admin: AdminSession,
    Path(program): Path<Program>,
) -> Response
where
    R: CaseRepository + 'static,
{
    match state.dashboard.program_registrations(program, Utc::now()) {
        Ok(registrations) => (StatusCode::OK, Json(registrations)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn export_handler<R>(
    State(state): State<DashboardState<R>>,
    _admin: AdminSession,
    Path(collection): Path<String>,
) -> Response
where
    R: CaseRepository + 'static,
{
    let Some(collection) = ExportCollection::from_path(&collection) else {
        let payload = json!({ "error": format!("unknown collection '{collection}'") });
        return (StatusCode::NOT_FOUND, Json(payload)).into_response();
    };

    match state.dashboard.export(collection) {
        Ok(body) => {
            let disposition = format!("attachment; filename=\"{}\"", collection.file_name());
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                body,
            )
                .into_response()
        }
        Err(err) => err.into_response(),
    }
}
