use crate::infra::{AppState, CaseServices};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use haulcare::workflows::accounts::{accounts_router, SharedSessions};
use haulcare::workflows::dashboard::{dashboard_router, DashboardState};
use haulcare::workflows::enrollment::{applications_router, enrollment_router, ApplicationsState};
use haulcare::workflows::reminders::{reminders_router, ReminderState};
use haulcare::workflows::tracking::{tracking_router, TrackingState};
use serde_json::json;
use std::sync::Arc;

/// Every workflow router plus the operational endpoints.
pub(crate) fn with_case_routes(services: &CaseServices, api_key: Option<String>) -> Router {
    let sessions: SharedSessions = services.accounts.clone();

    Router::new()
        .merge(enrollment_router(Arc::clone(&services.wizards)))
        .merge(accounts_router(Arc::clone(&services.accounts)))
        .merge(applications_router(ApplicationsState {
            enrollment: Arc::clone(&services.enrollment),
            sessions: Arc::clone(&sessions),
        }))
        .merge(tracking_router(TrackingState {
            tracking: Arc::clone(&services.tracking),
            sessions: Arc::clone(&sessions),
        }))
        .merge(dashboard_router(DashboardState {
            dashboard: Arc::clone(&services.dashboard),
            sessions,
        }))
        .merge(reminders_router(ReminderState {
            dispatcher: Arc::clone(&services.reminders),
            api_key,
        }))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
