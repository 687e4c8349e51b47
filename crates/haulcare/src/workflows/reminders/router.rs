use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use tracing::warn;

use super::{ReminderDispatcher, ReminderMailer};
use crate::records::CaseRepository;

pub const API_KEY_HEADER: &str = "x-api-key";

pub struct ReminderState<R, M> {
    pub dispatcher: Arc<ReminderDispatcher<R, M>>,
    /// Shared secret of the scheduler; with none configured every call is refused.
    pub api_key: Option<String>,
}

impl<R, M> Clone for ReminderState<R, M> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
            api_key: self.api_key.clone(),
        }
    }
}

pub fn reminders_router<R, M>(state: ReminderState<R, M>) -> Router
where
    R: CaseRepository + 'static,
    M: ReminderMailer + 'static,
{
    Router::new()
        .route(
            "/api/emails/actions/send-daily-scheduled-meeting-reminders",
            post(send_daily_reminders_handler::<R, M>),
        )
        .with_state(state)
}

pub(crate) async fn send_daily_reminders_handler<R, M>(
    State(state): State<ReminderState<R, M>>,
    headers: HeaderMap,
) -> Response
where
    R: CaseRepository + 'static,
    M: ReminderMailer + 'static,
{
    let presented = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    let authorized = match (presented, state.api_key.as_deref()) {
        (Some(presented), Some(expected)) => !expected.is_empty() && presented == expected,
        _ => false,
    };
    if !authorized {
        warn!("reminder trigger rejected");
        let payload = json!({ "error": "Invalid request." });
        return (StatusCode::UNAUTHORIZED, Json(payload)).into_response();
    }

    let today = Utc::now().date_naive();
    match state.dispatcher.send_daily_meeting_reminders(today).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(_) => {
            let payload = json!({ "error": "Internal server error." });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
