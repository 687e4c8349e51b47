use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::domain::{ProgramSelectionSection, Section};
use super::registry::{RegistryError, WizardRegistry};
use super::submission::{EnrollmentGateway, WizardRoute};
use super::validation::{
    GeneralInformationDraft, ProgramSpecificQuestionsDraft, QualifyingQuestionsDraft,
};
use super::wizard::StepOutcome;

/// Router builder exposing the enrollment wizard over HTTP.
pub fn enrollment_router<G>(registry: Arc<WizardRegistry<G>>) -> Router
where
    G: EnrollmentGateway + 'static,
{
    Router::new()
        .route("/api/v1/enrollment/sessions", post(open_handler::<G>))
        .route(
            "/api/v1/enrollment/sessions/:session_id",
            get(snapshot_handler::<G>).delete(close_handler::<G>),
        )
        .route(
            "/api/v1/enrollment/sessions/:session_id/sections/:section",
            put(section_handler::<G>),
        )
        .route(
            "/api/v1/enrollment/sessions/:session_id/confirmation",
            post(confirmation_handler::<G>),
        )
        .with_state(registry)
}

pub(crate) async fn open_handler<G>(State(registry): State<Arc<WizardRegistry<G>>>) -> Response
where
    G: EnrollmentGateway + 'static,
{
    match registry.open() {
        Ok(session_id) => {
            let payload = json!({
                "session_id": session_id,
                "current_route": WizardRoute::GeneralInformation,
            });
            (StatusCode::CREATED, Json(payload)).into_response()
        }
        Err(err) => registry_error(err),
    }
}

pub(crate) async fn snapshot_handler<G>(
    State(registry): State<Arc<WizardRegistry<G>>>,
    Path(session_id): Path<String>,
) -> Response
where
    G: EnrollmentGateway + 'static,
{
    match registry.snapshot(&session_id) {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(err) => registry_error(err),
    }
}

/// Abandon a session before it is submitted.
pub(crate) async fn close_handler<G>(
    State(registry): State<Arc<WizardRegistry<G>>>,
    Path(session_id): Path<String>,
) -> Response
where
    G: EnrollmentGateway + 'static,
{
    match registry.close(&session_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => registry_error(err),
    }
}

pub(crate) async fn section_handler<G>(
    State(registry): State<Arc<WizardRegistry<G>>>,
    Path((session_id, section)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response
where
    G: EnrollmentGateway + 'static,
{
    let Some(section) = Section::from_slug(&section) else {
        let payload = json!({ "error": format!("unknown section '{section}'") });
        return (StatusCode::NOT_FOUND, Json(payload)).into_response();
    };

    let outcome = match section {
        Section::GeneralInformation => match parse::<GeneralInformationDraft>(body) {
            Ok(draft) => {
                registry.with_session(&session_id, |wizard| wizard.submit_general_information(draft))
            }
            Err(response) => return response,
        },
        Section::QualifyingQuestions => match parse::<QualifyingQuestionsDraft>(body) {
            Ok(draft) => registry
                .with_session(&session_id, |wizard| wizard.submit_qualifying_questions(draft)),
            Err(response) => return response,
        },
        Section::ProgramSelection => match parse::<ProgramSelectionSection>(body) {
            Ok(selection) => registry
                .with_session(&session_id, |wizard| wizard.submit_program_selection(selection)),
            Err(response) => return response,
        },
        Section::ProgramSpecificQuestions => match parse::<ProgramSpecificQuestionsDraft>(body) {
            Ok(draft) => {
                registry
                    .submit_program_specific_questions(&session_id, draft)
                    .await
            }
            Err(response) => return response,
        },
    };

    match outcome {
        Ok(outcome) => step_response(outcome),
        Err(err) => registry_error(err),
    }
}

pub(crate) async fn confirmation_handler<G>(
    State(registry): State<Arc<WizardRegistry<G>>>,
    Path(session_id): Path<String>,
) -> Response
where
    G: EnrollmentGateway + 'static,
{
    match registry.confirmation_mounted(&session_id) {
        Ok(reset) => (StatusCode::OK, Json(json!({ "reset": reset }))).into_response(),
        Err(err) => registry_error(err),
    }
}

fn parse<T: DeserializeOwned>(body: Value) -> Result<T, Response> {
    serde_json::from_value(body).map_err(|err| {
        let payload = json!({ "error": format!("malformed section payload: {err}") });
        (StatusCode::BAD_REQUEST, Json(payload)).into_response()
    })
}

fn step_response(outcome: StepOutcome) -> Response {
    let status = match &outcome {
        StepOutcome::Advanced { .. } => StatusCode::OK,
        StepOutcome::Invalid { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        StepOutcome::Redirect { .. } | StepOutcome::Rejected { .. } => StatusCode::CONFLICT,
        StepOutcome::Submission { report } => match &report.outcome {
            Ok(()) => StatusCode::CREATED,
            Err(error) => error.status_code(),
        },
    };
    (status, Json(outcome)).into_response()
}

fn registry_error(err: RegistryError) -> Response {
    let status = match err {
        RegistryError::UnknownSession => StatusCode::NOT_FOUND,
        RegistryError::Unavailable => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}
