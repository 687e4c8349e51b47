use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{EnrollmentSubmission, Section};
use crate::outcome::{ApiError, ApiResult};

pub const SUBMITTED_NOTICE: &str = "Enrollment form submitted successfully";
pub const ACCOUNT_EXISTS_NOTICE: &str = "You already have an account";
pub const FORM_EXISTS_NOTICE: &str = "You have already submitted this form";
pub const UNKNOWN_ERROR_NOTICE: &str = "An unknown error occurred";

/// Record boundary the wizard submits completed forms to.
#[async_trait]
pub trait EnrollmentGateway: Send + Sync {
    async fn submit_enrollment_form(&self, submission: EnrollmentSubmission) -> ApiResult<()>;
}

/// Pages the wizard can send the applicant to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardRoute {
    GeneralInformation,
    QualifyingQuestions,
    ProgramSelection,
    ProgramSpecificQuestions,
    Submitted,
}

impl WizardRoute {
    pub const fn path(self) -> &'static str {
        match self {
            WizardRoute::GeneralInformation => "/enrollment-form/general-information",
            WizardRoute::QualifyingQuestions => "/enrollment-form/qualifying-questions",
            WizardRoute::ProgramSelection => "/enrollment-form/program-selection",
            WizardRoute::ProgramSpecificQuestions => "/enrollment-form/program-specific-questions",
            WizardRoute::Submitted => "/enrollment-form/submitted",
        }
    }
}

impl From<Section> for WizardRoute {
    fn from(section: Section) -> Self {
        match section {
            Section::GeneralInformation => WizardRoute::GeneralInformation,
            Section::QualifyingQuestions => WizardRoute::QualifyingQuestions,
            Section::ProgramSelection => WizardRoute::ProgramSelection,
            Section::ProgramSpecificQuestions => WizardRoute::ProgramSpecificQuestions,
        }
    }
}

/// Transient message shown to the applicant after a submission attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "level", content = "message", rename_all = "snake_case")]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    pub fn submitted() -> Self {
        Notice::Success(SUBMITTED_NOTICE.to_string())
    }

    pub fn for_error(error: &ApiError) -> Self {
        let message = match error {
            ApiError::UserAlreadyExists => ACCOUNT_EXISTS_NOTICE,
            ApiError::EnrollmentFormAlreadyExists => FORM_EXISTS_NOTICE,
            _ => UNKNOWN_ERROR_NOTICE,
        };
        Notice::Error(message.to_string())
    }

    pub fn message(&self) -> &str {
        match self {
            Notice::Success(message) | Notice::Error(message) => message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    Submitting,
    Submitted,
    Failed(ApiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionRejected {
    #[error("a submission is already in flight")]
    InFlight,
    #[error("the form has already been submitted")]
    AlreadySubmitted,
}

/// What the applicant sees once a submission attempt settles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReport {
    #[serde(skip)]
    pub outcome: Result<(), ApiError>,
    pub notice: Notice,
    /// Set only on success; failures leave the applicant where they are.
    pub navigate_to: Option<WizardRoute>,
}

/// Guards the single submission edge of a wizard session.
#[derive(Debug, Clone)]
pub struct SubmissionMachine {
    state: SubmissionState,
}

impl Default for SubmissionMachine {
    fn default() -> Self {
        Self {
            state: SubmissionState::Idle,
        }
    }
}

impl SubmissionMachine {
    pub fn state(&self) -> &SubmissionState {
        &self.state
    }

    /// Enter `Submitting` from `Idle` or `Failed`.
    pub fn begin(&mut self) -> Result<(), SubmissionRejected> {
        match self.state {
            SubmissionState::Idle | SubmissionState::Failed(_) => {
                self.state = SubmissionState::Submitting;
                Ok(())
            }
            SubmissionState::Submitting => Err(SubmissionRejected::InFlight),
            SubmissionState::Submitted => Err(SubmissionRejected::AlreadySubmitted),
        }
    }

    pub fn finish(&mut self, outcome: ApiResult<()>) -> SubmissionReport {
        match outcome {
            Ok(()) => {
                info!("enrollment form submitted");
                self.state = SubmissionState::Submitted;
                SubmissionReport {
                    outcome: Ok(()),
                    notice: Notice::submitted(),
                    navigate_to: Some(WizardRoute::Submitted),
                }
            }
            Err(error) => {
                warn!(error = %error, "enrollment form submission failed");
                let notice = Notice::for_error(&error);
                self.state = SubmissionState::Failed(error.clone());
                SubmissionReport {
                    outcome: Err(error),
                    notice,
                    navigate_to: None,
                }
            }
        }
    }

    pub fn reset(&mut self) {
        self.state = SubmissionState::Idle;
    }
}

/// Call the gateway, treating an expired `limit` as an unknown failure.
pub async fn submit_with_timeout<G>(
    gateway: &G,
    submission: EnrollmentSubmission,
    limit: Duration,
) -> ApiResult<()>
where
    G: EnrollmentGateway + ?Sized,
{
    match tokio::time::timeout(limit, gateway.submit_enrollment_form(submission)).await {
        Ok(outcome) => outcome,
        Err(elapsed) => Err(ApiError::internal(
            "enrollment submission timed out",
            elapsed,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_is_rejected_while_in_flight_or_done() {
        let mut machine = SubmissionMachine::default();
        machine.begin().expect("idle machine starts");
        assert_eq!(machine.begin(), Err(SubmissionRejected::InFlight));

        machine.finish(Ok(()));
        assert_eq!(machine.state(), &SubmissionState::Submitted);
        assert_eq!(machine.begin(), Err(SubmissionRejected::AlreadySubmitted));
    }

    #[test]
    fn failure_allows_retry() {
        let mut machine = SubmissionMachine::default();
        machine.begin().expect("starts");
        let report = machine.finish(Err(ApiError::Generic));
        assert_eq!(report.notice, Notice::Error(UNKNOWN_ERROR_NOTICE.to_string()));
        assert_eq!(report.navigate_to, None);
        assert_eq!(machine.state(), &SubmissionState::Failed(ApiError::Generic));
        assert!(machine.begin().is_ok());
    }

    #[test]
    fn notices_follow_error_kind() {
        assert_eq!(
            Notice::for_error(&ApiError::UserAlreadyExists).message(),
            ACCOUNT_EXISTS_NOTICE
        );
        assert_eq!(
            Notice::for_error(&ApiError::EnrollmentFormAlreadyExists).message(),
            FORM_EXISTS_NOTICE
        );
        assert_eq!(
            Notice::for_error(&ApiError::Duplicate).message(),
            UNKNOWN_ERROR_NOTICE
        );
    }

    #[test]
    fn state_serializes_with_status_tag() {
        let json = serde_json::to_value(SubmissionState::Failed(ApiError::UserAlreadyExists))
            .expect("serializes");
        assert_eq!(
            json,
            serde_json::json!({ "status": "failed", "error": "user_already_exists" })
        );
    }
}
