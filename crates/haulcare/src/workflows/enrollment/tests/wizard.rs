use std::sync::Arc;
use std::time::Duration;

use super::common::*;

use crate::outcome::ApiError;
use crate::workflows::enrollment::domain::{EnrollmentForm, ProgramSelectionSection};
use crate::workflows::enrollment::submission::{
    Notice, SubmissionRejected, SubmissionState, WizardRoute, ACCOUNT_EXISTS_NOTICE,
    FORM_EXISTS_NOTICE, SUBMITTED_NOTICE, UNKNOWN_ERROR_NOTICE,
};
use crate::workflows::enrollment::validation::{GeneralInformationDraft, ProgramSpecificQuestionsDraft};
use crate::workflows::enrollment::wizard::{EnrollmentWizard, FinalStep, StepOutcome};

fn wizard<G>(gateway: Arc<G>) -> EnrollmentWizard<G>
where
    G: crate::workflows::enrollment::submission::EnrollmentGateway,
{
    EnrollmentWizard::new(gateway, TIMEOUT)
}

#[test]
fn skipping_ahead_redirects_to_general_information() {
    let mut wizard = wizard(Arc::new(RecordingGateway::default()));

    let outcome = wizard.submit_program_selection(healthy_habits_only());

    assert_eq!(
        outcome,
        StepOutcome::Redirect {
            to: WizardRoute::GeneralInformation
        }
    );
    assert_eq!(wizard.store().form(), &EnrollmentForm::default());
    assert_eq!(wizard.current_route(), WizardRoute::GeneralInformation);
}

#[test]
fn invalid_section_is_not_stored() {
    let mut wizard = wizard(Arc::new(RecordingGateway::default()));
    let draft = GeneralInformationDraft {
        zip_code: Some("ABCDE".to_string()),
        ..general_information()
    };

    let outcome = wizard.submit_general_information_on(draft, today());

    match outcome {
        StepOutcome::Invalid { errors } => assert!(errors.has_field("zip_code")),
        other => panic!("expected invalid outcome, got {other:?}"),
    }
    assert!(wizard.store().form().general_information_section.is_none());
    assert_eq!(wizard.current_route(), WizardRoute::GeneralInformation);
}

#[test]
fn valid_sections_advance_in_order() {
    let mut wizard = wizard(Arc::new(RecordingGateway::default()));

    assert_eq!(
        wizard.submit_general_information_on(general_information(), today()),
        StepOutcome::Advanced {
            next: WizardRoute::QualifyingQuestions
        }
    );
    assert_eq!(
        wizard.submit_qualifying_questions(qualifying_questions()),
        StepOutcome::Advanced {
            next: WizardRoute::ProgramSelection
        }
    );
    match wizard.submit_program_selection(ProgramSelectionSection::default()) {
        StepOutcome::Invalid { errors } => assert!(errors.has_field("program_selection")),
        other => panic!("expected invalid outcome, got {other:?}"),
    }
    assert_eq!(
        wizard.submit_program_selection(healthy_habits_only()),
        StepOutcome::Advanced {
            next: WizardRoute::ProgramSpecificQuestions
        }
    );
    assert_eq!(wizard.current_route(), WizardRoute::ProgramSpecificQuestions);
}

#[tokio::test]
async fn completing_the_form_submits_exactly_once() {
    let gateway = Arc::new(RecordingGateway::default());
    let mut wizard = wizard(Arc::clone(&gateway));
    complete_leading_sections(&mut wizard, healthy_habits_and_rigs());

    let outcome = wizard.submit_program_specific_questions(program_answers()).await;

    let StepOutcome::Submission { report } = outcome else {
        panic!("expected a submission report");
    };
    assert_eq!(report.outcome, Ok(()));
    assert_eq!(report.notice, Notice::Success(SUBMITTED_NOTICE.to_string()));
    assert_eq!(report.navigate_to, Some(WizardRoute::Submitted));
    assert_eq!(gateway.calls(), 1);
    assert_eq!(wizard.submission_state(), &SubmissionState::Submitted);
    assert_eq!(wizard.current_route(), WizardRoute::Submitted);

    let received = gateway.received();
    assert_eq!(received[0].email(), "marcus.hale@example.org");
    assert!(received[0]
        .program_specific_questions_section
        .rigs_without_cigs
        .is_some());

    let again = wizard.submit_program_specific_questions(program_answers()).await;
    assert_eq!(
        again,
        StepOutcome::Rejected {
            reason: SubmissionRejected::AlreadySubmitted
        }
    );
    assert_eq!(gateway.calls(), 1);
}

#[tokio::test]
async fn confirmation_clears_the_form_once() {
    let gateway = Arc::new(RecordingGateway::default());
    let mut wizard = wizard(Arc::clone(&gateway));
    complete_leading_sections(&mut wizard, healthy_habits_only());
    wizard.submit_program_specific_questions(program_answers()).await;

    assert!(wizard.store().completed_sections().all_completed());
    assert!(wizard.confirmation_mounted());
    assert_eq!(wizard.store().form(), &EnrollmentForm::default());
    assert_eq!(wizard.submission_state(), &SubmissionState::Idle);
    assert_eq!(wizard.current_route(), WizardRoute::GeneralInformation);

    assert!(!wizard.confirmation_mounted());
}

#[test]
fn second_edge_while_in_flight_is_rejected() {
    let gateway = Arc::new(RecordingGateway::default());
    let mut wizard = wizard(Arc::clone(&gateway));
    complete_leading_sections(&mut wizard, healthy_habits_only());

    let first = wizard.begin_submission(program_answers());
    assert!(matches!(first, FinalStep::Submit(_)));
    assert_eq!(wizard.submission_state(), &SubmissionState::Submitting);

    match wizard.begin_submission(program_answers()) {
        FinalStep::Done(StepOutcome::Rejected { reason }) => {
            assert_eq!(reason, SubmissionRejected::InFlight)
        }
        other => panic!("expected in-flight rejection, got {other:?}"),
    }
    assert_eq!(gateway.calls(), 0);
}

#[test]
fn rejected_edge_leaves_stored_answers_untouched() {
    let gateway = Arc::new(RecordingGateway::default());
    let mut wizard = wizard(Arc::clone(&gateway));
    complete_leading_sections(&mut wizard, healthy_habits_and_rigs());

    let FinalStep::Submit(in_flight) = wizard.begin_submission(program_answers()) else {
        panic!("expected the first edge to submit");
    };
    let before = wizard.store().form().clone();

    let mut changed = program_answers();
    if let Some(rigs) = changed.rigs_without_cigs.as_mut() {
        rigs.reason_for_quitting = Some("Changed while in flight".to_string());
    }
    assert!(matches!(
        wizard.begin_submission(changed),
        FinalStep::Done(StepOutcome::Rejected {
            reason: SubmissionRejected::InFlight
        })
    ));

    assert_eq!(wizard.store().form(), &before);
    let stored_reason = wizard
        .store()
        .form()
        .program_specific_questions_section
        .rigs_without_cigs
        .as_ref()
        .map(|rigs| rigs.reason_for_quitting.clone());
    assert_eq!(stored_reason.as_deref(), Some("Grandkids"));
    assert_eq!(
        in_flight
            .program_specific_questions_section
            .rigs_without_cigs
            .map(|rigs| rigs.reason_for_quitting),
        stored_reason
    );
}

#[tokio::test]
async fn existing_account_keeps_the_form_for_another_try() {
    let gateway = Arc::new(FailingGateway::always(ApiError::UserAlreadyExists));
    let mut wizard = wizard(Arc::clone(&gateway));
    complete_leading_sections(&mut wizard, healthy_habits_only());

    let StepOutcome::Submission { report } =
        wizard.submit_program_specific_questions(program_answers()).await
    else {
        panic!("expected a submission report");
    };

    assert_eq!(report.outcome, Err(ApiError::UserAlreadyExists));
    assert_eq!(report.notice, Notice::Error(ACCOUNT_EXISTS_NOTICE.to_string()));
    assert_eq!(report.navigate_to, None);
    assert!(wizard.store().completed_sections().all_completed());
    assert!(wizard.store().form().general_information_section.is_some());
    assert!(!wizard.confirmation_mounted());
    assert!(wizard.store().form().general_information_section.is_some());
}

#[tokio::test]
async fn existing_form_has_its_own_notice() {
    let gateway = Arc::new(FailingGateway::always(ApiError::EnrollmentFormAlreadyExists));
    let mut wizard = wizard(gateway);
    complete_leading_sections(&mut wizard, healthy_habits_only());

    let StepOutcome::Submission { report } =
        wizard.submit_program_specific_questions(program_answers()).await
    else {
        panic!("expected a submission report");
    };
    assert_eq!(report.notice, Notice::Error(FORM_EXISTS_NOTICE.to_string()));
}

#[tokio::test]
async fn failed_submission_can_be_retried() {
    let gateway = Arc::new(FailingGateway::times(ApiError::Generic, 1));
    let mut wizard = wizard(Arc::clone(&gateway));
    complete_leading_sections(&mut wizard, healthy_habits_only());

    let StepOutcome::Submission { report } =
        wizard.submit_program_specific_questions(program_answers()).await
    else {
        panic!("expected a submission report");
    };
    assert_eq!(report.notice, Notice::Error(UNKNOWN_ERROR_NOTICE.to_string()));
    assert_eq!(
        wizard.submission_state(),
        &SubmissionState::Failed(ApiError::Generic)
    );

    let StepOutcome::Submission { report } =
        wizard.submit_program_specific_questions(program_answers()).await
    else {
        panic!("expected a submission report");
    };
    assert_eq!(report.outcome, Ok(()));
    assert_eq!(gateway.calls(), 2);
}

#[tokio::test]
async fn invalid_final_section_never_reaches_the_gateway() {
    let gateway = Arc::new(RecordingGateway::default());
    let mut wizard = wizard(Arc::clone(&gateway));
    complete_leading_sections(&mut wizard, healthy_habits_and_rigs());

    let draft = ProgramSpecificQuestionsDraft {
        rigs_without_cigs: None,
        ..program_answers()
    };
    match wizard.submit_program_specific_questions(draft).await {
        StepOutcome::Invalid { errors } => assert!(errors.has_field("rigs_without_cigs")),
        other => panic!("expected invalid outcome, got {other:?}"),
    }
    assert_eq!(gateway.calls(), 0);
    assert_eq!(wizard.submission_state(), &SubmissionState::Idle);
    assert!(!wizard.store().completed_sections().all_completed());
}

#[tokio::test]
async fn stalled_gateway_times_out_as_unknown_error() {
    let mut wizard = EnrollmentWizard::new(Arc::new(StalledGateway), Duration::from_millis(20));
    complete_leading_sections(&mut wizard, healthy_habits_only());

    let StepOutcome::Submission { report } =
        wizard.submit_program_specific_questions(program_answers()).await
    else {
        panic!("expected a submission report");
    };
    assert_eq!(report.outcome, Err(ApiError::Generic));
    assert_eq!(report.notice, Notice::Error(UNKNOWN_ERROR_NOTICE.to_string()));
    assert!(wizard.store().completed_sections().all_completed());
}
