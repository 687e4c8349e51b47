use std::sync::Arc;

use chrono::Utc;

use super::common::*;

use crate::outcome::{ApiError, Resource};
use crate::records::{
    CaseRepository, EnrollmentFormId, EnrollmentFormRecord, EnrollmentStatus,
    InMemoryCaseRepository, ProgramEnrollment, ProgramEnrollmentId,
};
use crate::workflows::enrollment::domain::EnrollmentSubmission;
use crate::workflows::enrollment::programs::Program;
use crate::workflows::enrollment::service::EnrollmentService;
use crate::workflows::enrollment::submission::EnrollmentGateway;

fn service() -> (Arc<InMemoryCaseRepository>, EnrollmentService<InMemoryCaseRepository>) {
    let repository = Arc::new(InMemoryCaseRepository::new());
    (Arc::clone(&repository), EnrollmentService::new(repository))
}

#[test]
fn submit_stores_form_and_pending_enrollments() {
    let (repository, service) = service();

    let record = service.submit(submission()).expect("form stored");

    assert_eq!(record.email(), "marcus.hale@example.org");
    let enrollments = repository.program_enrollments().expect("enrollments load");
    let mut programs: Vec<Program> = enrollments.iter().map(|e| e.program).collect();
    programs.sort();
    assert_eq!(programs, vec![Program::HealthyHabits, Program::RigsWithoutCigs]);
    assert!(enrollments
        .iter()
        .all(|e| e.status == EnrollmentStatus::Pending && e.enrollment_form == record.id));
    assert!(repository.users().expect("users load").is_empty());
}

#[test]
fn stored_form_reads_back_field_for_field() {
    let (_, service) = service();
    let original = submission();

    let wire = serde_json::to_string(&original).expect("submission serializes");
    let decoded: EnrollmentSubmission = serde_json::from_str(&wire).expect("submission decodes");
    service.submit(decoded).expect("form stored");

    let stored = service
        .get_enrollment_form_by_email("marcus.hale@example.org")
        .expect("form found");
    assert_eq!(stored.submission, original);
}

#[test]
fn failed_enrollment_insert_stores_no_form() {
    let (repository, service) = service();
    let taken = ProgramEnrollmentId("pge-taken".to_string());
    let enrollment = |form: &EnrollmentFormId| ProgramEnrollment {
        id: taken.clone(),
        program: Program::HealthyHabits,
        status: EnrollmentStatus::Pending,
        email: "marcus.hale@example.org".to_string(),
        enrollment_form: form.clone(),
        date_enrolled: Utc::now(),
    };
    let placeholder = EnrollmentFormId::generate();
    repository
        .insert_program_enrollments(vec![enrollment(&placeholder)])
        .expect("enrollment seeded");

    let form_id = EnrollmentFormId::generate();
    let record = EnrollmentFormRecord {
        id: form_id.clone(),
        date_created: Utc::now(),
        submission: submission(),
    };
    assert!(repository
        .insert_enrollment_form(record, vec![enrollment(&form_id)])
        .is_err());
    assert!(repository
        .find_enrollment_form_by_email("marcus.hale@example.org")
        .expect("lookup")
        .is_none());

    let record = service.submit(submission()).expect("retry stores the form");
    let opened = repository
        .program_enrollments()
        .expect("enrollments load")
        .into_iter()
        .filter(|enrollment| enrollment.enrollment_form == record.id)
        .count();
    assert_eq!(opened, 2);
}

#[test]
fn second_form_for_same_email_is_rejected() {
    let (_, service) = service();
    service.submit(submission()).expect("first form stored");

    let err = service.submit(submission()).expect_err("duplicate form");
    assert_eq!(err, ApiError::EnrollmentFormAlreadyExists);
}

#[test]
fn existing_account_blocks_submission() {
    let (repository, service) = service();
    repository
        .insert_user(client("Marcus.Hale@example.org"))
        .expect("user stored");

    let err = service.submit(submission()).expect_err("account exists");
    assert_eq!(err, ApiError::UserAlreadyExists);
}

#[test]
fn existing_form_wins_over_existing_account() {
    let (repository, service) = service();
    service.submit(submission()).expect("first form stored");
    repository
        .insert_user(client("marcus.hale@example.org"))
        .expect("user stored");

    let err = service.submit(submission()).expect_err("duplicate");
    assert_eq!(err, ApiError::EnrollmentFormAlreadyExists);
}

#[test]
fn offline_repository_is_a_generic_error() {
    let (repository, service) = service();
    repository.set_offline(true);

    let err = service.submit(submission()).expect_err("repository offline");
    assert_eq!(err, ApiError::Generic);
}

#[tokio::test]
async fn gateway_maps_service_outcome() {
    let (_, service) = service();
    assert_eq!(service.submit_enrollment_form(submission()).await, Ok(()));
    assert_eq!(
        service.submit_enrollment_form(submission()).await,
        Err(ApiError::EnrollmentFormAlreadyExists)
    );
}

#[test]
fn lookup_by_email_reports_not_found() {
    let (_, service) = service();
    assert_eq!(
        service.get_enrollment_form_by_email("nobody@example.org"),
        Err(ApiError::NotFound(Resource::EnrollmentForm))
    );
    service.submit(submission()).expect("form stored");
    assert!(service
        .get_enrollment_form_by_email("marcus.hale@example.org")
        .is_ok());
}

#[test]
fn accepting_an_enrollment_links_the_account() {
    let (repository, service) = service();
    let record = service.submit(submission()).expect("form stored");
    let user = repository
        .insert_user(client("marcus.hale@example.org"))
        .expect("user stored");

    let pending = service
        .program_enrollments(Some(Program::RigsWithoutCigs), Some(EnrollmentStatus::Pending))
        .expect("enrollments load");
    assert_eq!(pending.len(), 1);

    let accepted = service
        .update_program_enrollment_status(&pending[0].id, EnrollmentStatus::Accepted)
        .expect("status updated");
    assert_eq!(accepted.status, EnrollmentStatus::Accepted);

    let linked = repository
        .find_user(&user.id)
        .expect("user loads")
        .expect("user exists");
    assert_eq!(linked.program_enrollments, vec![accepted.id.clone()]);
    assert_eq!(linked.enrollment_form, Some(record.id));

    assert!(service
        .program_enrollments(None, Some(EnrollmentStatus::Pending))
        .expect("enrollments load")
        .iter()
        .all(|e| e.program == Program::HealthyHabits));
}

#[test]
fn updating_unknown_enrollment_is_not_found() {
    let (_, service) = service();
    let err = service
        .update_program_enrollment_status(
            &ProgramEnrollmentId("pge-missing".to_string()),
            EnrollmentStatus::Rejected,
        )
        .expect_err("unknown enrollment");
    assert_eq!(err, ApiError::NotFound(Resource::ProgramEnrollment));
}
