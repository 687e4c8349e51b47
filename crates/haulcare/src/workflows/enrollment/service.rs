use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{info, warn};

use super::applications::PendingApplication;
use super::domain::EnrollmentSubmission;
use super::programs::Program;
use super::submission::EnrollmentGateway;
use crate::outcome::{ApiError, ApiResult, Resource};
use crate::records::{
    CaseRepository, EnrollmentFormId, EnrollmentFormRecord, EnrollmentStatus, ProgramEnrollment,
    ProgramEnrollmentId, RepositoryError,
};

/// Record boundary for enrollment forms and the program enrollments they open.
pub struct EnrollmentService<R> {
    repository: Arc<R>,
}

impl<R> EnrollmentService<R>
where
    R: CaseRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Store a completed form and one pending enrollment per opted-in program.
    ///
    /// An existing form for the email wins over an existing account.
    pub fn submit(&self, submission: EnrollmentSubmission) -> ApiResult<EnrollmentFormRecord> {
        let email = submission.email().to_string();

        let existing_form = self
            .repository
            .find_enrollment_form_by_email(&email)
            .map_err(|err| ApiError::internal("failed to look up enrollment form", err))?;
        if existing_form.is_some() {
            return Err(ApiError::EnrollmentFormAlreadyExists);
        }

        let existing_user = self
            .repository
            .find_user_by_email(&email)
            .map_err(|err| ApiError::internal("failed to look up user", err))?;
        if existing_user.is_some() {
            return Err(ApiError::UserAlreadyExists);
        }

        let now = Utc::now();
        let programs = submission.opted_in_programs();
        let form_id = EnrollmentFormId::generate();
        let enrollments: Vec<ProgramEnrollment> = programs
            .iter()
            .map(|program| ProgramEnrollment {
                id: ProgramEnrollmentId::generate(),
                program: *program,
                status: EnrollmentStatus::Pending,
                email: email.clone(),
                enrollment_form: form_id.clone(),
                date_enrolled: now,
            })
            .collect();
        let record = EnrollmentFormRecord {
            id: form_id,
            date_created: now,
            submission,
        };
        let stored = self
            .repository
            .insert_enrollment_form(record, enrollments)
            .map_err(|err| match err {
                RepositoryError::Conflict => ApiError::EnrollmentFormAlreadyExists,
                other => ApiError::internal("failed to store enrollment form", other),
            })?;

        info!(
            form_id = %stored.id,
            programs = programs.len(),
            "enrollment form stored"
        );
        Ok(stored)
    }

    pub fn get_enrollment_form_by_email(&self, email: &str) -> ApiResult<EnrollmentFormRecord> {
        self.repository
            .find_enrollment_form_by_email(email)
            .map_err(|err| ApiError::internal("failed to look up enrollment form", err))?
            .ok_or(ApiError::NotFound(Resource::EnrollmentForm))
    }

    /// Enrollments filtered by program and status, oldest first.
    pub fn program_enrollments(
        &self,
        program: Option<Program>,
        status: Option<EnrollmentStatus>,
    ) -> ApiResult<Vec<ProgramEnrollment>> {
        let mut enrollments: Vec<ProgramEnrollment> = self
            .repository
            .program_enrollments()
            .map_err(|err| ApiError::internal("failed to load program enrollments", err))?
            .into_iter()
            .filter(|enrollment| program.map_or(true, |wanted| enrollment.program == wanted))
            .filter(|enrollment| status.map_or(true, |wanted| enrollment.status == wanted))
            .collect();
        enrollments.sort_by_key(|enrollment| enrollment.date_enrolled);
        Ok(enrollments)
    }

    /// Pending enrollments joined with the applicant's name and phone number,
    /// filtered by a case-insensitive search over names, phone and email.
    pub fn pending_applications(
        &self,
        program: Option<Program>,
        search: &str,
    ) -> ApiResult<Vec<PendingApplication>> {
        let needle = search.trim().to_lowercase();
        let mut applications = Vec::new();
        for enrollment in self.program_enrollments(program, Some(EnrollmentStatus::Pending))? {
            let form = self
                .repository
                .find_enrollment_form(&enrollment.enrollment_form)
                .map_err(|err| ApiError::internal("failed to look up enrollment form", err))?;
            let Some(form) = form else {
                warn!(enrollment_id = %enrollment.id, "pending enrollment has no form");
                continue;
            };
            let general = &form.submission.general_information_section;
            let application = PendingApplication {
                first_name: general.first_name.clone(),
                last_name: general.last_name.clone(),
                phone_number: general.phone_number.clone(),
                enrollment,
            };
            if needle.is_empty() || application.matches(&needle) {
                applications.push(application);
            }
        }
        Ok(applications)
    }

    /// Change an enrollment's status, linking accepted enrollments to the
    /// applicant's account when one exists.
    pub fn update_program_enrollment_status(
        &self,
        id: &ProgramEnrollmentId,
        status: EnrollmentStatus,
    ) -> ApiResult<ProgramEnrollment> {
        let mut enrollment = self
            .repository
            .find_program_enrollment(id)
            .map_err(|err| ApiError::internal("failed to look up program enrollment", err))?
            .ok_or(ApiError::NotFound(Resource::ProgramEnrollment))?;
        enrollment.status = status;
        self.repository
            .update_program_enrollment(enrollment.clone())
            .map_err(|err| {
                ApiError::from_repository(
                    "failed to update program enrollment",
                    Resource::ProgramEnrollment,
                    err,
                )
            })?;

        if status == EnrollmentStatus::Accepted {
            let user = self
                .repository
                .find_user_by_email(&enrollment.email)
                .map_err(|err| ApiError::internal("failed to look up user", err))?;
            if let Some(mut user) = user {
                if !user.program_enrollments.contains(&enrollment.id) {
                    user.program_enrollments.push(enrollment.id.clone());
                    user.enrollment_form = Some(enrollment.enrollment_form.clone());
                    self.repository.update_user(user).map_err(|err| {
                        ApiError::from_repository("failed to link enrollment", Resource::User, err)
                    })?;
                }
            }
        }

        info!(enrollment_id = %enrollment.id, status = status.label(), "program enrollment updated");
        Ok(enrollment)
    }
}

#[async_trait]
impl<R> EnrollmentGateway for EnrollmentService<R>
where
    R: CaseRepository + 'static,
{
    async fn submit_enrollment_form(&self, submission: EnrollmentSubmission) -> ApiResult<()> {
        self.submit(submission).map(|_| ())
    }
}
