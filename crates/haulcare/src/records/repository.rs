use chrono::{DateTime, Utc};

use super::{
    EnrollmentFormId, EnrollmentFormRecord, HealthyHabitsTrackingForm,
    HealthyHabitsTrackingFormId, ProgramEnrollment, ProgramEnrollmentId, ScheduledMeeting,
    ScreeningRequest, ScreeningRequestId, User, UserId,
};

/// Storage abstraction over the case-management collections.
///
/// Emails are compared case-insensitively; inserting a user or enrollment
/// form whose email is already present fails with [`RepositoryError::Conflict`].
pub trait CaseRepository: Send + Sync {
    fn insert_user(&self, user: User) -> Result<User, RepositoryError>;
    fn update_user(&self, user: User) -> Result<(), RepositoryError>;
    fn find_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;
    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;
    fn users(&self) -> Result<Vec<User>, RepositoryError>;

    /// Store a form together with the enrollments it opens; on failure
    /// neither is stored.
    fn insert_enrollment_form(
        &self,
        form: EnrollmentFormRecord,
        enrollments: Vec<ProgramEnrollment>,
    ) -> Result<EnrollmentFormRecord, RepositoryError>;
    fn find_enrollment_form(
        &self,
        id: &EnrollmentFormId,
    ) -> Result<Option<EnrollmentFormRecord>, RepositoryError>;
    fn find_enrollment_form_by_email(
        &self,
        email: &str,
    ) -> Result<Option<EnrollmentFormRecord>, RepositoryError>;

    fn insert_program_enrollments(
        &self,
        enrollments: Vec<ProgramEnrollment>,
    ) -> Result<(), RepositoryError>;
    fn update_program_enrollment(&self, enrollment: ProgramEnrollment)
        -> Result<(), RepositoryError>;
    fn find_program_enrollment(
        &self,
        id: &ProgramEnrollmentId,
    ) -> Result<Option<ProgramEnrollment>, RepositoryError>;
    fn program_enrollments(&self) -> Result<Vec<ProgramEnrollment>, RepositoryError>;

    fn insert_screening_request(
        &self,
        request: ScreeningRequest,
    ) -> Result<ScreeningRequest, RepositoryError>;
    fn update_screening_request(
        &self,
        request: ScreeningRequest,
    ) -> Result<ScreeningRequest, RepositoryError>;
    fn delete_screening_request(
        &self,
        id: &ScreeningRequestId,
    ) -> Result<ScreeningRequest, RepositoryError>;
    fn screening_requests(&self) -> Result<Vec<ScreeningRequest>, RepositoryError>;

    fn insert_healthy_habits_tracking_form(
        &self,
        form: HealthyHabitsTrackingForm,
    ) -> Result<HealthyHabitsTrackingForm, RepositoryError>;
    fn find_healthy_habits_tracking_form(
        &self,
        id: &HealthyHabitsTrackingFormId,
    ) -> Result<Option<HealthyHabitsTrackingForm>, RepositoryError>;
    fn delete_healthy_habits_tracking_form(
        &self,
        id: &HealthyHabitsTrackingFormId,
    ) -> Result<HealthyHabitsTrackingForm, RepositoryError>;
    fn healthy_habits_tracking_forms(
        &self,
    ) -> Result<Vec<HealthyHabitsTrackingForm>, RepositoryError>;

    fn insert_meeting(&self, meeting: ScheduledMeeting) -> Result<(), RepositoryError>;
    /// Meetings starting in `[start, end)`.
    fn meetings_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ScheduledMeeting>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
