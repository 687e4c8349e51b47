use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use super::{
    CaseRepository, EnrollmentFormId, EnrollmentFormRecord, HealthyHabitsTrackingForm,
    HealthyHabitsTrackingFormId, MeetingId, ProgramEnrollment, ProgramEnrollmentId,
    RepositoryError, ScheduledMeeting, ScreeningRequest, ScreeningRequestId, User, UserId,
};

#[derive(Default)]
struct Collections {
    users: BTreeMap<UserId, User>,
    enrollment_forms: BTreeMap<EnrollmentFormId, EnrollmentFormRecord>,
    program_enrollments: BTreeMap<ProgramEnrollmentId, ProgramEnrollment>,
    screening_requests: BTreeMap<ScreeningRequestId, ScreeningRequest>,
    tracking_forms: BTreeMap<HealthyHabitsTrackingFormId, HealthyHabitsTrackingForm>,
    meetings: BTreeMap<MeetingId, ScheduledMeeting>,
}

/// Process-local repository used by the API service, the demo and tests.
///
/// [`InMemoryCaseRepository::set_offline`] makes every call fail with
/// [`RepositoryError::Unavailable`], standing in for a lost database.
#[derive(Default)]
pub struct InMemoryCaseRepository {
    collections: Mutex<Collections>,
    offline: AtomicBool,
}

impl InMemoryCaseRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, RepositoryError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("repository offline".to_string()));
        }
        self.collections
            .lock()
            .map_err(|_| RepositoryError::Unavailable("repository lock poisoned".to_string()))
    }
}

fn same_email(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

impl CaseRepository for InMemoryCaseRepository {
    fn insert_user(&self, user: User) -> Result<User, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.users.contains_key(&user.id)
            || guard
                .users
                .values()
                .any(|existing| same_email(&existing.email, &user.email))
        {
            return Err(RepositoryError::Conflict);
        }
        guard.users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    fn update_user(&self, user: User) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        match guard.users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn find_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.lock()?.users.get(id).cloned())
    }

    fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|user| same_email(&user.email, email))
            .cloned())
    }

    fn users(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.lock()?.users.values().cloned().collect())
    }

    fn insert_enrollment_form(
        &self,
        form: EnrollmentFormRecord,
        enrollments: Vec<ProgramEnrollment>,
    ) -> Result<EnrollmentFormRecord, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.enrollment_forms.contains_key(&form.id)
            || guard
                .enrollment_forms
                .values()
                .any(|existing| same_email(existing.email(), form.email()))
            || enrollments
                .iter()
                .any(|enrollment| guard.program_enrollments.contains_key(&enrollment.id))
        {
            return Err(RepositoryError::Conflict);
        }
        guard.enrollment_forms.insert(form.id.clone(), form.clone());
        for enrollment in enrollments {
            guard
                .program_enrollments
                .insert(enrollment.id.clone(), enrollment);
        }
        Ok(form)
    }

    fn find_enrollment_form(
        &self,
        id: &EnrollmentFormId,
    ) -> Result<Option<EnrollmentFormRecord>, RepositoryError> {
        Ok(self.lock()?.enrollment_forms.get(id).cloned())
    }

    fn find_enrollment_form_by_email(
        &self,
        email: &str,
    ) -> Result<Option<EnrollmentFormRecord>, RepositoryError> {
        Ok(self
            .lock()?
            .enrollment_forms
            .values()
            .find(|form| same_email(form.email(), email))
            .cloned())
    }

    fn insert_program_enrollments(
        &self,
        enrollments: Vec<ProgramEnrollment>,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        if enrollments
            .iter()
            .any(|enrollment| guard.program_enrollments.contains_key(&enrollment.id))
        {
            return Err(RepositoryError::Conflict);
        }
        for enrollment in enrollments {
            guard
                .program_enrollments
                .insert(enrollment.id.clone(), enrollment);
        }
        Ok(())
    }

    fn update_program_enrollment(
        &self,
        enrollment: ProgramEnrollment,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        match guard.program_enrollments.get_mut(&enrollment.id) {
            Some(existing) => {
                *existing = enrollment;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn find_program_enrollment(
        &self,
        id: &ProgramEnrollmentId,
    ) -> Result<Option<ProgramEnrollment>, RepositoryError> {
        Ok(self.lock()?.program_enrollments.get(id).cloned())
    }

    fn program_enrollments(&self) -> Result<Vec<ProgramEnrollment>, RepositoryError> {
        Ok(self.lock()?.program_enrollments.values().cloned().collect())
    }

    fn insert_screening_request(
        &self,
        request: ScreeningRequest,
    ) -> Result<ScreeningRequest, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.screening_requests.contains_key(&request.id) {
            return Err(RepositoryError::Conflict);
        }
        guard
            .screening_requests
            .insert(request.id.clone(), request.clone());
        Ok(request)
    }

    fn update_screening_request(
        &self,
        request: ScreeningRequest,
    ) -> Result<ScreeningRequest, RepositoryError> {
        let mut guard = self.lock()?;
        match guard.screening_requests.get_mut(&request.id) {
            Some(existing) => {
                *existing = request.clone();
                Ok(request)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn delete_screening_request(
        &self,
        id: &ScreeningRequestId,
    ) -> Result<ScreeningRequest, RepositoryError> {
        self.lock()?
            .screening_requests
            .remove(id)
            .ok_or(RepositoryError::NotFound)
    }

    fn screening_requests(&self) -> Result<Vec<ScreeningRequest>, RepositoryError> {
        Ok(self.lock()?.screening_requests.values().cloned().collect())
    }

    fn insert_healthy_habits_tracking_form(
        &self,
        form: HealthyHabitsTrackingForm,
    ) -> Result<HealthyHabitsTrackingForm, RepositoryError> {
        let mut guard = self.lock()?;
        if guard.tracking_forms.contains_key(&form.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.tracking_forms.insert(form.id.clone(), form.clone());
        Ok(form)
    }

    fn find_healthy_habits_tracking_form(
        &self,
        id: &HealthyHabitsTrackingFormId,
    ) -> Result<Option<HealthyHabitsTrackingForm>, RepositoryError> {
        Ok(self.lock()?.tracking_forms.get(id).cloned())
    }

    fn delete_healthy_habits_tracking_form(
        &self,
        id: &HealthyHabitsTrackingFormId,
    ) -> Result<HealthyHabitsTrackingForm, RepositoryError> {
        self.lock()?
            .tracking_forms
            .remove(id)
            .ok_or(RepositoryError::NotFound)
    }

    fn healthy_habits_tracking_forms(
        &self,
    ) -> Result<Vec<HealthyHabitsTrackingForm>, RepositoryError> {
        Ok(self.lock()?.tracking_forms.values().cloned().collect())
    }

    fn insert_meeting(&self, meeting: ScheduledMeeting) -> Result<(), RepositoryError> {
        let mut guard = self.lock()?;
        if guard.meetings.contains_key(&meeting.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.meetings.insert(meeting.id.clone(), meeting);
        Ok(())
    }

    fn meetings_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ScheduledMeeting>, RepositoryError> {
        let mut meetings: Vec<ScheduledMeeting> = self
            .lock()?
            .meetings
            .values()
            .filter(|meeting| meeting.start_time >= start && meeting.start_time < end)
            .cloned()
            .collect();
        meetings.sort_by_key(|meeting| meeting.start_time);
        Ok(meetings)
    }
}
