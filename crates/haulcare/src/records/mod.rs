//! Persisted collections: users, enrollment forms, program enrollments,
//! screening requests, weekly tracking forms and scheduled meetings.

mod memory;
mod repository;

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::enrollment::domain::{EnrollmentSubmission, ScreeningKind};
use crate::workflows::enrollment::programs::Program;

pub use memory::InMemoryCaseRepository;
pub use repository::{CaseRepository, RepositoryError};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn generate() -> Self {
                Self(format!(concat!($prefix, "-{}"), uuid::Uuid::new_v4().simple()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

record_id!(UserId, "usr");
record_id!(EnrollmentFormId, "enf");
record_id!(ProgramEnrollmentId, "pge");
record_id!(ScreeningRequestId, "scr");
record_id!(HealthyHabitsTrackingFormId, "hht");
record_id!(
    /// Identifier of a meeting booked between staff and a client.
    MeetingId,
    "mtg"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Client,
}

/// A stored account. The password hash never leaves the process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub date_created: DateTime<Utc>,
    pub is_email_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment_form: Option<EnrollmentFormId>,
    #[serde(default)]
    pub program_enrollments: Vec<ProgramEnrollmentId>,
    #[serde(default)]
    pub screening_requests: Vec<ScreeningRequestId>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentFormRecord {
    pub id: EnrollmentFormId,
    pub date_created: DateTime<Utc>,
    pub submission: EnrollmentSubmission,
}

impl EnrollmentFormRecord {
    pub fn email(&self) -> &str {
        self.submission.email()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    Pending,
    Accepted,
    Rejected,
}

impl EnrollmentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            EnrollmentStatus::Pending => "pending",
            EnrollmentStatus::Accepted => "accepted",
            EnrollmentStatus::Rejected => "rejected",
        }
    }
}

/// An applicant's request to join one program, reviewed by staff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramEnrollment {
    pub id: ProgramEnrollmentId,
    pub program: Program,
    pub status: EnrollmentStatus,
    pub email: String,
    pub enrollment_form: EnrollmentFormId,
    pub date_enrolled: DateTime<Utc>,
}

/// Lifecycle of a screening request as recorded by staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScreeningStatus {
    #[serde(rename = "requested")]
    Requested,
    #[serde(rename = "qualified")]
    Qualified,
    #[serde(rename = "not qualified")]
    NotQualified,
    #[serde(rename = "initial positive")]
    InitialPositive,
    #[serde(rename = "true positive")]
    TruePositive,
    #[serde(rename = "false positive")]
    FalsePositive,
    #[serde(rename = "negative")]
    Negative,
}

impl ScreeningStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ScreeningStatus::Requested => "requested",
            ScreeningStatus::Qualified => "qualified",
            ScreeningStatus::NotQualified => "not qualified",
            ScreeningStatus::InitialPositive => "initial positive",
            ScreeningStatus::TruePositive => "true positive",
            ScreeningStatus::FalsePositive => "false positive",
            ScreeningStatus::Negative => "negative",
        }
    }

    /// Statuses reached only after a request was found eligible.
    pub const fn is_qualified(self) -> bool {
        matches!(
            self,
            ScreeningStatus::Qualified
                | ScreeningStatus::InitialPositive
                | ScreeningStatus::TruePositive
                | ScreeningStatus::FalsePositive
                | ScreeningStatus::Negative
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreeningRequest {
    pub id: ScreeningRequestId,
    pub user: UserId,
    pub name: ScreeningKind,
    pub status: ScreeningStatus,
    pub submitted_date: DateTime<Utc>,
}

/// Systolic over diastolic, in mmHg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodPressure {
    pub systolic: u16,
    pub diastolic: u16,
}

impl fmt::Display for BloodPressure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.systolic, self.diastolic)
    }
}

/// One week of self-reported measurements from a Healthy Habits client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthyHabitsTrackingForm {
    pub id: HealthyHabitsTrackingFormId,
    pub user: UserId,
    pub email: String,
    pub week_of_submission: NaiveDate,
    pub health_conditions: String,
    pub devices: String,
    pub weight_lbs: f64,
    pub movement_minutes: u32,
    pub blood_pressure: BloodPressure,
    /// mg/dL
    pub blood_glucose: f64,
    /// Percent.
    pub a1c: f64,
    /// mg/dL
    pub cholesterol: f64,
    pub qualitative_goals: String,
    pub date_created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledMeeting {
    pub id: MeetingId,
    pub client: UserId,
    pub start_time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_prefixed_and_unique() {
        let first = UserId::generate();
        let second = UserId::generate();
        assert!(first.as_str().starts_with("usr-"));
        assert_ne!(first, second);
    }

    #[test]
    fn screening_statuses_use_spaced_names() {
        let json = serde_json::to_value(ScreeningStatus::InitialPositive).expect("serializes");
        assert_eq!(json, serde_json::json!("initial positive"));
        assert!(ScreeningStatus::Negative.is_qualified());
        assert!(!ScreeningStatus::NotQualified.is_qualified());
        assert!(!ScreeningStatus::Requested.is_qualified());
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let user = User {
            id: UserId("usr-1".to_string()),
            first_name: "Lee".to_string(),
            last_name: "Okafor".to_string(),
            email: "lee@example.com".to_string(),
            phone_number: "5550104477".to_string(),
            password_hash: "$2b$04$secret".to_string(),
            role: Role::Client,
            date_created: Utc::now(),
            is_email_verified: false,
            enrollment_form: None,
            program_enrollments: Vec::new(),
            screening_requests: Vec::new(),
        };
        let json = serde_json::to_string(&user).expect("serializes");
        assert!(!json.contains("secret"));
        assert!(json.contains("\"role\":\"client\""));
    }
}
