use serde::Serialize;

use crate::records::{ProgramEnrollment, Role, ScreeningRequest, User};

/// Collections that can be downloaded as CSV.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportCollection {
    Users,
    ProgramEnrollments,
    ScreeningRequests,
}

impl ExportCollection {
    pub fn from_path(segment: &str) -> Option<Self> {
        match segment {
            "users" => Some(ExportCollection::Users),
            "programenrollments" => Some(ExportCollection::ProgramEnrollments),
            "screeningrequests" => Some(ExportCollection::ScreeningRequests),
            _ => None,
        }
    }

    pub const fn file_name(self) -> &'static str {
        match self {
            ExportCollection::Users => "users.csv",
            ExportCollection::ProgramEnrollments => "programenrollments.csv",
            ExportCollection::ScreeningRequests => "screeningrequests.csv",
        }
    }
}

#[derive(Serialize)]
struct UserRow<'a> {
    id: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    email: &'a str,
    phone_number: &'a str,
    role: &'static str,
    date_created: String,
    is_email_verified: bool,
    program_enrollment_count: usize,
}

#[derive(Serialize)]
struct ProgramEnrollmentRow<'a> {
    id: &'a str,
    program: &'static str,
    status: &'static str,
    email: &'a str,
    enrollment_form: &'a str,
    date_enrolled: String,
}

#[derive(Serialize)]
struct ScreeningRequestRow<'a> {
    id: &'a str,
    user: &'a str,
    screening: &'static str,
    status: &'static str,
    submitted_date: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("csv buffer: {0}")]
    Buffer(String),
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

fn write_rows<T: Serialize>(rows: impl IntoIterator<Item = T>) -> Result<String, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Buffer(err.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

pub fn users_csv(users: &[User]) -> Result<String, ExportError> {
    write_rows(users.iter().map(|user| UserRow {
        id: user.id.as_str(),
        first_name: &user.first_name,
        last_name: &user.last_name,
        email: &user.email,
        phone_number: &user.phone_number,
        role: match user.role {
            Role::Admin => "admin",
            Role::Client => "client",
        },
        date_created: user.date_created.to_rfc3339(),
        is_email_verified: user.is_email_verified,
        program_enrollment_count: user.program_enrollments.len(),
    }))
}

pub fn program_enrollments_csv(enrollments: &[ProgramEnrollment]) -> Result<String, ExportError> {
    write_rows(enrollments.iter().map(|enrollment| ProgramEnrollmentRow {
        id: enrollment.id.as_str(),
        program: enrollment.program.label(),
        status: enrollment.status.label(),
        email: &enrollment.email,
        enrollment_form: enrollment.enrollment_form.as_str(),
        date_enrolled: enrollment.date_enrolled.to_rfc3339(),
    }))
}

pub fn screening_requests_csv(requests: &[ScreeningRequest]) -> Result<String, ExportError> {
    write_rows(requests.iter().map(|request| ScreeningRequestRow {
        id: request.id.as_str(),
        user: request.user.as_str(),
        screening: request.name.label(),
        status: request.status.label(),
        submitted_date: request.submitted_date.to_rfc3339(),
    }))
}
