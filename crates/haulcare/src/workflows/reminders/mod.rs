//! Daily meeting reminder emails.

pub mod router;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::outcome::{ApiError, ApiResult};
use crate::records::{CaseRepository, ScheduledMeeting, User};

pub use router::{reminders_router, ReminderState, API_KEY_HEADER};

/// Outbound email transport for reminders.
#[async_trait]
pub trait ReminderMailer: Send + Sync {
    async fn send_meeting_reminder(&self, email: &str, meeting_time: &str) -> Result<(), MailError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail transport unavailable: {0}")]
    Transport(String),
    #[error("recipient rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeetingReminder {
    pub user: User,
    pub meeting: ScheduledMeeting,
}

/// Counts for one reminder batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReminderSummary {
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Meeting start rendered for the email body, e.g. `9:30 AM UTC`.
pub fn format_meeting_time(start: DateTime<Utc>) -> String {
    start.format("%-I:%M %p UTC").to_string()
}

pub struct ReminderDispatcher<R, M> {
    repository: Arc<R>,
    mailer: Arc<M>,
}

impl<R, M> ReminderDispatcher<R, M>
where
    R: CaseRepository + 'static,
    M: ReminderMailer + 'static,
{
    pub fn new(repository: Arc<R>, mailer: Arc<M>) -> Self {
        Self { repository, mailer }
    }

    /// Clients with a meeting starting on `date`, in UTC, by start time.
    pub fn users_with_meetings_on(&self, date: NaiveDate) -> ApiResult<Vec<MeetingReminder>> {
        let start = date.and_hms_opt(0, 0, 0).map(|midnight| midnight.and_utc());
        let end = date
            .succ_opt()
            .and_then(|next| next.and_hms_opt(0, 0, 0))
            .map(|midnight| midnight.and_utc());
        let (Some(start), Some(end)) = (start, end) else {
            return Err(ApiError::internal("meeting window out of range", date));
        };

        let meetings = self
            .repository
            .meetings_between(start, end)
            .map_err(|err| ApiError::internal("failed to load scheduled meetings", err))?;

        let mut reminders = Vec::with_capacity(meetings.len());
        for meeting in meetings {
            let user = self
                .repository
                .find_user(&meeting.client)
                .map_err(|err| ApiError::internal("failed to load meeting client", err))?;
            match user {
                Some(user) => reminders.push(MeetingReminder { user, meeting }),
                None => warn!(meeting_id = %meeting.id, "meeting has no matching client"),
            }
        }
        Ok(reminders)
    }

    /// Email every client meeting on `date`.
    ///
    /// Every send is attempted; individual failures are logged and counted.
    /// Only failing to load the recipients is an error.
    pub async fn send_daily_meeting_reminders(&self, date: NaiveDate) -> ApiResult<ReminderSummary> {
        let reminders = self.users_with_meetings_on(date)?;

        let sends = reminders.iter().map(|reminder| {
            let mailer = Arc::clone(&self.mailer);
            let email = reminder.user.email.clone();
            let meeting_time = format_meeting_time(reminder.meeting.start_time);
            async move {
                let result = mailer.send_meeting_reminder(&email, &meeting_time).await;
                if let Err(err) = &result {
                    warn!(error = %err, recipient = %email, "meeting reminder failed");
                }
                result
            }
        });
        let results = join_all(sends).await;

        let failed = results.iter().filter(|result| result.is_err()).count();
        let summary = ReminderSummary {
            attempted: results.len(),
            sent: results.len() - failed,
            failed,
        };
        info!(
            attempted = summary.attempted,
            sent = summary.sent,
            failed = summary.failed,
            %date,
            "meeting reminders dispatched"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn meeting_time_uses_twelve_hour_clock() {
        let start = Utc.with_ymd_and_hms(2024, 5, 6, 9, 30, 0).unwrap();
        assert_eq!(format_meeting_time(start), "9:30 AM UTC");
        let start = Utc.with_ymd_and_hms(2024, 5, 6, 15, 5, 0).unwrap();
        assert_eq!(format_meeting_time(start), "3:05 PM UTC");
    }
}
