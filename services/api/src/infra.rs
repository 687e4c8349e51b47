use async_trait::async_trait;
use haulcare::config::{IntakeConfig, SecurityConfig, SeedAdmin};
use haulcare::outcome::ApiError;
use haulcare::records::InMemoryCaseRepository;
use haulcare::workflows::accounts::{AccountService, NewUser};
use haulcare::workflows::dashboard::DashboardService;
use haulcare::workflows::enrollment::{EnrollmentService, WizardRegistry};
use haulcare::workflows::reminders::{MailError, ReminderDispatcher, ReminderMailer};
use haulcare::workflows::tracking::HealthyHabitsTrackingService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Mail transport that only writes reminders to the log.
#[derive(Debug, Default, Clone)]
pub(crate) struct LoggingMailer;

#[async_trait]
impl ReminderMailer for LoggingMailer {
    async fn send_meeting_reminder(&self, email: &str, meeting_time: &str) -> Result<(), MailError> {
        info!(recipient = %email, %meeting_time, "meeting reminder queued");
        Ok(())
    }
}

pub(crate) type Repository = InMemoryCaseRepository;

/// Every service of the process, sharing one record store.
pub(crate) struct CaseServices {
    pub(crate) enrollment: Arc<EnrollmentService<Repository>>,
    pub(crate) wizards: Arc<WizardRegistry<EnrollmentService<Repository>>>,
    pub(crate) accounts: Arc<AccountService<Repository>>,
    pub(crate) dashboard: Arc<DashboardService<Repository>>,
    pub(crate) tracking: Arc<HealthyHabitsTrackingService<Repository>>,
    pub(crate) reminders: Arc<ReminderDispatcher<Repository, LoggingMailer>>,
}

impl CaseServices {
    pub(crate) fn in_memory(security: &SecurityConfig, intake: &IntakeConfig) -> Self {
        let repository = Arc::new(InMemoryCaseRepository::new());
        let enrollment = Arc::new(EnrollmentService::new(Arc::clone(&repository)));
        let wizards = Arc::new(
            WizardRegistry::new(Arc::clone(&enrollment), intake.submission_timeout)
                .with_idle_timeout(intake.session_idle_timeout),
        );
        let accounts = Arc::new(
            AccountService::new(Arc::clone(&repository), security.bcrypt_cost).with_session_lifetime(
                chrono::Duration::hours(security.session_lifetime_hours),
            ),
        );
        let dashboard = Arc::new(DashboardService::new(Arc::clone(&repository)));
        let tracking = Arc::new(HealthyHabitsTrackingService::new(Arc::clone(&repository)));
        let reminders = Arc::new(ReminderDispatcher::new(
            Arc::clone(&repository),
            Arc::new(LoggingMailer),
        ));

        Self {
            enrollment,
            wizards,
            accounts,
            dashboard,
            tracking,
            reminders,
        }
    }

    /// Create the configured administrator; an existing account is left alone.
    pub(crate) fn seed_admin(&self, seed: &SeedAdmin) -> Result<(), ApiError> {
        let request = NewUser {
            first_name: "Program".to_string(),
            last_name: "Administrator".to_string(),
            email: seed.email.clone(),
            phone_number: String::new(),
            password: seed.password.clone(),
        };
        match self.accounts.create_admin_user(request) {
            Ok(admin) => {
                info!(user_id = %admin.id, email = %admin.email, "seeded administrator account");
                Ok(())
            }
            Err(ApiError::Duplicate) => Ok(()),
            Err(err) => Err(err),
        }
    }
}
