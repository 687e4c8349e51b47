//! Administrative dashboards and collection exports.

pub mod export;
pub mod metrics;
pub mod router;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::outcome::{ApiError, ApiResult};
use crate::records::{CaseRepository, ProgramEnrollment};
use crate::workflows::enrollment::programs::Program;

pub use export::ExportCollection;
pub use metrics::{
    bmi, monthly_screening_metrics, registrations_in_past_three_months, screening_metrics,
    yearly_screening_metrics, BmiClassification, ScreeningMetrics, YearlyScreeningMetrics,
};
pub use router::{dashboard_router, DashboardState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgramRegistrations {
    pub program: Program,
    pub total_enrolled: usize,
    pub registrations_in_past_three_months: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScreeningDashboard {
    #[serde(flatten)]
    pub registrations: ProgramRegistrations,
    pub this_month: ScreeningMetrics,
    pub yearly: Vec<YearlyScreeningMetrics>,
}

pub struct DashboardService<R> {
    repository: Arc<R>,
}

impl<R> DashboardService<R>
where
    R: CaseRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    fn enrollments_for(&self, program: Program) -> ApiResult<Vec<ProgramEnrollment>> {
        Ok(self
            .repository
            .program_enrollments()
            .map_err(|err| ApiError::internal("failed to load program enrollments", err))?
            .into_iter()
            .filter(|enrollment| enrollment.program == program)
            .collect())
    }

    pub fn program_registrations(
        &self,
        program: Program,
        now: DateTime<Utc>,
    ) -> ApiResult<ProgramRegistrations> {
        let enrollments = self.enrollments_for(program)?;
        Ok(ProgramRegistrations {
            program,
            total_enrolled: enrollments.len(),
            registrations_in_past_three_months: registrations_in_past_three_months(
                &enrollments,
                now,
            ),
        })
    }

    pub fn screening_dashboard(&self, now: DateTime<Utc>) -> ApiResult<ScreeningDashboard> {
        let registrations =
            self.program_registrations(Program::GetPreventativeScreenings, now)?;
        let requests = self
            .repository
            .screening_requests()
            .map_err(|err| ApiError::internal("failed to load screening requests", err))?;

        Ok(ScreeningDashboard {
            registrations,
            this_month: monthly_screening_metrics(&requests, now),
            yearly: yearly_screening_metrics(&requests, now),
        })
    }

    /// Render one collection as CSV.
    pub fn export(&self, collection: ExportCollection) -> ApiResult<String> {
        let rendered = match collection {
            ExportCollection::Users => {
                let users = self
                    .repository
                    .users()
                    .map_err(|err| ApiError::internal("failed to load users", err))?;
                export::users_csv(&users)
            }
            ExportCollection::ProgramEnrollments => {
                let enrollments = self
                    .repository
                    .program_enrollments()
                    .map_err(|err| ApiError::internal("failed to load program enrollments", err))?;
                export::program_enrollments_csv(&enrollments)
            }
            ExportCollection::ScreeningRequests => {
                let requests = self
                    .repository
                    .screening_requests()
                    .map_err(|err| ApiError::internal("failed to load screening requests", err))?;
                export::screening_requests_csv(&requests)
            }
        };
        rendered.map_err(|err| ApiError::internal("failed to render export", err))
    }
}
