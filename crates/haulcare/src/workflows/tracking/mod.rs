//! Weekly Healthy Habits tracking forms submitted by enrolled clients.

pub mod router;


use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::outcome::{ApiError, ApiResult, Resource};
use crate::records::{
    BloodPressure, CaseRepository, HealthyHabitsTrackingForm, HealthyHabitsTrackingFormId, UserId,
};
use crate::workflows::accounts::Session;
use crate::workflows::enrollment::validation::{Checker, NumericInput, ValidationErrors};

pub use router::{tracking_router, TrackingState};

/// Minutes in a week.
const MAX_MOVEMENT_MINUTES: u32 = 7 * 24 * 60;
const MAX_A1C_PERCENT: f64 = 20.0;

/// Raw tracking form input; every field optional, numbers accepted as text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingFormDraft {
    pub week_of_submission: Option<String>,
    pub health_conditions: Option<String>,
    pub devices: Option<String>,
    pub weight_lbs: Option<NumericInput>,
    pub movement_minutes: Option<NumericInput>,
    /// `systolic/diastolic`, e.g. `120/80`.
    pub blood_pressure: Option<String>,
    pub blood_glucose: Option<NumericInput>,
    pub a1c: Option<NumericInput>,
    pub cholesterol: Option<NumericInput>,
    pub qualitative_goals: Option<String>,
}

/// A validated week of measurements, not yet attached to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackingEntry {
    pub week_of_submission: NaiveDate,
    pub health_conditions: String,
    pub devices: String,
    pub weight_lbs: f64,
    pub movement_minutes: u32,
    pub blood_pressure: BloodPressure,
    pub blood_glucose: f64,
    pub a1c: f64,
    pub cholesterol: f64,
    pub qualitative_goals: String,
}

/// Accepts `MM/DD/YYYY` as well as `YYYY-MM-DD`.
fn parse_week(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
}

fn parse_blood_pressure(raw: &str) -> Option<BloodPressure> {
    let (systolic, diastolic) = raw.split_once('/')?;
    let systolic: u16 = systolic.trim().parse().ok()?;
    let diastolic: u16 = diastolic.trim().parse().ok()?;
    (diastolic > 0 && systolic > diastolic).then_some(BloodPressure {
        systolic,
        diastolic,
    })
}

fn non_negative(checker: &mut Checker, field: &str, value: Option<NumericInput>) -> Option<f64> {
    let number = checker.number(field, value)?;
    if number < 0.0 {
        checker.fail(field, "Cannot be negative");
        return None;
    }
    Some(number)
}

pub fn validate_tracking_form(
    draft: TrackingFormDraft,
    today: NaiveDate,
) -> Result<TrackingEntry, ValidationErrors> {
    let mut checker = Checker::new();

    let week_of_submission = checker
        .text("week_of_submission", draft.week_of_submission)
        .and_then(|raw| match parse_week(&raw) {
            Some(week) if week > today => {
                checker.fail("week_of_submission", "Week cannot be in the future");
                None
            }
            Some(week) => Some(week),
            None => {
                checker.fail("week_of_submission", "Must be a date in MM/DD/YYYY format");
                None
            }
        });
    let health_conditions = checker.text("health_conditions", draft.health_conditions);
    let devices = checker.text("devices", draft.devices);
    let weight_lbs = checker.positive("weight_lbs", draft.weight_lbs);
    let movement_minutes = checker.whole_in_range(
        "movement_minutes",
        draft.movement_minutes,
        0u32,
        MAX_MOVEMENT_MINUTES,
    );
    let blood_pressure = checker
        .text("blood_pressure", draft.blood_pressure)
        .and_then(|raw| match parse_blood_pressure(&raw) {
            Some(pressure) => Some(pressure),
            None => {
                checker.fail("blood_pressure", "Must look like 120/80");
                None
            }
        });
    let blood_glucose = non_negative(&mut checker, "blood_glucose", draft.blood_glucose);
    let a1c = non_negative(&mut checker, "a1c", draft.a1c).and_then(|a1c| {
        if a1c > MAX_A1C_PERCENT {
            checker.fail("a1c", format!("Must be at most {MAX_A1C_PERCENT}"));
            None
        } else {
            Some(a1c)
        }
    });
    let cholesterol = non_negative(&mut checker, "cholesterol", draft.cholesterol);
    let qualitative_goals = checker.text("qualitative_goals", draft.qualitative_goals);

    let entry = (|| {
        Some(TrackingEntry {
            week_of_submission: week_of_submission?,
            health_conditions: health_conditions?,
            devices: devices?,
            weight_lbs: weight_lbs?,
            movement_minutes: movement_minutes?,
            blood_pressure: blood_pressure?,
            blood_glucose: blood_glucose?,
            a1c: a1c?,
            cholesterol: cholesterol?,
            qualitative_goals: qualitative_goals?,
        })
    })();
    checker.finish(entry)
}

pub struct HealthyHabitsTrackingService<R> {
    repository: Arc<R>,
}

impl<R> HealthyHabitsTrackingService<R>
where
    R: CaseRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    fn require_user(&self, user_id: &UserId) -> ApiResult<String> {
        self.repository
            .find_user(user_id)
            .map_err(|err| ApiError::internal("failed to look up user", err))?
            .map(|user| user.email)
            .ok_or(ApiError::NotFound(Resource::User))
    }

    pub fn submit(
        &self,
        user_id: &UserId,
        entry: TrackingEntry,
    ) -> ApiResult<HealthyHabitsTrackingForm> {
        let email = self.require_user(user_id)?;
        let form = self
            .repository
            .insert_healthy_habits_tracking_form(HealthyHabitsTrackingForm {
                id: HealthyHabitsTrackingFormId::generate(),
                user: user_id.clone(),
                email,
                week_of_submission: entry.week_of_submission,
                health_conditions: entry.health_conditions,
                devices: entry.devices,
                weight_lbs: entry.weight_lbs,
                movement_minutes: entry.movement_minutes,
                blood_pressure: entry.blood_pressure,
                blood_glucose: entry.blood_glucose,
                a1c: entry.a1c,
                cholesterol: entry.cholesterol,
                qualitative_goals: entry.qualitative_goals,
                date_created: Utc::now(),
            })
            .map_err(|err| {
                ApiError::from_repository(
                    "failed to store tracking form",
                    Resource::HealthyHabitsTrackingForm,
                    err,
                )
            })?;

        info!(form_id = %form.id, user_id = %user_id, week = %form.week_of_submission, "tracking form submitted");
        Ok(form)
    }

    /// A client's forms, most recent week first.
    pub fn forms_for_user(&self, user_id: &UserId) -> ApiResult<Vec<HealthyHabitsTrackingForm>> {
        self.require_user(user_id)?;
        let mut forms: Vec<HealthyHabitsTrackingForm> = self
            .repository
            .healthy_habits_tracking_forms()
            .map_err(|err| ApiError::internal("failed to load tracking forms", err))?
            .into_iter()
            .filter(|form| &form.user == user_id)
            .collect();
        forms.sort_by(|left, right| {
            right
                .week_of_submission
                .cmp(&left.week_of_submission)
                .then(right.date_created.cmp(&left.date_created))
        });
        Ok(forms)
    }

    /// Only the owner or an admin may remove a form.
    pub fn delete(&self, session: &Session, id: &HealthyHabitsTrackingFormId) -> ApiResult<()> {
        let form = self
            .repository
            .find_healthy_habits_tracking_form(id)
            .map_err(|err| ApiError::internal("failed to look up tracking form", err))?
            .ok_or(ApiError::NotFound(Resource::HealthyHabitsTrackingForm))?;
        if form.user != session.user_id && !session.is_admin() {
            warn!(form_id = %id, user_id = %session.user_id, "tracking form delete refused");
            return Err(ApiError::Unauthorized);
        }

        self.repository
            .delete_healthy_habits_tracking_form(id)
            .map_err(|err| {
                ApiError::from_repository(
                    "failed to delete tracking form",
                    Resource::HealthyHabitsTrackingForm,
                    err,
                )
            })?;
        info!(form_id = %id, "tracking form deleted");
        Ok(())
    }
}
