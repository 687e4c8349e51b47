use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::outcome::{ApiError, ApiResult};
use crate::records::{Role, User, UserId};
use crate::workflows::enrollment::domain::{
    EnrollmentSubmission, HealthDevices, ProgramSelectionSection, SectionUpdate,
};
use crate::workflows::enrollment::store::EnrollmentFormStore;
use crate::workflows::enrollment::submission::EnrollmentGateway;
use crate::workflows::enrollment::validation::{
    validate_general_information, validate_program_specific_questions,
    validate_qualifying_questions, GeneralInformationDraft, GetPreventativeScreeningsDraft,
    HealthyHabitsDraft, NumericInput, ProgramSpecificQuestionsDraft, QualifyingQuestionsDraft,
    RigsWithoutCigsDraft, VaccineVoucherDraft,
};
use crate::workflows::enrollment::wizard::{EnrollmentWizard, StepOutcome};

pub(super) const TIMEOUT: Duration = Duration::from_secs(5);

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
}

pub(super) fn general_information() -> GeneralInformationDraft {
    GeneralInformationDraft {
        first_name: Some("Marcus".to_string()),
        last_name: Some("Hale".to_string()),
        date_of_birth: Some("1972-11-02".to_string()),
        sex: Some("male".to_string()),
        email: Some("marcus.hale@example.org".to_string()),
        phone_number: Some("417-555-0192".to_string()),
        street_address: Some("880 Freight Ln".to_string()),
        city: Some("Springfield".to_string()),
        state: Some("MO".to_string()),
        zip_code: Some("65802".to_string()),
    }
}

pub(super) fn qualifying_questions() -> QualifyingQuestionsDraft {
    QualifyingQuestionsDraft {
        is_commercial_driver: Some(true),
        driver_type: Some("company_driver".to_string()),
        has_health_insurance: Some(true),
        has_primary_care_provider: Some(false),
    }
}

pub(super) fn healthy_habits_only() -> ProgramSelectionSection {
    ProgramSelectionSection {
        opted_in_to_healthy_habits: true,
        ..ProgramSelectionSection::default()
    }
}

pub(super) fn healthy_habits_and_rigs() -> ProgramSelectionSection {
    ProgramSelectionSection {
        opted_in_to_healthy_habits: true,
        opted_in_to_rigs_without_cigs: true,
        ..ProgramSelectionSection::default()
    }
}

pub(super) fn healthy_habits() -> HealthyHabitsDraft {
    HealthyHabitsDraft {
        weight_lbs: Some(NumericInput::from("238")),
        height_feet: Some(NumericInput::from(5.0)),
        height_inches: Some(NumericInput::from("11")),
        systolic_blood_pressure: Some(NumericInput::from(132.0)),
        diastolic_blood_pressure: Some(NumericInput::from(86.0)),
        has_had_glucose_or_a1c_test_in_past_year: Some(true),
        glucose_or_a1c_test_result: Some("A1C 5.9".to_string()),
        movement_and_activity_ranking: Some(NumericInput::from(2.0)),
        energy_ranking: Some(NumericInput::from("3")),
        sleep_ranking: Some(NumericInput::from(2.0)),
        emotional_health_ranking: Some(NumericInput::from(4.0)),
        water_bottles_per_day: Some("2".to_string()),
        fruit_and_vegetable_servings_per_day: Some("3".to_string()),
        other_illness_or_injury: Some("Lower back strain".to_string()),
        biggest_healthy_living_challenge: Some("Truck stop food".to_string()),
        short_term_health_goals: Some("Walk every stop".to_string()),
        long_term_health_goals: Some("Lose 30 lbs".to_string()),
        devices: HealthDevices {
            has_scale: true,
            ..HealthDevices::default()
        },
        healthy_habits_hopeful_learnings: Some("Cooking in the cab".to_string()),
        diabetes_prevention_hopeful_learnings: None,
    }
}

pub(super) fn rigs_without_cigs() -> RigsWithoutCigsDraft {
    RigsWithoutCigsDraft {
        tobacco_forms: Some(vec!["cigarettes".to_string(), "smokeless_tobacco".to_string()]),
        tobacco_usage_length: Some("20 years".to_string()),
        has_attempted_to_quit: Some(true),
        reason_for_quitting: Some("Grandkids".to_string()),
        readiness_to_quit_ranking: Some(NumericInput::from(4.0)),
    }
}

pub(super) fn vaccine_voucher() -> VaccineVoucherDraft {
    VaccineVoucherDraft {
        vaccines: Some(vec!["flu".to_string()]),
        other_vaccine: None,
        voucher_location: Some("Walgreens".to_string()),
    }
}

pub(super) fn preventative_screenings() -> GetPreventativeScreeningsDraft {
    GetPreventativeScreeningsDraft {
        requested_screenings: Some(vec!["prostate".to_string()]),
        has_had_screening_in_past_year: Some(false),
    }
}

pub(super) fn program_answers() -> ProgramSpecificQuestionsDraft {
    ProgramSpecificQuestionsDraft {
        healthy_habits_and_diabetes_prevention: Some(healthy_habits()),
        rigs_without_cigs: Some(rigs_without_cigs()),
        ..ProgramSpecificQuestionsDraft::default()
    }
}

/// A complete submission opting into Healthy Habits and Rigs Without Cigs.
pub(super) fn submission() -> EnrollmentSubmission {
    let selection = healthy_habits_and_rigs();
    let mut store = EnrollmentFormStore::new();
    store.update_section(SectionUpdate::GeneralInformation(
        validate_general_information(general_information(), today()).expect("valid"),
    ));
    store.update_section(SectionUpdate::QualifyingQuestions(
        validate_qualifying_questions(qualifying_questions()).expect("valid"),
    ));
    store.update_section(SectionUpdate::ProgramSelection(selection));
    store.update_section(SectionUpdate::ProgramSpecificQuestions(
        validate_program_specific_questions(program_answers(), &selection).expect("valid"),
    ));
    store.form().assemble().expect("form assembles")
}

pub(super) fn client(email: &str) -> User {
    User {
        id: UserId::generate(),
        first_name: "Marcus".to_string(),
        last_name: "Hale".to_string(),
        email: email.to_string(),
        phone_number: "4175550192".to_string(),
        password_hash: String::new(),
        role: Role::Client,
        date_created: chrono::Utc::now(),
        is_email_verified: false,
        enrollment_form: None,
        program_enrollments: Vec::new(),
        screening_requests: Vec::new(),
    }
}

/// Gateway recording every payload it receives.
#[derive(Default)]
pub(super) struct RecordingGateway {
    calls: AtomicUsize,
    received: Mutex<Vec<EnrollmentSubmission>>,
}

impl RecordingGateway {
    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(super) fn received(&self) -> Vec<EnrollmentSubmission> {
        self.received.lock().expect("gateway mutex").clone()
    }
}

#[async_trait]
impl EnrollmentGateway for RecordingGateway {
    async fn submit_enrollment_form(&self, submission: EnrollmentSubmission) -> ApiResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.received.lock().expect("gateway mutex").push(submission);
        Ok(())
    }
}

/// Gateway failing the first `failures` calls with `error`, then succeeding.
pub(super) struct FailingGateway {
    error: ApiError,
    failures: usize,
    calls: AtomicUsize,
}

impl FailingGateway {
    pub(super) fn always(error: ApiError) -> Self {
        Self::times(error, usize::MAX)
    }

    pub(super) fn times(error: ApiError, failures: usize) -> Self {
        Self {
            error,
            failures,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EnrollmentGateway for FailingGateway {
    async fn submit_enrollment_form(&self, _submission: EnrollmentSubmission) -> ApiResult<()> {
        let previous = self.calls.fetch_add(1, Ordering::SeqCst);
        if previous < self.failures {
            Err(self.error.clone())
        } else {
            Ok(())
        }
    }
}

/// Gateway that never answers within any reasonable limit.
pub(super) struct StalledGateway;

#[async_trait]
impl EnrollmentGateway for StalledGateway {
    async fn submit_enrollment_form(&self, _submission: EnrollmentSubmission) -> ApiResult<()> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}

/// Walk the three synchronous sections with valid data.
pub(super) fn complete_leading_sections<G>(
    wizard: &mut EnrollmentWizard<G>,
    selection: ProgramSelectionSection,
) where
    G: EnrollmentGateway + ?Sized,
{
    assert!(matches!(
        wizard.submit_general_information_on(general_information(), today()),
        StepOutcome::Advanced { .. }
    ));
    assert!(matches!(
        wizard.submit_qualifying_questions(qualifying_questions()),
        StepOutcome::Advanced { .. }
    ));
    assert!(matches!(
        wizard.submit_program_selection(selection),
        StepOutcome::Advanced { .. }
    ));
}
