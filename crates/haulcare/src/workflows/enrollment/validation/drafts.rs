use serde::{Deserialize, Serialize};

use crate::workflows::enrollment::domain::HealthDevices;

/// A numeric answer as it arrives from a form control: a JSON number or text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(f64),
    Text(String),
}

impl NumericInput {
    pub fn parse(&self) -> Option<f64> {
        match self {
            NumericInput::Number(value) => Some(*value).filter(|value| value.is_finite()),
            NumericInput::Text(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite()),
        }
    }
}

impl From<f64> for NumericInput {
    fn from(value: f64) -> Self {
        NumericInput::Number(value)
    }
}

impl From<&str> for NumericInput {
    fn from(value: &str) -> Self {
        NumericInput::Text(value.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralInformationDraft {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub date_of_birth: Option<String>,
    pub sex: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualifyingQuestionsDraft {
    pub is_commercial_driver: Option<bool>,
    pub driver_type: Option<String>,
    pub has_health_insurance: Option<bool>,
    pub has_primary_care_provider: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthyHabitsDraft {
    pub weight_lbs: Option<NumericInput>,
    pub height_feet: Option<NumericInput>,
    pub height_inches: Option<NumericInput>,
    pub systolic_blood_pressure: Option<NumericInput>,
    pub diastolic_blood_pressure: Option<NumericInput>,
    pub has_had_glucose_or_a1c_test_in_past_year: Option<bool>,
    pub glucose_or_a1c_test_result: Option<String>,
    pub movement_and_activity_ranking: Option<NumericInput>,
    pub energy_ranking: Option<NumericInput>,
    pub sleep_ranking: Option<NumericInput>,
    pub emotional_health_ranking: Option<NumericInput>,
    pub water_bottles_per_day: Option<String>,
    pub fruit_and_vegetable_servings_per_day: Option<String>,
    pub other_illness_or_injury: Option<String>,
    pub biggest_healthy_living_challenge: Option<String>,
    pub short_term_health_goals: Option<String>,
    pub long_term_health_goals: Option<String>,
    pub devices: HealthDevices,
    pub healthy_habits_hopeful_learnings: Option<String>,
    pub diabetes_prevention_hopeful_learnings: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RigsWithoutCigsDraft {
    pub tobacco_forms: Option<Vec<String>>,
    pub tobacco_usage_length: Option<String>,
    pub has_attempted_to_quit: Option<bool>,
    pub reason_for_quitting: Option<String>,
    pub readiness_to_quit_ranking: Option<NumericInput>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaccineVoucherDraft {
    pub vaccines: Option<Vec<String>>,
    pub other_vaccine: Option<String>,
    pub voucher_location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetPreventativeScreeningsDraft {
    pub requested_screenings: Option<Vec<String>>,
    pub has_had_screening_in_past_year: Option<bool>,
}

/// Raw program-specific answers; blocks for programs not opted in are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramSpecificQuestionsDraft {
    pub healthy_habits_and_diabetes_prevention: Option<HealthyHabitsDraft>,
    pub rigs_without_cigs: Option<RigsWithoutCigsDraft>,
    pub vaccine_voucher: Option<VaccineVoucherDraft>,
    pub get_preventative_screenings: Option<GetPreventativeScreeningsDraft>,
}
