//! Per-section validation gating wizard advancement.
//!
//! Validators are pure: they take a draft deserialized from user input (every
//! field optional, numbers accepted as text) and return either the validated
//! section or every field error found, keyed by dotted field path.

mod drafts;
mod program_specific;
mod sections;

use std::fmt::Display;

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::domain::LikertRank;

pub use drafts::{
    GeneralInformationDraft, GetPreventativeScreeningsDraft, HealthyHabitsDraft, NumericInput,
    ProgramSpecificQuestionsDraft, QualifyingQuestionsDraft, RigsWithoutCigsDraft,
    VaccineVoucherDraft,
};
pub use program_specific::validate_program_specific_questions;
pub use sections::{
    validate_general_information, validate_program_selection, validate_qualifying_questions,
};

const REQUIRED: &str = "Required";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every field-level problem found in one section submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|error| error.field == field)
    }

    /// True if any error sits at `prefix` or below it.
    pub fn has_errors_under(&self, prefix: &str) -> bool {
        self.errors.iter().any(|error| {
            error.field == prefix
                || error
                    .field
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('.'))
        })
    }

    pub(crate) fn push(&mut self, field: String, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub(crate) fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }
}

/// Collects errors for one (possibly nested) block of fields.
pub(crate) struct Checker {
    prefix: Option<&'static str>,
    errors: ValidationErrors,
}

impl Checker {
    pub(crate) fn new() -> Self {
        Self {
            prefix: None,
            errors: ValidationErrors::default(),
        }
    }

    pub(crate) fn nested(prefix: &'static str) -> Self {
        Self {
            prefix: Some(prefix),
            errors: ValidationErrors::default(),
        }
    }

    fn path(&self, field: &str) -> String {
        match self.prefix {
            Some(prefix) => format!("{prefix}.{field}"),
            None => field.to_string(),
        }
    }

    pub(crate) fn fail(&mut self, field: &str, message: impl Into<String>) {
        let path = self.path(field);
        self.errors.push(path, message);
    }

    pub(crate) fn required<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.fail(field, REQUIRED);
        }
        value
    }

    /// Trimmed, non-blank text.
    pub(crate) fn text(&mut self, field: &str, value: Option<String>) -> Option<String> {
        let trimmed = value
            .map(|raw| raw.trim().to_string())
            .filter(|text| !text.is_empty());
        self.required(field, trimmed)
    }

    pub(crate) fn number(&mut self, field: &str, value: Option<NumericInput>) -> Option<f64> {
        let input = self.required(field, value)?;
        let parsed = input.parse();
        if parsed.is_none() {
            self.fail(field, "Must be a number");
        }
        parsed
    }

    pub(crate) fn positive(&mut self, field: &str, value: Option<NumericInput>) -> Option<f64> {
        let number = self.number(field, value)?;
        if number > 0.0 {
            Some(number)
        } else {
            self.fail(field, "Must be greater than 0");
            None
        }
    }

    /// Whole number within `min..=max`.
    pub(crate) fn whole_in_range<T>(
        &mut self,
        field: &str,
        value: Option<NumericInput>,
        min: T,
        max: T,
    ) -> Option<T>
    where
        T: TryFrom<i64> + Into<i64> + Copy + Display,
    {
        let number = self.number(field, value)?;
        let lower: i64 = min.into();
        let upper: i64 = max.into();
        if number.fract() != 0.0 || number < lower as f64 || number > upper as f64 {
            self.fail(
                field,
                format!("Must be a whole number between {min} and {max}"),
            );
            return None;
        }
        T::try_from(number as i64).ok()
    }

    pub(crate) fn likert(&mut self, field: &str, value: Option<NumericInput>) -> Option<LikertRank> {
        self.whole_in_range(field, value, LikertRank::MIN, LikertRank::MAX)
            .and_then(LikertRank::new)
    }

    /// One of the serialized names of `T`.
    pub(crate) fn choice<T: DeserializeOwned>(
        &mut self,
        field: &str,
        value: Option<String>,
    ) -> Option<T> {
        let raw = self.text(field, value)?;
        match serde_json::from_value(serde_json::Value::String(raw.clone())) {
            Ok(choice) => Some(choice),
            Err(_) => {
                self.fail(field, format!("'{raw}' is not a valid option"));
                None
            }
        }
    }

    /// At least one entry, each a valid option, duplicates removed.
    pub(crate) fn choices<T: DeserializeOwned + PartialEq>(
        &mut self,
        field: &str,
        values: Option<Vec<String>>,
    ) -> Option<Vec<T>> {
        let raw = values.unwrap_or_default();
        if raw.is_empty() {
            self.fail(field, "Select at least one option");
            return None;
        }

        let mut selected = Vec::with_capacity(raw.len());
        let mut valid = true;
        for entry in raw {
            match serde_json::from_value::<T>(serde_json::Value::String(entry.trim().to_string()))
            {
                Ok(choice) if !selected.contains(&choice) => selected.push(choice),
                Ok(_) => {}
                Err(_) => {
                    self.fail(field, format!("'{entry}' is not a valid option"));
                    valid = false;
                }
            }
        }
        valid.then_some(selected)
    }

    pub(crate) fn date(&mut self, field: &str, value: Option<String>) -> Option<NaiveDate> {
        let raw = self.text(field, value)?;
        match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                self.fail(field, "Must be a date in YYYY-MM-DD format");
                None
            }
        }
    }

    pub(crate) fn into_errors(self) -> ValidationErrors {
        self.errors
    }

    /// Return the built value only if no field failed.
    pub(crate) fn finish<T>(self, value: Option<T>) -> Result<T, ValidationErrors> {
        match value {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(self.errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_accept_numeric_text() {
        let mut checker = Checker::new();
        assert_eq!(
            checker.positive("weight_lbs", Some(NumericInput::Text(" 182.5 ".to_string()))),
            Some(182.5)
        );
        assert!(checker.into_errors().is_empty());
    }

    #[test]
    fn nested_paths_are_dotted() {
        let mut checker = Checker::nested("rigs_without_cigs");
        checker.text("reason_for_quitting", Some("   ".to_string()));
        let errors = checker.into_errors();
        assert!(errors.has_field("rigs_without_cigs.reason_for_quitting"));
        assert!(errors.has_errors_under("rigs_without_cigs"));
        assert!(!errors.has_errors_under("rigs"));
    }

    #[test]
    fn likert_rejects_out_of_range_and_fractions() {
        let mut checker = Checker::new();
        assert!(checker
            .likert("sleep_ranking", Some(NumericInput::Number(6.0)))
            .is_none());
        assert!(checker
            .likert("energy_ranking", Some(NumericInput::Text("2.5".to_string())))
            .is_none());
        assert_eq!(
            checker
                .likert("movement_and_activity_ranking", Some(NumericInput::Text("4".to_string())))
                .map(LikertRank::value),
            Some(4)
        );
        let errors = checker.into_errors();
        assert!(errors.has_field("sleep_ranking"));
        assert!(errors.has_field("energy_ranking"));
        assert_eq!(errors.errors.len(), 2);
    }
}
