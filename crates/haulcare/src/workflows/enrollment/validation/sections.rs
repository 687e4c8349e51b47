use chrono::NaiveDate;

use super::{Checker, GeneralInformationDraft, QualifyingQuestionsDraft, ValidationErrors};
use crate::workflows::enrollment::domain::{
    DriverType, GeneralInformationSection, ProgramSelectionSection, QualifyingQuestionsSection,
    Sex,
};

pub fn validate_general_information(
    draft: GeneralInformationDraft,
    today: NaiveDate,
) -> Result<GeneralInformationSection, ValidationErrors> {
    let mut checker = Checker::new();

    let first_name = checker.text("first_name", draft.first_name);
    let last_name = checker.text("last_name", draft.last_name);
    let date_of_birth = checker.date("date_of_birth", draft.date_of_birth).and_then(|date| {
        if date > today {
            checker.fail("date_of_birth", "Date of birth cannot be in the future");
            None
        } else {
            Some(date)
        }
    });
    let sex = checker.choice::<Sex>("sex", draft.sex);
    let email = checker
        .text("email", draft.email)
        .and_then(|email| match normalize_email(&email) {
            Some(normalized) => Some(normalized),
            None => {
                checker.fail("email", "Must be a valid email address");
                None
            }
        });
    let phone_number = checker
        .text("phone_number", draft.phone_number)
        .and_then(|phone| {
            if is_us_phone_number(&phone) {
                Some(phone)
            } else {
                checker.fail("phone_number", "Must be a 10-digit phone number");
                None
            }
        });
    let street_address = checker.text("street_address", draft.street_address);
    let city = checker.text("city", draft.city);
    let state = checker.text("state", draft.state);
    let zip_code = checker.text("zip_code", draft.zip_code).and_then(|zip| {
        if zip.len() == 5 && zip.chars().all(|c| c.is_ascii_digit()) {
            Some(zip)
        } else {
            checker.fail("zip_code", "Must be a 5-digit zip code");
            None
        }
    });

    let section = (|| {
        Some(GeneralInformationSection {
            first_name: first_name?,
            last_name: last_name?,
            date_of_birth: date_of_birth?,
            sex: sex?,
            email: email?,
            phone_number: phone_number?,
            street_address: street_address?,
            city: city?,
            state: state?,
            zip_code: zip_code?,
        })
    })();
    checker.finish(section)
}

pub fn validate_qualifying_questions(
    draft: QualifyingQuestionsDraft,
) -> Result<QualifyingQuestionsSection, ValidationErrors> {
    let mut checker = Checker::new();

    let is_commercial_driver = checker.required("is_commercial_driver", draft.is_commercial_driver);
    let driver_type = checker.choice::<DriverType>("driver_type", draft.driver_type);
    let has_health_insurance = checker.required("has_health_insurance", draft.has_health_insurance);
    let has_primary_care_provider =
        checker.required("has_primary_care_provider", draft.has_primary_care_provider);

    let section = (|| {
        Some(QualifyingQuestionsSection {
            is_commercial_driver: is_commercial_driver?,
            driver_type: driver_type?,
            has_health_insurance: has_health_insurance?,
            has_primary_care_provider: has_primary_care_provider?,
        })
    })();
    checker.finish(section)
}

/// At least one program must be chosen for the form to be submittable.
pub fn validate_program_selection(
    selection: ProgramSelectionSection,
) -> Result<ProgramSelectionSection, ValidationErrors> {
    let mut checker = Checker::new();
    if !selection.any() {
        checker.fail("program_selection", "Select at least one program");
    }
    checker.finish(Some(selection))
}

/// Lowercased address with exactly one `@` and a dotted domain.
fn normalize_email(raw: &str) -> Option<String> {
    if raw.chars().any(char::is_whitespace) {
        return None;
    }
    let (local, domain) = raw.split_once('@')?;
    if local.is_empty() || domain.contains('@') {
        return None;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return None;
    }
    Some(raw.to_ascii_lowercase())
}

fn is_us_phone_number(raw: &str) -> bool {
    if raw
        .chars()
        .any(|c| !(c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')' | '.' | '+')))
    {
        return false;
    }
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.len() == 10 || (digits.len() == 11 && digits.starts_with('1'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
    }

    fn draft() -> GeneralInformationDraft {
        GeneralInformationDraft {
            first_name: Some("Dana".to_string()),
            last_name: Some("Reyes".to_string()),
            date_of_birth: Some("1979-03-14".to_string()),
            sex: Some("female".to_string()),
            email: Some("Dana.Reyes@Example.com".to_string()),
            phone_number: Some("(555) 010-4477".to_string()),
            street_address: Some("12 Depot Rd".to_string()),
            city: Some("Joplin".to_string()),
            state: Some("MO".to_string()),
            zip_code: Some("64801".to_string()),
        }
    }

    #[test]
    fn accepts_complete_general_information() {
        let section = validate_general_information(draft(), today()).expect("valid section");
        assert_eq!(section.email, "dana.reyes@example.com");
        assert_eq!(section.sex, Sex::Female);
    }

    #[test]
    fn reports_every_failing_field() {
        let mut input = draft();
        input.first_name = Some("  ".to_string());
        input.email = Some("dana@localhost".to_string());
        input.phone_number = Some("555-0100".to_string());
        input.zip_code = Some("6480".to_string());
        input.date_of_birth = Some("2030-01-01".to_string());
        input.sex = None;

        let errors = validate_general_information(input, today()).expect_err("invalid section");
        for field in [
            "first_name",
            "email",
            "phone_number",
            "zip_code",
            "date_of_birth",
            "sex",
        ] {
            assert!(errors.has_field(field), "missing error for {field}");
        }
        assert_eq!(errors.errors.len(), 6);
    }

    #[test]
    fn email_rules() {
        assert!(normalize_email("a@b.co").is_some());
        assert!(normalize_email("a@@b.co").is_none());
        assert!(normalize_email("a@b@c.co").is_none());
        assert!(normalize_email("@b.co").is_none());
        assert!(normalize_email("a@b.").is_none());
        assert!(normalize_email("a b@c.co").is_none());
    }

    #[test]
    fn phone_rules() {
        assert!(is_us_phone_number("555.010.4477"));
        assert!(is_us_phone_number("+1 555 010 4477"));
        assert!(!is_us_phone_number("2 555 010 4477"));
        assert!(!is_us_phone_number("555-O10-4477"));
    }

    #[test]
    fn qualifying_questions_require_every_answer() {
        let errors = validate_qualifying_questions(QualifyingQuestionsDraft {
            is_commercial_driver: Some(true),
            driver_type: Some("astronaut".to_string()),
            ..QualifyingQuestionsDraft::default()
        })
        .expect_err("incomplete answers");
        assert!(errors.has_field("driver_type"));
        assert!(errors.has_field("has_health_insurance"));
        assert!(errors.has_field("has_primary_care_provider"));

        let section = validate_qualifying_questions(QualifyingQuestionsDraft {
            is_commercial_driver: Some(true),
            driver_type: Some("owner_operator".to_string()),
            has_health_insurance: Some(false),
            has_primary_care_provider: Some(false),
        })
        .expect("complete answers");
        assert_eq!(section.driver_type, DriverType::OwnerOperator);
    }

    #[test]
    fn program_selection_needs_one_program() {
        assert!(validate_program_selection(ProgramSelectionSection::default()).is_err());
        let selection = ProgramSelectionSection {
            opted_in_to_vaccine_voucher: true,
            ..ProgramSelectionSection::default()
        };
        assert_eq!(validate_program_selection(selection), Ok(selection));
    }
}
