use crate::infra::CaseServices;
use chrono::Utc;
use clap::Args;
use haulcare::config::{IntakeConfig, SecurityConfig};
use haulcare::error::AppError;
use haulcare::workflows::dashboard::ExportCollection;
use haulcare::workflows::enrollment::validation::{
    GeneralInformationDraft, GetPreventativeScreeningsDraft, HealthyHabitsDraft, NumericInput,
    ProgramSpecificQuestionsDraft, QualifyingQuestionsDraft,
};
use haulcare::workflows::enrollment::{
    EnrollmentWizard, HealthDevices, ProgramSelectionSection, StepOutcome,
};
use std::time::Duration;

const DEMO_BCRYPT_COST: u32 = 4;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Applicant email used for the walkthrough
    #[arg(long, default_value = "marcus.hale@example.org")]
    pub(crate) email: String,
    /// Submit the same form a second time to show the duplicate notice
    #[arg(long)]
    pub(crate) repeat: bool,
    /// Print the program enrollment CSV export after submitting
    #[arg(long)]
    pub(crate) export: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        email,
        repeat,
        export,
    } = args;

    let security = SecurityConfig {
        bcrypt_cost: DEMO_BCRYPT_COST,
        ..SecurityConfig::default()
    };
    let intake = IntakeConfig {
        submission_timeout: Duration::from_secs(5),
        ..IntakeConfig::default()
    };
    let services = CaseServices::in_memory(&security, &intake);

    println!("Enrollment wizard demo");
    walk_wizard(&services, &email).await;
    if repeat {
        println!("\nSecond submission for the same applicant");
        walk_wizard(&services, &email).await;
    }

    match services.enrollment.get_enrollment_form_by_email(&email) {
        Ok(record) => println!(
            "\nStored enrollment form {} (created {})",
            record.id.as_str(),
            record.date_created.format("%Y-%m-%d %H:%M UTC")
        ),
        Err(err) => {
            println!("\nNo enrollment form stored: {}", err.user_message());
            return Ok(());
        }
    }

    match services.enrollment.pending_applications(None, "") {
        Ok(pending) => println!("\n{} application(s) awaiting review", pending.len()),
        Err(err) => println!("\nPending applications unavailable: {}", err.user_message()),
    }

    println!("\nProgram registrations");
    let now = Utc::now();
    for program in program_selection().opted_in_programs() {
        match services.dashboard.program_registrations(program, now) {
            Ok(registrations) => println!(
                "- {}: {} enrolled, {} in the past three months",
                program,
                registrations.total_enrolled,
                registrations.registrations_in_past_three_months
            ),
            Err(err) => println!("- {}: unavailable ({})", program, err.user_message()),
        }
    }

    if export {
        match services.dashboard.export(ExportCollection::ProgramEnrollments) {
            Ok(csv) => println!(
                "\n{}\n{}",
                ExportCollection::ProgramEnrollments.file_name(),
                csv
            ),
            Err(err) => println!("\nExport unavailable: {}", err.user_message()),
        }
    }

    Ok(())
}

async fn walk_wizard(services: &CaseServices, email: &str) {
    let mut wizard = EnrollmentWizard::new(services.enrollment.clone(), Duration::from_secs(5));

    let steps = [
        (
            "General information",
            wizard.submit_general_information(general_information(email)),
        ),
        (
            "Qualifying questions",
            wizard.submit_qualifying_questions(qualifying_questions()),
        ),
        (
            "Program selection",
            wizard.submit_program_selection(program_selection()),
        ),
    ];
    for (label, outcome) in &steps {
        print_outcome(label, outcome);
    }

    let outcome = wizard
        .submit_program_specific_questions(program_answers())
        .await;
    print_outcome("Program-specific questions", &outcome);

    if wizard.confirmation_mounted() {
        println!("  Confirmation shown; the form was cleared for the next applicant");
    }
}

fn print_outcome(label: &str, outcome: &StepOutcome) {
    match outcome {
        StepOutcome::Advanced { next } => println!("- {label}: saved, next {}", next.path()),
        StepOutcome::Invalid { errors } => {
            println!("- {label}: {errors}");
            for error in &errors.errors {
                println!("    {}: {}", error.field, error.message);
            }
        }
        StepOutcome::Redirect { to } => println!("- {label}: redirected to {}", to.path()),
        StepOutcome::Submission { report } => {
            println!("- {label}: {}", report.notice.message());
            if let Some(route) = report.navigate_to {
                println!("  Navigating to {}", route.path());
            }
        }
        StepOutcome::Rejected { reason } => println!("- {label}: ignored ({reason})"),
    }
}

fn program_selection() -> ProgramSelectionSection {
    ProgramSelectionSection {
        opted_in_to_healthy_habits: true,
        opted_in_to_get_preventative_screenings: true,
        ..ProgramSelectionSection::default()
    }
}

fn general_information(email: &str) -> GeneralInformationDraft {
    GeneralInformationDraft {
        first_name: Some("Marcus".to_string()),
        last_name: Some("Hale".to_string()),
        date_of_birth: Some("1972-11-02".to_string()),
        sex: Some("male".to_string()),
        email: Some(email.to_string()),
        phone_number: Some("(417) 555-0192".to_string()),
        street_address: Some("880 Freight Ln".to_string()),
        city: Some("Springfield".to_string()),
        state: Some("MO".to_string()),
        zip_code: Some("65802".to_string()),
    }
}

fn qualifying_questions() -> QualifyingQuestionsDraft {
    QualifyingQuestionsDraft {
        is_commercial_driver: Some(true),
        driver_type: Some("owner_operator".to_string()),
        has_health_insurance: Some(true),
        has_primary_care_provider: Some(true),
    }
}

fn program_answers() -> ProgramSpecificQuestionsDraft {
    ProgramSpecificQuestionsDraft {
        healthy_habits_and_diabetes_prevention: Some(HealthyHabitsDraft {
            weight_lbs: Some(NumericInput::from("226")),
            height_feet: Some(NumericInput::from(6.0)),
            height_inches: Some(NumericInput::from(1.0)),
            systolic_blood_pressure: Some(NumericInput::from(128.0)),
            diastolic_blood_pressure: Some(NumericInput::from("84")),
            has_had_glucose_or_a1c_test_in_past_year: Some(false),
            glucose_or_a1c_test_result: Some("Not tested".to_string()),
            movement_and_activity_ranking: Some(NumericInput::from(2.0)),
            energy_ranking: Some(NumericInput::from(3.0)),
            sleep_ranking: Some(NumericInput::from("2")),
            emotional_health_ranking: Some(NumericInput::from(4.0)),
            water_bottles_per_day: Some("3".to_string()),
            fruit_and_vegetable_servings_per_day: Some("2".to_string()),
            other_illness_or_injury: Some("None".to_string()),
            biggest_healthy_living_challenge: Some("Long shifts".to_string()),
            short_term_health_goals: Some("Sleep more".to_string()),
            long_term_health_goals: Some("Drive ten more years".to_string()),
            devices: HealthDevices {
                has_scale: true,
                has_blood_pressure_cuff: true,
                ..HealthDevices::default()
            },
            healthy_habits_hopeful_learnings: Some("Meal prep on the road".to_string()),
            diabetes_prevention_hopeful_learnings: None,
        }),
        get_preventative_screenings: Some(GetPreventativeScreeningsDraft {
            requested_screenings: Some(vec!["colon_colorectal".to_string()]),
            has_had_screening_in_past_year: Some(false),
        }),
        ..ProgramSpecificQuestionsDraft::default()
    }
}
