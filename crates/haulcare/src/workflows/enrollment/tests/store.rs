use super::common::*;

use crate::workflows::enrollment::domain::{
    CompletedSections, EnrollmentForm, ProgramSelectionSection, ProgramSpecificQuestionsSection,
    Section, SectionUpdate,
};
use crate::workflows::enrollment::store::EnrollmentFormStore;
use crate::workflows::enrollment::validation::{
    validate_general_information, validate_program_specific_questions,
    validate_qualifying_questions, ProgramSpecificQuestionsDraft,
};

#[test]
fn new_store_is_empty_and_starts_at_general_information() {
    let store = EnrollmentFormStore::new();
    assert_eq!(store.form(), &EnrollmentForm::default());
    assert!(!store.completed_sections().all_completed());
    assert_eq!(
        store.first_incomplete_section(),
        Some(Section::GeneralInformation)
    );
    assert!(store.predecessors_completed(Section::GeneralInformation));
    assert!(!store.predecessors_completed(Section::QualifyingQuestions));
}

#[test]
fn update_section_stores_data_and_marks_completion() {
    let mut store = EnrollmentFormStore::new();
    let general = validate_general_information(general_information(), today()).expect("valid");
    store.update_section(SectionUpdate::GeneralInformation(general.clone()));

    assert_eq!(store.form().general_information_section, Some(general));
    assert!(store
        .completed_sections()
        .is_completed(Section::GeneralInformation));
    assert_eq!(
        store.first_incomplete_section(),
        Some(Section::QualifyingQuestions)
    );
}

#[test]
fn program_answers_merge_per_block() {
    let selection = healthy_habits_and_rigs();
    let mut store = EnrollmentFormStore::new();

    let first = validate_program_specific_questions(program_answers(), &selection)
        .expect("valid answers");
    store.update_section(SectionUpdate::ProgramSpecificQuestions(first));

    let mut rigs_only = ProgramSpecificQuestionsSection::default();
    let mut changed = program_answers();
    if let Some(rigs) = changed.rigs_without_cigs.as_mut() {
        rigs.reason_for_quitting = Some("Doctor's orders".to_string());
    }
    rigs_only.rigs_without_cigs = validate_program_specific_questions(changed, &selection)
        .expect("valid answers")
        .rigs_without_cigs;
    store.update_section(SectionUpdate::ProgramSpecificQuestions(rigs_only));

    let answers = &store.form().program_specific_questions_section;
    assert!(answers.healthy_habits_and_diabetes_prevention.is_some());
    assert_eq!(
        answers
            .rigs_without_cigs
            .as_ref()
            .map(|rigs| rigs.reason_for_quitting.as_str()),
        Some("Doctor's orders")
    );
}

#[test]
fn reset_clears_data_and_flags() {
    let mut store = EnrollmentFormStore::new();
    store.update_section(SectionUpdate::QualifyingQuestions(
        validate_qualifying_questions(qualifying_questions()).expect("valid"),
    ));
    store.update_section(SectionUpdate::ProgramSelection(healthy_habits_only()));

    store.reset();

    assert_eq!(store.form(), &EnrollmentForm::default());
    assert_eq!(store.completed_sections(), CompletedSections::default());
}

#[test]
fn assemble_prunes_answers_for_programs_not_selected() {
    let mut store = EnrollmentFormStore::new();
    store.update_section(SectionUpdate::GeneralInformation(
        validate_general_information(general_information(), today()).expect("valid"),
    ));
    store.update_section(SectionUpdate::QualifyingQuestions(
        validate_qualifying_questions(qualifying_questions()).expect("valid"),
    ));
    store.update_section(SectionUpdate::ProgramSelection(healthy_habits_and_rigs()));
    store.update_section(SectionUpdate::ProgramSpecificQuestions(
        validate_program_specific_questions(program_answers(), &healthy_habits_and_rigs())
            .expect("valid"),
    ));

    // Applicant goes back and drops Rigs Without Cigs.
    store.update_section(SectionUpdate::ProgramSelection(healthy_habits_only()));

    let submission = store.form().assemble().expect("form assembles");
    assert!(submission
        .program_specific_questions_section
        .rigs_without_cigs
        .is_none());
    assert!(submission
        .program_specific_questions_section
        .healthy_habits_and_diabetes_prevention
        .is_some());
}

#[test]
fn assemble_reports_first_missing_section() {
    let store = EnrollmentFormStore::new();
    let missing = store.form().assemble().expect_err("empty form");
    assert_eq!(missing.0, Section::GeneralInformation);

    let mut store = EnrollmentFormStore::new();
    store.update_section(SectionUpdate::GeneralInformation(
        validate_general_information(general_information(), today()).expect("valid"),
    ));
    store.update_section(SectionUpdate::QualifyingQuestions(
        validate_qualifying_questions(qualifying_questions()).expect("valid"),
    ));
    store.update_section(SectionUpdate::ProgramSelection(ProgramSelectionSection {
        opted_in_to_vaccine_voucher: true,
        ..ProgramSelectionSection::default()
    }));
    store.update_section(SectionUpdate::ProgramSpecificQuestions(
        validate_program_specific_questions(
            ProgramSpecificQuestionsDraft::default(),
            &ProgramSelectionSection::default(),
        )
        .expect("nothing required"),
    ));
    let missing = store.form().assemble().expect_err("vaccine answers missing");
    assert_eq!(missing.0, Section::ProgramSpecificQuestions);
}
