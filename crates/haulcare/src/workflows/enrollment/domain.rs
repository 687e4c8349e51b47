use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::programs::{required_subsections, Program, QuestionSubsection};

/// Ordered pages of the enrollment wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    GeneralInformation,
    QualifyingQuestions,
    ProgramSelection,
    ProgramSpecificQuestions,
}

impl Section {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::GeneralInformation,
            Self::QualifyingQuestions,
            Self::ProgramSelection,
            Self::ProgramSpecificQuestions,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::GeneralInformation => "General Information",
            Self::QualifyingQuestions => "Qualifying Questions",
            Self::ProgramSelection => "Program Selection",
            Self::ProgramSpecificQuestions => "Program Specific Questions",
        }
    }

    /// Path segment used by routes addressing this section.
    pub const fn slug(self) -> &'static str {
        match self {
            Self::GeneralInformation => "general-information",
            Self::QualifyingQuestions => "qualifying-questions",
            Self::ProgramSelection => "program-selection",
            Self::ProgramSpecificQuestions => "program-specific-questions",
        }
    }

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|section| section.slug() == slug)
    }

    /// Sections that must be complete before this one may be submitted.
    pub fn predecessors(self) -> impl Iterator<Item = Section> {
        Self::ordered()
            .into_iter()
            .take_while(move |section| *section != self)
    }

    pub fn next(self) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .skip_while(|section| *section != self)
            .nth(1)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
    Other,
    PreferNotToSay,
}

/// Identity and contact details of the applicant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralInformationSection {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub sex: Sex,
    pub email: String,
    pub phone_number: String,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverType {
    OwnerOperator,
    CompanyDriver,
    Retired,
    Other,
}

/// Eligibility answers collected before program selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifyingQuestionsSection {
    pub is_commercial_driver: bool,
    pub driver_type: DriverType,
    pub has_health_insurance: bool,
    pub has_primary_care_provider: bool,
}

/// One opt-in flag per enrollable program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramSelectionSection {
    #[serde(default)]
    pub opted_in_to_healthy_habits: bool,
    #[serde(default)]
    pub opted_in_to_diabetes_prevention: bool,
    #[serde(default)]
    pub opted_in_to_rigs_without_cigs: bool,
    #[serde(default)]
    pub opted_in_to_vaccine_voucher: bool,
    #[serde(default)]
    pub opted_in_to_get_preventative_screenings: bool,
}

impl ProgramSelectionSection {
    pub fn opted_in_programs(&self) -> Vec<Program> {
        Program::ordered()
            .into_iter()
            .filter(|program| program.is_opted_in(self))
            .collect()
    }

    pub fn any(&self) -> bool {
        Program::ordered()
            .into_iter()
            .any(|program| program.is_opted_in(self))
    }
}

/// Self-assessment rank from 1 (worst) to 5 (best).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct LikertRank(u8);

impl LikertRank {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX)
            .contains(&value)
            .then_some(Self(value))
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for LikertRank {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| {
            format!(
                "rank must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )
        })
    }
}

impl From<LikertRank> for u8 {
    fn from(rank: LikertRank) -> Self {
        rank.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WaterBottlesPerDay {
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5+")]
    FivePlus,
}

impl WaterBottlesPerDay {
    pub fn from_answer(answer: &str) -> Option<Self> {
        match answer.trim() {
            "1" => Some(Self::One),
            "2" => Some(Self::Two),
            "3" => Some(Self::Three),
            "4" => Some(Self::Four),
            "5+" => Some(Self::FivePlus),
            _ => None,
        }
    }
}

/// Daily fruit and vegetable servings, capped at "10+".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServingsPerDay(u8);

impl ServingsPerDay {
    const CAP: u8 = 10;

    pub fn from_answer(answer: &str) -> Option<Self> {
        let answer = answer.trim();
        if answer == "10+" {
            return Some(Self(Self::CAP));
        }
        answer
            .parse::<u8>()
            .ok()
            .filter(|servings| *servings < Self::CAP)
            .map(Self)
    }

    pub const fn servings(self) -> u8 {
        self.0
    }
}

impl TryFrom<String> for ServingsPerDay {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_answer(&value).ok_or_else(|| format!("'{value}' is not one of 0-9 or 10+"))
    }
}

impl From<ServingsPerDay> for String {
    fn from(value: ServingsPerDay) -> Self {
        if value.0 >= ServingsPerDay::CAP {
            "10+".to_string()
        } else {
            value.0.to_string()
        }
    }
}

/// Health devices the applicant already owns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthDevices {
    pub has_scale: bool,
    pub has_blood_pressure_cuff: bool,
    pub has_glucose_monitor: bool,
    pub has_a1c_home_test: bool,
    pub has_fitness_tracker: bool,
    pub has_body_tape_measure: bool,
    pub has_resistance_bands: bool,
    pub has_other_exercise_equipment: bool,
    pub none_of_the_above: bool,
}

/// Questions shared by Healthy Habits and Diabetes Prevention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthyHabitsAndDiabetesPreventionAnswers {
    pub weight_lbs: f64,
    pub height_feet: u8,
    pub height_inches: u8,
    pub systolic_blood_pressure: u16,
    pub diastolic_blood_pressure: u16,
    pub has_had_glucose_or_a1c_test_in_past_year: bool,
    pub glucose_or_a1c_test_result: String,
    pub movement_and_activity_ranking: LikertRank,
    pub energy_ranking: LikertRank,
    pub sleep_ranking: LikertRank,
    pub emotional_health_ranking: LikertRank,
    pub water_bottles_per_day: WaterBottlesPerDay,
    pub fruit_and_vegetable_servings_per_day: ServingsPerDay,
    pub other_illness_or_injury: String,
    pub biggest_healthy_living_challenge: String,
    pub short_term_health_goals: String,
    pub long_term_health_goals: String,
    pub devices: HealthDevices,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthy_habits_hopeful_learnings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diabetes_prevention_hopeful_learnings: Option<String>,
}

impl HealthyHabitsAndDiabetesPreventionAnswers {
    pub fn height_total_inches(&self) -> u16 {
        u16::from(self.height_feet) * 12 + u16::from(self.height_inches)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TobaccoForm {
    Cigarettes,
    Cigars,
    Pipe,
    SmokelessTobacco,
    ECigarettes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RigsWithoutCigsAnswers {
    pub tobacco_forms: Vec<TobaccoForm>,
    pub tobacco_usage_length: String,
    pub has_attempted_to_quit: bool,
    pub reason_for_quitting: String,
    pub readiness_to_quit_ranking: LikertRank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaccineKind {
    Flu,
    Covid19,
    Pneumonia,
    Shingles,
    Tetanus,
    HepatitisB,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccineVoucherAnswers {
    pub vaccines: Vec<VaccineKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_vaccine: Option<String>,
    pub voucher_location: String,
}

/// Screenings offered through Get Preventative Screenings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningKind {
    ColonColorectal,
    Prostate,
    CervicalCancer,
}

impl ScreeningKind {
    pub const fn ordered() -> [Self; 3] {
        [Self::ColonColorectal, Self::Prostate, Self::CervicalCancer]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ColonColorectal => "Colon / Colorectal Screening",
            Self::Prostate => "Prostate Screening",
            Self::CervicalCancer => "Cervical Cancer Screening",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetPreventativeScreeningsAnswers {
    pub requested_screenings: Vec<ScreeningKind>,
    pub has_had_screening_in_past_year: bool,
}

/// Per-program answers; only sub-objects of opted-in programs are required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgramSpecificQuestionsSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthy_habits_and_diabetes_prevention: Option<HealthyHabitsAndDiabetesPreventionAnswers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rigs_without_cigs: Option<RigsWithoutCigsAnswers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vaccine_voucher: Option<VaccineVoucherAnswers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get_preventative_screenings: Option<GetPreventativeScreeningsAnswers>,
}

impl ProgramSpecificQuestionsSection {
    pub fn has_subsection(&self, subsection: QuestionSubsection) -> bool {
        match subsection {
            QuestionSubsection::HealthyHabitsAndDiabetesPrevention => {
                self.healthy_habits_and_diabetes_prevention.is_some()
            }
            QuestionSubsection::RigsWithoutCigs => self.rigs_without_cigs.is_some(),
            QuestionSubsection::VaccineVoucher => self.vaccine_voucher.is_some(),
            QuestionSubsection::GetPreventativeScreenings => {
                self.get_preventative_screenings.is_some()
            }
        }
    }

    /// Take every sub-object present in `other`, keeping ours where it is absent.
    pub fn merge(&mut self, other: ProgramSpecificQuestionsSection) {
        if other.healthy_habits_and_diabetes_prevention.is_some() {
            self.healthy_habits_and_diabetes_prevention =
                other.healthy_habits_and_diabetes_prevention;
        }
        if other.rigs_without_cigs.is_some() {
            self.rigs_without_cigs = other.rigs_without_cigs;
        }
        if other.vaccine_voucher.is_some() {
            self.vaccine_voucher = other.vaccine_voucher;
        }
        if other.get_preventative_screenings.is_some() {
            self.get_preventative_screenings = other.get_preventative_screenings;
        }
    }

    /// Drop sub-objects belonging to programs that are not opted in.
    pub fn pruned_for(&self, selection: &ProgramSelectionSection) -> Self {
        let required = required_subsections(selection);
        let keep = |subsection: QuestionSubsection| required.contains(&subsection);

        Self {
            healthy_habits_and_diabetes_prevention: self
                .healthy_habits_and_diabetes_prevention
                .clone()
                .filter(|_| keep(QuestionSubsection::HealthyHabitsAndDiabetesPrevention)),
            rigs_without_cigs: self
                .rigs_without_cigs
                .clone()
                .filter(|_| keep(QuestionSubsection::RigsWithoutCigs)),
            vaccine_voucher: self
                .vaccine_voucher
                .clone()
                .filter(|_| keep(QuestionSubsection::VaccineVoucher)),
            get_preventative_screenings: self
                .get_preventative_screenings
                .clone()
                .filter(|_| keep(QuestionSubsection::GetPreventativeScreenings)),
        }
    }
}

/// The in-progress form held by a wizard session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentForm {
    pub general_information_section: Option<GeneralInformationSection>,
    pub qualifying_questions_section: Option<QualifyingQuestionsSection>,
    pub program_selection_section: ProgramSelectionSection,
    pub program_specific_questions_section: ProgramSpecificQuestionsSection,
}

impl EnrollmentForm {
    /// Assemble the submission payload, pruning answers for programs not opted in.
    pub fn assemble(&self) -> Result<EnrollmentSubmission, MissingSection> {
        let general_information_section = self
            .general_information_section
            .clone()
            .ok_or(MissingSection(Section::GeneralInformation))?;
        let qualifying_questions_section = self
            .qualifying_questions_section
            .ok_or(MissingSection(Section::QualifyingQuestions))?;
        let program_selection_section = self.program_selection_section;
        if !program_selection_section.any() {
            return Err(MissingSection(Section::ProgramSelection));
        }

        let program_specific_questions_section = self
            .program_specific_questions_section
            .pruned_for(&program_selection_section);
        if let Some(missing) = required_subsections(&program_selection_section)
            .into_iter()
            .find(|subsection| !program_specific_questions_section.has_subsection(*subsection))
        {
            tracing::debug!(subsection = missing.field_name(), "program answers missing");
            return Err(MissingSection(Section::ProgramSpecificQuestions));
        }

        Ok(EnrollmentSubmission {
            general_information_section,
            qualifying_questions_section,
            program_selection_section,
            program_specific_questions_section,
        })
    }
}

/// A complete enrollment form ready for the record boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentSubmission {
    pub general_information_section: GeneralInformationSection,
    pub qualifying_questions_section: QualifyingQuestionsSection,
    pub program_selection_section: ProgramSelectionSection,
    pub program_specific_questions_section: ProgramSpecificQuestionsSection,
}

impl EnrollmentSubmission {
    pub fn email(&self) -> &str {
        &self.general_information_section.email
    }

    pub fn opted_in_programs(&self) -> Vec<Program> {
        self.program_selection_section.opted_in_programs()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{0} section has not been completed")]
pub struct MissingSection(pub Section);

/// Completion flag per section; only a reset clears them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedSections {
    pub general_information_section_completed: bool,
    pub qualifying_questions_section_completed: bool,
    pub program_selection_section_completed: bool,
    pub program_specific_questions_section_completed: bool,
}

impl CompletedSections {
    pub const fn is_completed(&self, section: Section) -> bool {
        match section {
            Section::GeneralInformation => self.general_information_section_completed,
            Section::QualifyingQuestions => self.qualifying_questions_section_completed,
            Section::ProgramSelection => self.program_selection_section_completed,
            Section::ProgramSpecificQuestions => {
                self.program_specific_questions_section_completed
            }
        }
    }

    pub(crate) fn mark_completed(&mut self, section: Section) {
        let flag = match section {
            Section::GeneralInformation => &mut self.general_information_section_completed,
            Section::QualifyingQuestions => &mut self.qualifying_questions_section_completed,
            Section::ProgramSelection => &mut self.program_selection_section_completed,
            Section::ProgramSpecificQuestions => {
                &mut self.program_specific_questions_section_completed
            }
        };
        *flag = true;
    }

    pub fn all_completed(&self) -> bool {
        Section::ordered()
            .into_iter()
            .all(|section| self.is_completed(section))
    }
}

/// Validated data for one section, as handed to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionUpdate {
    GeneralInformation(GeneralInformationSection),
    QualifyingQuestions(QualifyingQuestionsSection),
    ProgramSelection(ProgramSelectionSection),
    ProgramSpecificQuestions(ProgramSpecificQuestionsSection),
}

impl SectionUpdate {
    pub const fn section(&self) -> Section {
        match self {
            SectionUpdate::GeneralInformation(_) => Section::GeneralInformation,
            SectionUpdate::QualifyingQuestions(_) => Section::QualifyingQuestions,
            SectionUpdate::ProgramSelection(_) => Section::ProgramSelection,
            SectionUpdate::ProgramSpecificQuestions(_) => Section::ProgramSpecificQuestions,
        }
    }
}
