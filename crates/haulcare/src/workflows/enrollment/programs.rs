use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::domain::ProgramSelectionSection;

/// Programs an applicant can enroll in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Program {
    HealthyHabits,
    DiabetesPrevention,
    RigsWithoutCigs,
    VaccineVoucher,
    GetPreventativeScreenings,
}

/// Conditionally required blocks of the program-specific section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSubsection {
    HealthyHabitsAndDiabetesPrevention,
    RigsWithoutCigs,
    VaccineVoucher,
    GetPreventativeScreenings,
}

impl Program {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::HealthyHabits,
            Self::DiabetesPrevention,
            Self::RigsWithoutCigs,
            Self::VaccineVoucher,
            Self::GetPreventativeScreenings,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::HealthyHabits => "Healthy Habits For The Long Haul",
            Self::DiabetesPrevention => "Diabetes Prevention",
            Self::RigsWithoutCigs => "Rigs Without Cigs",
            Self::VaccineVoucher => "Vaccine Voucher",
            Self::GetPreventativeScreenings => "Get Preventative Screenings",
        }
    }

    /// Name of the program-selection field that opts into this program.
    pub const fn opt_in_flag(self) -> &'static str {
        match self {
            Self::HealthyHabits => "opted_in_to_healthy_habits",
            Self::DiabetesPrevention => "opted_in_to_diabetes_prevention",
            Self::RigsWithoutCigs => "opted_in_to_rigs_without_cigs",
            Self::VaccineVoucher => "opted_in_to_vaccine_voucher",
            Self::GetPreventativeScreenings => "opted_in_to_get_preventative_screenings",
        }
    }

    /// Healthy Habits and Diabetes Prevention share one question block.
    pub const fn question_subsection(self) -> QuestionSubsection {
        match self {
            Self::HealthyHabits | Self::DiabetesPrevention => {
                QuestionSubsection::HealthyHabitsAndDiabetesPrevention
            }
            Self::RigsWithoutCigs => QuestionSubsection::RigsWithoutCigs,
            Self::VaccineVoucher => QuestionSubsection::VaccineVoucher,
            Self::GetPreventativeScreenings => QuestionSubsection::GetPreventativeScreenings,
        }
    }

    pub const fn is_opted_in(self, selection: &ProgramSelectionSection) -> bool {
        match self {
            Self::HealthyHabits => selection.opted_in_to_healthy_habits,
            Self::DiabetesPrevention => selection.opted_in_to_diabetes_prevention,
            Self::RigsWithoutCigs => selection.opted_in_to_rigs_without_cigs,
            Self::VaccineVoucher => selection.opted_in_to_vaccine_voucher,
            Self::GetPreventativeScreenings => selection.opted_in_to_get_preventative_screenings,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ordered()
            .into_iter()
            .find(|program| program.label().eq_ignore_ascii_case(label.trim()))
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl QuestionSubsection {
    /// Key of this block inside the program-specific section payload.
    pub const fn field_name(self) -> &'static str {
        match self {
            Self::HealthyHabitsAndDiabetesPrevention => "healthy_habits_and_diabetes_prevention",
            Self::RigsWithoutCigs => "rigs_without_cigs",
            Self::VaccineVoucher => "vaccine_voucher",
            Self::GetPreventativeScreenings => "get_preventative_screenings",
        }
    }
}

/// Question blocks that must be answered for the given opt-in flags.
pub fn required_subsections(selection: &ProgramSelectionSection) -> BTreeSet<QuestionSubsection> {
    Program::ordered()
        .into_iter()
        .filter(|program| program.is_opted_in(selection))
        .map(Program::question_subsection)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection(programs: &[Program]) -> ProgramSelectionSection {
        ProgramSelectionSection {
            opted_in_to_healthy_habits: programs.contains(&Program::HealthyHabits),
            opted_in_to_diabetes_prevention: programs.contains(&Program::DiabetesPrevention),
            opted_in_to_rigs_without_cigs: programs.contains(&Program::RigsWithoutCigs),
            opted_in_to_vaccine_voucher: programs.contains(&Program::VaccineVoucher),
            opted_in_to_get_preventative_screenings: programs
                .contains(&Program::GetPreventativeScreenings),
        }
    }

    #[test]
    fn required_subsections_follow_every_opt_in_combination() {
        let all = Program::ordered();
        for mask in 0u8..(1 << all.len()) {
            let chosen: Vec<Program> = all
                .iter()
                .enumerate()
                .filter(|(bit, _)| mask & (1 << bit) != 0)
                .map(|(_, program)| *program)
                .collect();

            let expected: BTreeSet<QuestionSubsection> = chosen
                .iter()
                .map(|program| program.question_subsection())
                .collect();

            assert_eq!(
                required_subsections(&selection(&chosen)),
                expected,
                "mismatch for {chosen:?}"
            );
        }
    }

    #[test]
    fn diabetes_prevention_alone_requires_shared_block() {
        let required = required_subsections(&selection(&[Program::DiabetesPrevention]));
        assert_eq!(
            required.into_iter().collect::<Vec<_>>(),
            vec![QuestionSubsection::HealthyHabitsAndDiabetesPrevention]
        );
    }

    #[test]
    fn labels_round_trip() {
        for program in Program::ordered() {
            assert_eq!(Program::from_label(program.label()), Some(program));
        }
        assert_eq!(Program::from_label("rigs without cigs"), Some(Program::RigsWithoutCigs));
        assert_eq!(Program::from_label("Yoga"), None);
    }
}
