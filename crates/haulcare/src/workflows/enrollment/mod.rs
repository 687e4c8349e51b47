//! Enrollment form wizard: ordered sections, per-section validation,
//! conditional program questions, a single guarded submission and staff
//! review of the applications it opens.

pub mod applications;
pub mod domain;
pub mod programs;
pub mod registry;
pub mod router;
pub mod service;
pub mod store;
pub mod submission;
pub mod validation;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use applications::{applications_router, ApplicationsState, PendingApplication};
pub use domain::{
    CompletedSections, DriverType, EnrollmentForm, EnrollmentSubmission, GeneralInformationSection,
    GetPreventativeScreeningsAnswers, HealthDevices, HealthyHabitsAndDiabetesPreventionAnswers,
    LikertRank, MissingSection, ProgramSelectionSection, ProgramSpecificQuestionsSection,
    QualifyingQuestionsSection, RigsWithoutCigsAnswers, ScreeningKind, Section, SectionUpdate,
    ServingsPerDay, Sex, TobaccoForm, VaccineKind, VaccineVoucherAnswers, WaterBottlesPerDay,
};
pub use programs::{required_subsections, Program, QuestionSubsection};
pub use registry::{RegistryError, WizardRegistry};
pub use router::enrollment_router;
pub use service::EnrollmentService;
pub use store::EnrollmentFormStore;
pub use submission::{
    EnrollmentGateway, Notice, SubmissionMachine, SubmissionRejected, SubmissionReport,
    SubmissionState, WizardRoute,
};
pub use validation::{FieldError, ValidationErrors};
pub use wizard::{EnrollmentWizard, FinalStep, StepOutcome, WizardSnapshot};
