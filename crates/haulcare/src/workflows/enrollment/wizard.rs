use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

use super::domain::{
    CompletedSections, EnrollmentForm, EnrollmentSubmission, ProgramSelectionSection, Section,
    SectionUpdate,
};
use super::store::EnrollmentFormStore;
use super::submission::{
    submit_with_timeout, EnrollmentGateway, SubmissionMachine, SubmissionRejected,
    SubmissionReport, SubmissionState, WizardRoute,
};
use super::validation::{
    validate_general_information, validate_program_selection,
    validate_program_specific_questions, validate_qualifying_questions, GeneralInformationDraft,
    ProgramSpecificQuestionsDraft, QualifyingQuestionsDraft, ValidationErrors,
};
use crate::outcome::ApiResult;

/// Result of submitting one wizard section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Section stored; continue to `next`.
    Advanced { next: WizardRoute },
    /// Section rejected; nothing stored, no navigation.
    Invalid { errors: ValidationErrors },
    /// An earlier section is incomplete.
    Redirect { to: WizardRoute },
    Submission { report: SubmissionReport },
    Rejected { reason: SubmissionRejected },
}

/// First phase of the final section: either a payload to send or a settled outcome.
#[derive(Debug)]
pub enum FinalStep {
    Submit(EnrollmentSubmission),
    Done(StepOutcome),
}

#[derive(Debug, Clone, Serialize)]
pub struct WizardSnapshot {
    pub form: EnrollmentForm,
    pub completed_sections: CompletedSections,
    pub submission: SubmissionState,
    pub current_route: WizardRoute,
}

/// One applicant's pass through the enrollment form.
///
/// Sections are stored only after validating, in order. The program-specific
/// section is the single submission edge: completing it starts exactly one
/// gateway call, and the store is cleared only once the confirmation view is
/// mounted after a successful submission.
pub struct EnrollmentWizard<G: ?Sized> {
    store: EnrollmentFormStore,
    submission: SubmissionMachine,
    awaiting_confirmation: bool,
    gateway: Arc<G>,
    timeout: Duration,
}

impl<G> EnrollmentWizard<G>
where
    G: EnrollmentGateway + ?Sized,
{
    pub fn new(gateway: Arc<G>, timeout: Duration) -> Self {
        Self {
            store: EnrollmentFormStore::new(),
            submission: SubmissionMachine::default(),
            awaiting_confirmation: false,
            gateway,
            timeout,
        }
    }

    pub fn store(&self) -> &EnrollmentFormStore {
        &self.store
    }

    pub fn submission_state(&self) -> &SubmissionState {
        self.submission.state()
    }

    pub fn gateway(&self) -> Arc<G> {
        Arc::clone(&self.gateway)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn current_route(&self) -> WizardRoute {
        if matches!(self.submission.state(), SubmissionState::Submitted) {
            return WizardRoute::Submitted;
        }
        self.store
            .first_incomplete_section()
            .map(WizardRoute::from)
            .unwrap_or(WizardRoute::ProgramSpecificQuestions)
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        WizardSnapshot {
            form: self.store.form().clone(),
            completed_sections: self.store.completed_sections(),
            submission: self.submission.state().clone(),
            current_route: self.current_route(),
        }
    }

    pub fn submit_general_information(&mut self, draft: GeneralInformationDraft) -> StepOutcome {
        self.submit_general_information_on(draft, Utc::now().date_naive())
    }

    /// As [`Self::submit_general_information`], judging the birth date against `today`.
    pub fn submit_general_information_on(
        &mut self,
        draft: GeneralInformationDraft,
        today: NaiveDate,
    ) -> StepOutcome {
        match validate_general_information(draft, today) {
            Ok(section) => self.advance(SectionUpdate::GeneralInformation(section)),
            Err(errors) => StepOutcome::Invalid { errors },
        }
    }

    pub fn submit_qualifying_questions(&mut self, draft: QualifyingQuestionsDraft) -> StepOutcome {
        if let Some(redirect) = self.redirect_unless_ready(Section::QualifyingQuestions) {
            return redirect;
        }
        match validate_qualifying_questions(draft) {
            Ok(section) => self.advance(SectionUpdate::QualifyingQuestions(section)),
            Err(errors) => StepOutcome::Invalid { errors },
        }
    }

    pub fn submit_program_selection(&mut self, selection: ProgramSelectionSection) -> StepOutcome {
        if let Some(redirect) = self.redirect_unless_ready(Section::ProgramSelection) {
            return redirect;
        }
        match validate_program_selection(selection) {
            Ok(section) => self.advance(SectionUpdate::ProgramSelection(section)),
            Err(errors) => StepOutcome::Invalid { errors },
        }
    }

    /// Validate and store the final section, then submit the assembled form.
    pub async fn submit_program_specific_questions(
        &mut self,
        draft: ProgramSpecificQuestionsDraft,
    ) -> StepOutcome {
        match self.begin_submission(draft) {
            FinalStep::Done(outcome) => outcome,
            FinalStep::Submit(submission) => {
                let gateway = self.gateway();
                let outcome = submit_with_timeout(&*gateway, submission, self.timeout).await;
                self.finish_submission(outcome)
            }
        }
    }

    /// First phase of the final section; the caller must send the payload and
    /// then call [`Self::finish_submission`].
    pub fn begin_submission(&mut self, draft: ProgramSpecificQuestionsDraft) -> FinalStep {
        if let Some(redirect) = self.redirect_unless_ready(Section::ProgramSpecificQuestions) {
            return FinalStep::Done(redirect);
        }

        let selection = self.store.form().program_selection_section;
        let section = match validate_program_specific_questions(draft, &selection) {
            Ok(section) => section,
            Err(errors) => return FinalStep::Done(StepOutcome::Invalid { errors }),
        };

        // A rejected edge must not touch the answers already in flight.
        if let Err(reason) = self.submission.begin() {
            debug!(%reason, "submission edge ignored");
            return FinalStep::Done(StepOutcome::Rejected { reason });
        }
        self.store
            .update_section(SectionUpdate::ProgramSpecificQuestions(section));

        match self.store.form().assemble() {
            Ok(submission) => FinalStep::Submit(submission),
            Err(missing) => {
                self.submission.reset();
                FinalStep::Done(StepOutcome::Redirect {
                    to: WizardRoute::from(missing.0),
                })
            }
        }
    }

    pub fn finish_submission(&mut self, outcome: ApiResult<()>) -> StepOutcome {
        let report = self.submission.finish(outcome);
        self.awaiting_confirmation = report.outcome.is_ok();
        StepOutcome::Submission { report }
    }

    /// Mounting the confirmation view clears the form; returns whether it did.
    pub fn confirmation_mounted(&mut self) -> bool {
        if !self.awaiting_confirmation {
            return false;
        }
        self.awaiting_confirmation = false;
        self.store.reset();
        self.submission.reset();
        true
    }

    fn redirect_unless_ready(&self, section: Section) -> Option<StepOutcome> {
        (!self.store.predecessors_completed(section)).then_some(StepOutcome::Redirect {
            to: WizardRoute::GeneralInformation,
        })
    }

    fn advance(&mut self, update: SectionUpdate) -> StepOutcome {
        let section = update.section();
        self.store.update_section(update);
        let next = section
            .next()
            .map(WizardRoute::from)
            .unwrap_or(WizardRoute::Submitted);
        StepOutcome::Advanced { next }
    }
}
