use super::domain::{CompletedSections, EnrollmentForm, Section, SectionUpdate};

/// Session-owned state of one in-progress enrollment form.
///
/// All mutation goes through [`EnrollmentFormStore::update_section`] and
/// [`EnrollmentFormStore::reset`], keeping the completion flags consistent
/// with the data they describe. The store does not validate; callers run the
/// section validator first.
#[derive(Debug, Clone, Default)]
pub struct EnrollmentFormStore {
    form: EnrollmentForm,
    completed: CompletedSections,
}

impl EnrollmentFormStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(&self) -> &EnrollmentForm {
        &self.form
    }

    pub fn completed_sections(&self) -> CompletedSections {
        self.completed
    }

    pub fn update_section(&mut self, update: SectionUpdate) {
        let section = update.section();
        match update {
            SectionUpdate::GeneralInformation(data) => {
                self.form.general_information_section = Some(data);
            }
            SectionUpdate::QualifyingQuestions(data) => {
                self.form.qualifying_questions_section = Some(data);
            }
            SectionUpdate::ProgramSelection(data) => {
                self.form.program_selection_section = data;
            }
            SectionUpdate::ProgramSpecificQuestions(data) => {
                self.form.program_specific_questions_section.merge(data);
            }
        }
        self.completed.mark_completed(section);
    }

    pub fn reset(&mut self) {
        self.form = EnrollmentForm::default();
        self.completed = CompletedSections::default();
    }

    /// First section, in wizard order, whose flag is still false.
    pub fn first_incomplete_section(&self) -> Option<Section> {
        Section::ordered()
            .into_iter()
            .find(|section| !self.completed.is_completed(*section))
    }

    /// Whether every section before `section` has been completed.
    pub fn predecessors_completed(&self, section: Section) -> bool {
        section
            .predecessors()
            .all(|previous| self.completed.is_completed(previous))
    }
}
