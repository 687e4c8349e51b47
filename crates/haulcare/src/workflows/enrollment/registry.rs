use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use super::submission::{submit_with_timeout, EnrollmentGateway};
use super::validation::ProgramSpecificQuestionsDraft;
use super::wizard::{EnrollmentWizard, FinalStep, StepOutcome, WizardSnapshot};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown enrollment session")]
    UnknownSession,
    #[error("session registry unavailable")]
    Unavailable,
}

/// Sessions untouched for this long are dropped.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);

struct Entry<G: ?Sized> {
    wizard: EnrollmentWizard<G>,
    last_touched: Instant,
}

impl<G: ?Sized> Entry<G> {
    fn expired(&self, idle_timeout: Duration) -> bool {
        self.last_touched.elapsed() >= idle_timeout
    }
}

type Sessions<G> = HashMap<String, Entry<G>>;

/// Wizard sessions keyed by opaque id.
///
/// The lock is only held for synchronous wizard steps; the gateway call of
/// the final section runs between [`EnrollmentWizard::begin_submission`] and
/// [`EnrollmentWizard::finish_submission`] with the lock released.
///
/// Idle sessions are swept whenever a new one is opened, and a session is
/// dropped once its confirmation view has been mounted.
pub struct WizardRegistry<G: ?Sized> {
    sessions: Mutex<Sessions<G>>,
    gateway: Arc<G>,
    timeout: Duration,
    idle_timeout: Duration,
}

impl<G> WizardRegistry<G>
where
    G: EnrollmentGateway + ?Sized,
{
    pub fn new(gateway: Arc<G>, timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            gateway,
            timeout,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, Sessions<G>>, RegistryError> {
        self.sessions.lock().map_err(|_| RegistryError::Unavailable)
    }

    pub fn open(&self) -> Result<String, RegistryError> {
        let id = uuid::Uuid::new_v4().to_string();
        let wizard = EnrollmentWizard::new(Arc::clone(&self.gateway), self.timeout);

        let mut sessions = self.lock()?;
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.expired(self.idle_timeout));
        let swept = before - sessions.len();
        if swept > 0 {
            debug!(swept, "expired enrollment sessions dropped");
        }
        sessions.insert(
            id.clone(),
            Entry {
                wizard,
                last_touched: Instant::now(),
            },
        );
        drop(sessions);

        info!(session_id = %id, "enrollment session opened");
        Ok(id)
    }

    pub fn close(&self, id: &str) -> Result<(), RegistryError> {
        self.lock()?
            .remove(id)
            .map(|_| ())
            .ok_or(RegistryError::UnknownSession)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|sessions| sessions.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run a synchronous step against one live session.
    pub fn with_session<T>(
        &self,
        id: &str,
        step: impl FnOnce(&mut EnrollmentWizard<G>) -> T,
    ) -> Result<T, RegistryError> {
        let mut sessions = self.lock()?;
        let entry = live_entry(&mut sessions, id, self.idle_timeout)?;
        entry.last_touched = Instant::now();
        Ok(step(&mut entry.wizard))
    }

    pub fn snapshot(&self, id: &str) -> Result<WizardSnapshot, RegistryError> {
        self.with_session(id, |wizard| wizard.snapshot())
    }

    pub async fn submit_program_specific_questions(
        &self,
        id: &str,
        draft: ProgramSpecificQuestionsDraft,
    ) -> Result<StepOutcome, RegistryError> {
        let submission = match self.with_session(id, |wizard| wizard.begin_submission(draft))? {
            FinalStep::Done(outcome) => return Ok(outcome),
            FinalStep::Submit(submission) => submission,
        };

        debug!(session_id = %id, "submitting enrollment form");
        let outcome = submit_with_timeout(&*self.gateway, submission, self.timeout).await;
        self.with_session(id, |wizard| wizard.finish_submission(outcome))
    }

    /// Mount the confirmation view; a session that resets is closed.
    pub fn confirmation_mounted(&self, id: &str) -> Result<bool, RegistryError> {
        let mut sessions = self.lock()?;
        let reset = live_entry(&mut sessions, id, self.idle_timeout)?
            .wizard
            .confirmation_mounted();
        if reset {
            sessions.remove(id);
            info!(session_id = %id, "enrollment session closed after confirmation");
        }
        Ok(reset)
    }
}

fn live_entry<'a, G: ?Sized>(
    sessions: &'a mut Sessions<G>,
    id: &str,
    idle_timeout: Duration,
) -> Result<&'a mut Entry<G>, RegistryError> {
    if sessions
        .get(id)
        .is_some_and(|entry| entry.expired(idle_timeout))
    {
        sessions.remove(id);
        debug!(session_id = %id, "enrollment session expired");
    }
    sessions.get_mut(id).ok_or(RegistryError::UnknownSession)
}
