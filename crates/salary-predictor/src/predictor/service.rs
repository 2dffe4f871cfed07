use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use rand::Rng;
use tracing::{debug, error};

use super::client::{PredictionError, PredictionService};
use super::domain::{FormField, PredictionResult, SelectionError};
use super::form::{PredictionForm, SubmitOutcome};
use super::view::FormView;

/// Sessions kept before the oldest form is dropped.
pub const DEFAULT_SESSION_CAPACITY: usize = 10_000;

/// Opaque per-visitor key, carried in a browser-session cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    fn generate() -> Self {
        Self(format!("{:032x}", rand::thread_rng().gen::<u128>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Default)]
struct SessionStore {
    forms: HashMap<SessionId, PredictionForm>,
    order: VecDeque<SessionId>,
}

impl SessionStore {
    fn insert(&mut self, session: SessionId, capacity: usize) {
        self.forms.insert(session.clone(), PredictionForm::new());
        self.order.push_back(session);
        while self.forms.len() > capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.forms.remove(&oldest);
                    debug!(session = oldest.as_str(), "evicted prediction form session");
                }
                None => break,
            }
        }
    }

    /// Form for `session`, recreating it if it was evicted.
    fn form_mut(&mut self, session: &SessionId, capacity: usize) -> &mut PredictionForm {
        if !self.forms.contains_key(session) {
            self.insert(session.clone(), capacity);
        }
        self.forms
            .entry(session.clone())
            .or_insert_with(PredictionForm::new)
    }
}

/// Owns one form per visitor session and drives submissions against `S`.
///
/// The store lock is only held for the synchronous halves of a submission, so a second
/// submit arriving while the first awaits the upstream observes `Loading` and is turned
/// away. The upstream call and its resolution run in a spawned task: a caller that goes
/// away mid-request cannot leave its form stuck in `Loading`.
pub struct PredictionFormService<S> {
    sessions: Arc<Mutex<SessionStore>>,
    predictor: Arc<S>,
    capacity: usize,
}

impl<S> PredictionFormService<S>
where
    S: PredictionService + 'static,
{
    pub fn new(predictor: S) -> Self {
        Self::with_capacity(predictor, DEFAULT_SESSION_CAPACITY)
    }

    pub fn with_capacity(predictor: S, capacity: usize) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(SessionStore::default())),
            predictor: Arc::new(predictor),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionStore> {
        self.sessions.lock().expect("prediction form mutex poisoned")
    }

    /// Resolves a presented session key. Unknown or missing keys get a fresh session;
    /// the flag reports whether one was created.
    pub fn open_session(&self, presented: Option<&str>) -> (SessionId, bool) {
        let mut store = self.lock();
        if let Some(raw) = presented {
            let session = SessionId(raw.to_string());
            if store.forms.contains_key(&session) {
                return (session, false);
            }
        }
        let session = SessionId::generate();
        store.insert(session.clone(), self.capacity);
        (session, true)
    }

    pub fn session_count(&self) -> usize {
        self.lock().forms.len()
    }

    pub fn view(&self, session: &SessionId) -> FormView {
        self.lock().form_mut(session, self.capacity).view()
    }

    pub fn select(
        &self,
        session: &SessionId,
        field: FormField,
        value: &str,
    ) -> Result<FormView, SelectionError> {
        let mut store = self.lock();
        let form = store.form_mut(session, self.capacity);
        form.select_field(field, value)?;
        Ok(form.view())
    }

    /// Applies several selects at once; nothing changes if any value is rejected.
    pub fn select_all(
        &self,
        session: &SessionId,
        changes: &[(FormField, &str)],
    ) -> Result<FormView, SelectionError> {
        let mut store = self.lock();
        let form = store.form_mut(session, self.capacity);
        let mut staged = form.clone();
        for (field, value) in changes {
            staged.select_field(*field, value)?;
        }
        *form = staged;
        Ok(form.view())
    }

    pub async fn submit(&self, session: &SessionId) -> (SubmitOutcome, FormView) {
        let request = {
            let mut store = self.lock();
            let form = store.form_mut(session, self.capacity);
            match form.begin_submit() {
                Ok(request) => request,
                Err(blocked) => return (SubmitOutcome::Blocked(blocked), form.view()),
            }
        };

        let predictor = Arc::clone(&self.predictor);
        let sessions = Arc::clone(&self.sessions);
        let capacity = self.capacity;
        let owner = session.clone();
        let task = tokio::spawn(async move {
            let outcome = predictor.predict(request).await;
            resolve_in(&sessions, &owner, capacity, outcome)
        });

        match task.await {
            Ok(resolved) => resolved,
            Err(err) => {
                error!(error = %err, "prediction task did not finish");
                resolve_in(
                    &self.sessions,
                    session,
                    self.capacity,
                    Err(PredictionError::Transport(format!(
                        "prediction task did not finish: {err}"
                    ))),
                )
            }
        }
    }
}

fn resolve_in(
    sessions: &Mutex<SessionStore>,
    session: &SessionId,
    capacity: usize,
    outcome: Result<PredictionResult, PredictionError>,
) -> (SubmitOutcome, FormView) {
    let mut store = sessions.lock().expect("prediction form mutex poisoned");
    let form = store.form_mut(session, capacity);
    let outcome = form.resolve(outcome);
    (outcome, form.view())
}
