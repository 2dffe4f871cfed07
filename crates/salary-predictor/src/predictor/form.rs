use serde::Serialize;
use tracing::{debug, info, warn};

use super::client::{PredictionError, PredictionService};
use super::domain::{FormField, FormSelection, PredictionRequest, PredictionResult, SelectionError};
use super::view::{render, FormView};

/// Lifecycle of the latest submission attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum RequestState {
    #[default]
    Idle,
    Loading,
    Error(String),
}

impl RequestState {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            RequestState::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Why a submit call was ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum SubmitBlocked {
    #[error("all four fields must be selected before submitting")]
    Incomplete,
    #[error("a prediction request is already in flight")]
    InFlight,
}

/// What a call to [`PredictionForm::submit`] amounted to.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Blocked(SubmitBlocked),
    Succeeded(PredictionResult),
    Failed(String),
}

/// Form state: the selection, the request lifecycle, and the last successful prediction.
#[derive(Debug, Clone, Default)]
pub struct PredictionForm {
    selection: FormSelection,
    state: RequestState,
    result: Option<PredictionResult>,
}

impl PredictionForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> &FormSelection {
        &self.selection
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        self.result.as_ref()
    }

    /// Updates one select. Neither the request state nor a displayed result is touched.
    pub fn select_field(&mut self, field: FormField, value: &str) -> Result<(), SelectionError> {
        self.selection.set(field, value)?;
        debug!(%field, value, "form field selected");
        Ok(())
    }

    pub fn can_submit(&self) -> bool {
        !self.state.is_loading() && self.selection.is_complete()
    }

    /// First half of a submission: checks the guards and moves to `Loading`.
    ///
    /// Returns the body to post. The caller must hand the call's outcome back through
    /// [`PredictionForm::resolve`].
    pub fn begin_submit(&mut self) -> Result<PredictionRequest, SubmitBlocked> {
        if self.state.is_loading() {
            return Err(SubmitBlocked::InFlight);
        }
        let request = self.selection.request().ok_or(SubmitBlocked::Incomplete)?;
        self.state = RequestState::Loading;
        Ok(request)
    }

    /// Second half of a submission. The previous result survives a failure.
    pub fn resolve(&mut self, outcome: Result<PredictionResult, PredictionError>) -> SubmitOutcome {
        match outcome {
            Ok(result) => {
                info!(
                    salary_usd = result.salary_usd,
                    confidence = result.confidence,
                    "prediction received"
                );
                self.result = Some(result);
                self.state = RequestState::Idle;
                SubmitOutcome::Succeeded(result)
            }
            Err(err) => {
                warn!(error = %err, "prediction failed");
                let message = err.user_message();
                self.state = RequestState::Error(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }

    pub async fn submit<S>(&mut self, service: &S) -> SubmitOutcome
    where
        S: PredictionService,
    {
        let request = match self.begin_submit() {
            Ok(request) => request,
            Err(blocked) => return SubmitOutcome::Blocked(blocked),
        };
        let outcome = service.predict(request).await;
        self.resolve(outcome)
    }

    pub fn view(&self) -> FormView {
        render(&self.selection, &self.state, self.result.as_ref())
    }
}
