use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post, put},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::client::PredictionService;
use super::domain::{FormField, SelectionError};
use super::form::{SubmitBlocked, SubmitOutcome};
use super::service::{PredictionFormService, SessionId};
use crate::error::AppError;

/// Cookie carrying the visitor's [`SessionId`].
pub const SESSION_COOKIE: &str = "salary_predictor_session";

/// Router serving the form page and its JSON twin. Each visitor gets its own form,
/// keyed by the session cookie.
pub fn prediction_router<S>(service: Arc<PredictionFormService<S>>) -> Router
where
    S: PredictionService + 'static,
{
    Router::new()
        .route("/", get(page_handler::<S>))
        .route("/form/selection", post(selection_form_handler::<S>))
        .route("/form/submit", post(submit_form_handler::<S>))
        .route("/api/v1/form", get(view_handler::<S>))
        .route("/api/v1/form/fields/:field", put(select_handler::<S>))
        .route("/api/v1/form/submit", post(submit_handler::<S>))
        .with_state(service)
}

fn presented_session(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

/// Attaches the session cookie when the session was minted by this request.
fn with_session(created: bool, session: &SessionId, response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    if created {
        let cookie = format!(
            "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
            session.as_str()
        );
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

/// Urlencoded body of the page's select form. Missing selects count as unset.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct SelectionForm {
    #[serde(default)]
    experience_level: String,
    #[serde(default)]
    company_size: String,
    #[serde(default)]
    employment_type: String,
    #[serde(default)]
    job_title: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SelectRequest {
    #[serde(default)]
    value: String,
}

pub(crate) async fn page_handler<S>(
    State(service): State<Arc<PredictionFormService<S>>>,
    headers: HeaderMap,
) -> Response
where
    S: PredictionService + 'static,
{
    let (session, created) = service.open_session(presented_session(&headers));
    with_session(created, &session, Html(service.view(&session).to_html()))
}

pub(crate) async fn selection_form_handler<S>(
    State(service): State<Arc<PredictionFormService<S>>>,
    headers: HeaderMap,
    Form(selection): Form<SelectionForm>,
) -> Response
where
    S: PredictionService + 'static,
{
    let (session, created) = service.open_session(presented_session(&headers));
    let changes = [
        (FormField::ExperienceLevel, selection.experience_level.as_str()),
        (FormField::CompanySize, selection.company_size.as_str()),
        (FormField::EmploymentType, selection.employment_type.as_str()),
        (FormField::JobTitle, selection.job_title.as_str()),
    ];
    match service.select_all(&session, &changes) {
        Ok(_) => with_session(created, &session, Redirect::to("/")),
        Err(err) => with_session(created, &session, selection_error(err)),
    }
}

pub(crate) async fn submit_form_handler<S>(
    State(service): State<Arc<PredictionFormService<S>>>,
    headers: HeaderMap,
) -> Response
where
    S: PredictionService + 'static,
{
    let (session, created) = service.open_session(presented_session(&headers));
    // Failures land in the error banner of the page we redirect to.
    let _ = service.submit(&session).await;
    with_session(created, &session, Redirect::to("/"))
}

pub(crate) async fn view_handler<S>(
    State(service): State<Arc<PredictionFormService<S>>>,
    headers: HeaderMap,
) -> Response
where
    S: PredictionService + 'static,
{
    let (session, created) = service.open_session(presented_session(&headers));
    with_session(created, &session, Json(service.view(&session)))
}

pub(crate) async fn select_handler<S>(
    State(service): State<Arc<PredictionFormService<S>>>,
    headers: HeaderMap,
    Path(field): Path<String>,
    Json(request): Json<SelectRequest>,
) -> Response
where
    S: PredictionService + 'static,
{
    let (session, created) = service.open_session(presented_session(&headers));
    let selected = field
        .parse::<FormField>()
        .and_then(|field| service.select(&session, field, &request.value));
    match selected {
        Ok(view) => with_session(created, &session, Json(view)),
        Err(err) => with_session(created, &session, selection_error(err)),
    }
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<PredictionFormService<S>>>,
    headers: HeaderMap,
) -> Response
where
    S: PredictionService + 'static,
{
    let (session, created) = service.open_session(presented_session(&headers));
    let (outcome, view) = service.submit(&session).await;
    let (status, payload) = match outcome {
        SubmitOutcome::Succeeded(_) => (StatusCode::OK, json!({ "outcome": "succeeded", "view": view })),
        SubmitOutcome::Failed(message) => (
            StatusCode::BAD_GATEWAY,
            json!({ "outcome": "failed", "error": message, "view": view }),
        ),
        SubmitOutcome::Blocked(reason) => {
            let status = match reason {
                SubmitBlocked::InFlight => StatusCode::CONFLICT,
                SubmitBlocked::Incomplete => StatusCode::UNPROCESSABLE_ENTITY,
            };
            (
                status,
                json!({
                    "outcome": "blocked",
                    "reason": reason,
                    "error": reason.to_string(),
                    "view": view,
                }),
            )
        }
    };
    with_session(created, &session, (status, Json(payload)))
}

fn selection_error(err: SelectionError) -> Response {
    AppError::from(err).into_response()
}
