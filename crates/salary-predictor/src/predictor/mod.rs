//! Salary prediction form: selection state, the upstream client, and rendering.

pub mod client;
pub mod domain;
pub mod form;
pub mod router;
pub mod service;
pub mod view;

pub use client::{parse_error_detail, HttpPredictionClient, PredictionError, PredictionService};
pub use domain::{
    CompanySize, EmploymentType, ExperienceLevel, FormField, FormSelection, JobTitle,
    PredictionRequest, PredictionResult, SelectionError,
};
pub use form::{PredictionForm, RequestState, SubmitBlocked, SubmitOutcome};
pub use router::{prediction_router, SESSION_COOKIE};
pub use service::{PredictionFormService, SessionId, DEFAULT_SESSION_CAPACITY};
pub use view::{format_confidence, format_salary, render, FormView};
