//! HTTP request handlers for the complaint server.
//!
//! The HTML form and the JSON API share one flow: build, format, persist.
//! Persistence failures never discard a built request; they become warnings.

use crate::page;
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Form, Router,
};
use chat311_builder::{format_request, PipelineError, RequestBuilder};
use chat311_domain::traits::CompletionProvider;
use chat311_domain::ServiceRequest;
use chat311_store::Persistence;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{error, warn};

/// Shared application state
pub struct AppState<C>
where
    C: CompletionProvider,
{
    /// Pipeline, absent when the server started without usable secrets
    pub builder: Option<Arc<RequestBuilder<C>>>,
    /// Configured sinks for finished requests
    pub persistence: Arc<Persistence>,
}

impl<C: CompletionProvider> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            builder: self.builder.clone(),
            persistence: Arc::clone(&self.persistence),
        }
    }
}

/// Complaint submission, from the form or the JSON API
#[derive(Debug, Deserialize)]
pub struct ComplaintForm {
    /// Free-text complaint
    #[serde(default)]
    pub complaint: String,
}

/// JSON API response
#[derive(Debug, Serialize, Deserialize)]
pub struct RequestResponse {
    /// The structured request
    pub request: ServiceRequest,
    /// Human-readable rendering
    pub formatted: String,
    /// Non-fatal problems: no map position, persistence failures
    pub warnings: Vec<String>,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// "ok" or "unconfigured"
    pub status: String,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The pipeline rejected or failed the complaint
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Secrets were not available at startup
    #[error("Service is not configured: required secrets are missing")]
    ConfigurationUnavailable,

    /// A built request could not be written to a sink
    #[error("Request was not saved: {0}")]
    PersistenceFailed(String),
}

impl AppError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Pipeline(PipelineError::EmptyComplaint)
            | AppError::Pipeline(PipelineError::PromptTooLong { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Pipeline(_) => StatusCode::BAD_GATEWAY,
            AppError::ConfigurationUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            AppError::PersistenceFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

/// Build a request, then persist it
///
/// Returns the request with any persistence warning; only pipeline and
/// configuration problems are errors.
async fn process<C>(
    state: &AppState<C>,
    complaint: &str,
) -> Result<(ServiceRequest, Vec<String>), AppError>
where
    C: CompletionProvider + Send + Sync + 'static,
    C::Error: Display,
{
    let builder = state
        .builder
        .as_ref()
        .ok_or(AppError::ConfigurationUnavailable)?;

    let request = builder.build(complaint).await?;

    let mut warnings = Vec::new();
    if let Err(e) = persist(&state.persistence, &request).await {
        error!("{}", e);
        warnings.push(e.to_string());
    }

    Ok((request, warnings))
}

async fn persist(persistence: &Persistence, request: &ServiceRequest) -> Result<(), AppError> {
    persistence
        .persist(request)
        .await
        .map_err(|e| AppError::PersistenceFailed(e.to_string()))
}

/// GET / - The complaint form
async fn index() -> Html<String> {
    Html(page::form_page(""))
}

/// POST / - Form submission
async fn submit_form<C>(
    State(state): State<AppState<C>>,
    Form(form): Form<ComplaintForm>,
) -> Response
where
    C: CompletionProvider + Send + Sync + 'static,
    C::Error: Display,
{
    if form.complaint.trim().is_empty() {
        return Html(page::form_page("")).into_response();
    }

    match process(&state, &form.complaint).await {
        Ok((request, warnings)) => Html(page::result_page(
            &form.complaint,
            &format_request(&request),
            request.map_position(),
            &warnings,
        ))
        .into_response(),
        Err(e) => {
            warn!("Submission failed: {}", e);
            (e.status(), Html(page::error_page(&form.complaint, &e.to_string()))).into_response()
        }
    }
}

/// POST /api/requests - JSON submission
async fn create_request<C>(
    State(state): State<AppState<C>>,
    Json(body): Json<ComplaintForm>,
) -> Result<Json<RequestResponse>, AppError>
where
    C: CompletionProvider + Send + Sync + 'static,
    C::Error: Display,
{
    if body.complaint.trim().is_empty() {
        return Err(PipelineError::EmptyComplaint.into());
    }

    let (request, mut warnings) = process(&state, &body.complaint).await?;
    if request.map_position().is_none() {
        warnings.insert(0, page::MAP_WARNING.to_string());
    }
    let formatted = format_request(&request);

    Ok(Json(RequestResponse {
        request,
        formatted,
        warnings,
    }))
}

/// GET /health - Configuration status
async fn health_check<C>(State(state): State<AppState<C>>) -> Json<HealthCheckResponse>
where
    C: CompletionProvider + Send + Sync + 'static,
{
    let status = if state.builder.is_some() { "ok" } else { "unconfigured" };
    Json(HealthCheckResponse {
        status: status.to_string(),
    })
}

/// Create the axum router with all routes
pub fn create_router<C>(state: AppState<C>) -> Router
where
    C: CompletionProvider + Send + Sync + 'static,
    C::Error: Display,
{
    Router::new()
        .route("/", get(index).post(submit_form::<C>))
        .route("/api/requests", post(create_request::<C>))
        .route("/health", get(health_check::<C>))
        .with_state(state)
}
