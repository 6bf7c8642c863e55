//! Core RequestBuilder implementation

use crate::config::{BuilderConfig, CoordinateStrategy};
use crate::error::PipelineError;
use crate::parser::{normalize_category, split_coordinates};
use crate::prompt::{token_budget, PromptBuilder, Step};
use chat311_domain::traits::{CompletionProvider, Geocoder};
use chat311_domain::{Coordinates, ServiceRequest};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A prompt ready to send, with its token budget already checked
#[derive(Debug, Clone)]
struct PlannedCall {
    step: Step,
    prompt: String,
    max_tokens: u32,
}

/// Every call a build will make, validated before the first one is sent
struct Plan {
    category: PlannedCall,
    severity: PlannedCall,
    description: PlannedCall,
    location: PlannedCall,
    coordinates: Option<PlannedCall>,
}

/// The RequestBuilder turns a complaint into a structured service request
///
/// Holds no state between builds; every call to [`RequestBuilder::build`]
/// re-issues every completion.
pub struct RequestBuilder<C>
where
    C: CompletionProvider,
{
    completer: Arc<C>,
    geocoder: Option<Arc<dyn Geocoder>>,
    config: BuilderConfig,
}

impl<C> RequestBuilder<C>
where
    C: CompletionProvider + Send + Sync + 'static,
    C::Error: std::fmt::Display,
{
    /// Create a new RequestBuilder without a geocoder
    pub fn new(completer: C, config: BuilderConfig) -> Self {
        Self {
            completer: Arc::new(completer),
            geocoder: None,
            config,
        }
    }

    /// Attach the geocoder used by the geocoder coordinate strategy
    pub fn with_geocoder(mut self, geocoder: impl Geocoder + 'static) -> Self {
        self.geocoder = Some(Arc::new(geocoder));
        self
    }

    /// The configuration this builder runs with
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Build a service request from a complaint
    ///
    /// # Errors
    ///
    /// - `EmptyComplaint` for empty or whitespace-only input, before any call
    /// - `PromptTooLong` when any prompt leaves no token budget, before any call
    /// - `CompletionFailed` on the first failing completion; no partial record
    /// - `MalformedCoordinates` when the model strategy gets an unsplittable answer
    ///
    /// Geocoding failures never fail the build; they leave the coordinates unset.
    pub async fn build(&self, complaint: &str) -> Result<ServiceRequest, PipelineError> {
        if complaint.trim().is_empty() {
            return Err(PipelineError::EmptyComplaint);
        }

        let plan = self.plan(complaint)?;

        info!(
            "Building service request (complaint length {}, strategy {:?}, parallel {})",
            complaint.len(),
            self.config.coordinate_strategy,
            self.config.parallel_steps
        );

        // Set by the first failing call; later calls are not sent
        let failed = Arc::new(AtomicBool::new(false));

        let (category, severity, description, location) = if self.config.parallel_steps {
            tokio::try_join!(
                self.call(&plan.category, &failed),
                self.call(&plan.severity, &failed),
                self.call(&plan.description, &failed),
                self.call(&plan.location, &failed),
            )?
        } else {
            (
                self.call(&plan.category, &failed).await?,
                self.call(&plan.severity, &failed).await?,
                self.call(&plan.description, &failed).await?,
                self.call(&plan.location, &failed).await?,
            )
        };

        let category = normalize_category(&category, self.config.category_mode);

        info!("category: {}", category);
        info!("severity: {}", severity);
        info!("description: {}", description);
        info!("location: {}", location);

        let (latitude, longitude) = match &plan.coordinates {
            Some(coordinates_call) => {
                let answer = self.call(coordinates_call, &failed).await?;
                info!("coordinates: {}", answer);
                let (lat, lon) = split_coordinates(&answer)?;
                (Some(lat), Some(lon))
            }
            None => {
                let address = if location.is_empty() { complaint } else { location.as_str() };
                match self.locate(address).await {
                    Ok(found) => (Some(found.lat.to_string()), Some(found.lng.to_string())),
                    Err(e) => {
                        warn!("{}; coordinates omitted", e);
                        (None, None)
                    }
                }
            }
        };

        info!("latitude: {:?}", latitude);
        info!("longitude: {:?}", longitude);

        let request = ServiceRequest {
            complaint: complaint.to_string(),
            category,
            severity,
            description,
            location,
            latitude,
            longitude,
            created_at: Utc::now(),
        };

        info!("Generated service request at {}", request.created_at_iso());

        Ok(request)
    }

    /// Render every prompt and check its budget
    fn plan(&self, complaint: &str) -> Result<Plan, PipelineError> {
        let prompts = PromptBuilder::new(complaint);
        let planned = |step: Step| -> Result<PlannedCall, PipelineError> {
            let prompt = prompts.build(step);
            let prompt_chars = prompt.chars().count();
            let max_tokens = token_budget(&prompt, self.config.context_window).ok_or(
                PipelineError::PromptTooLong {
                    step,
                    prompt_chars,
                    context_window: self.config.context_window,
                },
            )?;
            debug!("{} prompt: {} chars, max_tokens {}", step, prompt_chars, max_tokens);
            Ok(PlannedCall {
                step,
                prompt,
                max_tokens,
            })
        };

        Ok(Plan {
            category: planned(Step::Category)?,
            severity: planned(Step::Severity)?,
            description: planned(Step::Description)?,
            location: planned(Step::Location)?,
            coordinates: match self.config.coordinate_strategy {
                CoordinateStrategy::Model => Some(planned(Step::Coordinates)?),
                CoordinateStrategy::Geocoder => None,
            },
        })
    }

    /// Call the completion provider and trim its answer
    ///
    /// Sets `failed` when the provider errors. Once it is set, calls that
    /// have not reached the provider never resolve; the failing call's error
    /// is what ends the build.
    async fn call(&self, call: &PlannedCall, failed: &Arc<AtomicBool>) -> Result<String, PipelineError> {
        let completer = Arc::clone(&self.completer);
        let failed = Arc::clone(failed);
        let prompt = call.prompt.clone();
        let max_tokens = call.max_tokens;
        let step = call.step;

        // Call in a blocking context since CompletionProvider is not async
        let outcome = tokio::task::spawn_blocking(move || {
            if failed.load(Ordering::SeqCst) {
                return None;
            }
            let result = completer
                .complete(&prompt, max_tokens)
                .map_err(|e| e.to_string());
            if result.is_err() {
                failed.store(true, Ordering::SeqCst);
            }
            Some(result)
        })
        .await
        .map_err(|e| PipelineError::CompletionFailed {
            step,
            message: format!("Task join error: {}", e),
        })?;

        let answer = match outcome {
            Some(result) => result.map_err(|message| PipelineError::CompletionFailed { step, message })?,
            None => {
                debug!("{} call skipped after an earlier failure", step);
                std::future::pending().await
            }
        };

        Ok(answer.trim().to_string())
    }

    /// Geocode an address, classifying every miss as `GeocodeUnavailable`
    async fn locate(&self, address: &str) -> Result<Coordinates, PipelineError> {
        let geocoder = self
            .geocoder
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| PipelineError::GeocodeUnavailable("no geocoder configured".to_string()))?;
        let query = address.to_string();

        tokio::task::spawn_blocking(move || geocoder.geocode(&query))
            .await
            .map_err(|e| PipelineError::GeocodeUnavailable(format!("Task join error: {}", e)))?
            .ok_or_else(|| PipelineError::GeocodeUnavailable(format!("no match for {:?}", address)))
    }
}
