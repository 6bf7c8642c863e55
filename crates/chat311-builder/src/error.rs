//! Error types for the request pipeline

use crate::prompt::Step;
use thiserror::Error;

/// Errors that can occur while building a service request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// Complaint was empty or whitespace; nothing was called
    #[error("Complaint is empty")]
    EmptyComplaint,

    /// A prompt leaves no room for completion tokens
    #[error("Prompt for {step} step too long: {prompt_chars} chars (context window: {context_window})")]
    PromptTooLong {
        /// Step whose prompt overflowed
        step: Step,
        /// Prompt length in characters
        prompt_chars: usize,
        /// Configured context window
        context_window: u32,
    },

    /// The completion service failed; the whole build is abandoned
    #[error("Completion failed at {step} step: {message}")]
    CompletionFailed {
        /// Step whose call failed
        step: Step,
        /// Provider error text
        message: String,
    },

    /// Model coordinates did not split into latitude and longitude
    #[error("Malformed coordinates: {0:?}")]
    MalformedCoordinates(String),

    /// Geocoding produced nothing; never fatal
    #[error("Geocoding unavailable: {0}")]
    GeocodeUnavailable(String),
}
