//! Chat311 Request Builder
//!
//! Turns one free-text citizen complaint into a structured service request
//! by asking a completion service a fixed sequence of questions.
//!
//! # Overview
//!
//! ```text
//! Complaint → prompts → completion provider → parse → (geocoder) → ServiceRequest
//! ```
//!
//! Category, severity, description and location are independent prompts.
//! Coordinates come either from a fifth prompt or from a geocoder lookup of
//! the derived location, depending on [`CoordinateStrategy`].
//!
//! # Example Usage
//!
//! ```no_run
//! use chat311_builder::{format_request, BuilderConfig, RequestBuilder};
//! use chat311_llm::MockProvider;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let builder = RequestBuilder::new(MockProvider::new("potholes"), BuilderConfig::default());
//!
//! let request = builder.build("Huge pothole on Salina St").await?;
//! println!("{}", format_request(&request));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod builder;
mod config;
mod error;
mod format;
mod parser;
mod prompt;


pub use builder::RequestBuilder;
pub use config::{BuilderConfig, CategoryMode, CoordinateStrategy};
pub use error::PipelineError;
pub use format::{format_request, EMERGENCY_NOTICE, UNAVAILABLE};
pub use parser::{normalize_category, split_coordinates};
pub use prompt::{token_budget, PromptBuilder, Step};
