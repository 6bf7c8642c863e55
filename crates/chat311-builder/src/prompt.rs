//! Prompt templates and token budgeting

use chat311_domain::CATEGORIES;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One completion step of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    /// Pick a category from the list
    Category,
    /// Judge severity
    Severity,
    /// Describe the issue in one sentence
    Description,
    /// Describe where the issue is in one sentence
    Location,
    /// Produce "latitude, longitude"
    Coordinates,
}

impl Step {
    /// Step name as used in logs and errors
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Category => "category",
            Step::Severity => "severity",
            Step::Description => "description",
            Step::Location => "location",
            Step::Coordinates => "coordinates",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders the prompt for each step of one complaint
pub struct PromptBuilder<'a> {
    complaint: &'a str,
}

impl<'a> PromptBuilder<'a> {
    /// Create a prompt builder for a complaint
    pub fn new(complaint: &'a str) -> Self {
        Self { complaint }
    }

    /// Build the prompt text for `step`
    pub fn build(&self, step: Step) -> String {
        let c = self.complaint;
        match step {
            Step::Category => format!(
                "Based on the complaint: \"{}\", print the best category of request from this list:\n\n{}\n\nOnly print a single result.\n",
                c,
                CATEGORIES.join("\n")
            ),
            Step::Severity => format!(
                "Based on the complaint: \"{}\", print the severity of the issue. Only print a single result.",
                c
            ),
            Step::Description => format!(
                "Based on the complaint: \"{}\", print a description of the issue. Only print a single sentence.",
                c
            ),
            Step::Location => format!(
                "Based on the complaint: \"{}\", describe the location of the issue (in a single sentence).",
                c
            ),
            Step::Coordinates => format!(
                "Based on the complaint: \"{}\", print the location of the issue (in latitude/longitude format).",
                c
            ),
        }
    }
}

/// Tokens left for the completion once the prompt is in the window
///
/// Prompt length is counted in characters. Returns `None` when nothing is
/// left.
///
/// ```
/// use chat311_builder::token_budget;
///
/// assert_eq!(token_budget(&"x".repeat(4000), 4097), Some(97));
/// assert_eq!(token_budget(&"x".repeat(4100), 4097), None);
/// ```
pub fn token_budget(prompt: &str, context_window: u32) -> Option<u32> {
    let used = prompt.chars().count();
    let budget = i64::from(context_window) - used as i64;
    if budget > 0 {
        u32::try_from(budget).ok()
    } else {
        None
    }
}
