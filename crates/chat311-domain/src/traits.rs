//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the request pipeline and
//! infrastructure. Implementations live in other crates.

use crate::request::{Coordinates, ServiceRequest};

/// Trait for text completion services
///
/// Implemented by the infrastructure layer (chat311-llm)
pub trait CompletionProvider {
    /// Error type for completion operations
    type Error;

    /// Complete `prompt`, generating at most `max_tokens` tokens
    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, Self::Error>;
}

/// Trait for geocoding services
///
/// A lookup that finds nothing, or fails for any reason, yields `None`;
/// implementations log the cause instead of raising it.
///
/// Implemented by the infrastructure layer (chat311-geocode)
pub trait Geocoder: Send + Sync {
    /// Resolve a free-text address or place description
    fn geocode(&self, address: &str) -> Option<Coordinates>;
}

/// Trait for append-only service request storage
///
/// Implemented by the infrastructure layer (chat311-store)
pub trait RequestStore {
    /// Error type for store operations
    type Error;

    /// Append one record, returning its storage identity
    fn insert(&mut self, request: &ServiceRequest) -> Result<i64, Self::Error>;

    /// Most recent records, newest first
    fn recent(&self, limit: usize) -> Result<Vec<ServiceRequest>, Self::Error>;
}
