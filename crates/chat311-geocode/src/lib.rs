//! Chat311 Geocoding Layer
//!
//! Implementations of the `Geocoder` trait from `chat311-domain`.
//!
//! - `HereGeocoder`: HERE geocode search API
//! - `MockGeocoder`: Deterministic mock for testing
//!
//! Geocoding is best effort. Every failure collapses to `None` and is logged,
//! so callers only ever see "found" or "not found".

#![warn(missing_docs)]

pub mod here;

use chat311_domain::traits::Geocoder;
use chat311_domain::Coordinates;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

pub use here::HereGeocoder;

/// Reasons a lookup produced no coordinates
///
/// These never leave the crate through the `Geocoder` trait; they exist so
/// the cause can be logged precisely.
#[derive(Error, Debug)]
pub enum GeocodeError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Body could not be parsed or lacked a position
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The service answered but matched nothing
    #[error("No match for address")]
    NoMatch,
}

/// Mock geocoder for deterministic testing
///
/// Known addresses resolve to their registered coordinates; everything else
/// resolves to `None`.
#[derive(Debug, Clone, Default)]
pub struct MockGeocoder {
    known: Arc<Mutex<HashMap<String, Coordinates>>>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl MockGeocoder {
    /// Create a geocoder that knows no addresses
    pub fn new() -> Self {
        Self::default()
    }

    /// Register coordinates for an exact address string
    pub fn with_address(self, address: impl Into<String>, lat: f64, lng: f64) -> Self {
        lock(&self.known).insert(address.into(), Coordinates { lat, lng });
        self
    }

    /// Addresses looked up so far, in order
    pub fn queries(&self) -> Vec<String> {
        lock(&self.queries).clone()
    }
}

impl Geocoder for MockGeocoder {
    fn geocode(&self, address: &str) -> Option<Coordinates> {
        lock(&self.queries).push(address.to_string());
        lock(&self.known).get(address).copied()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
