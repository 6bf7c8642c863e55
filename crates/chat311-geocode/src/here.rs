//! HERE geocode search API
//!
//! `GET {url}?q=<address>&apiKey=<key>`, taking the first item's position.

use crate::GeocodeError;
use chat311_domain::traits::Geocoder;
use chat311_domain::Coordinates;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Default HERE geocode endpoint
pub const DEFAULT_GEOCODE_URL: &str = "https://geocode.search.hereapi.com/v1/geocode";

/// Geocoder backed by the HERE geocode search API
pub struct HereGeocoder {
    url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    items: Vec<GeocodeItem>,
}

#[derive(Deserialize)]
struct GeocodeItem {
    position: Position,
}

#[derive(Deserialize)]
struct Position {
    lat: f64,
    lng: f64,
}

impl HereGeocoder {
    /// Create a geocoder using `api_key`
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, GeocodeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GeocodeError::Communication(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: DEFAULT_GEOCODE_URL.to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    /// Use a different endpoint URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Look up an address, keeping the failure cause
    pub async fn lookup(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        debug!("Geocoding address: {}", address);

        let response = self
            .client
            .get(&self.url)
            .query(&[("q", address), ("apiKey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| GeocodeError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| GeocodeError::Communication(format!("Failed to read response: {}", e)))?;
        debug!("Geocode response: {}", body);

        if !status.is_success() {
            return Err(GeocodeError::Communication(format!("HTTP {}", status)));
        }

        parse_first_position(&body)
    }
}

impl fmt::Debug for HereGeocoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HereGeocoder")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

fn parse_first_position(body: &str) -> Result<Coordinates, GeocodeError> {
    let response: GeocodeResponse = serde_json::from_str(body)
        .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))?;

    response
        .items
        .into_iter()
        .next()
        .map(|item| Coordinates {
            lat: item.position.lat,
            lng: item.position.lng,
        })
        .ok_or(GeocodeError::NoMatch)
}

impl Geocoder for HereGeocoder {
    /// Blocking lookup; must run off the async worker threads when a
    /// runtime is present
    fn geocode(&self, address: &str) -> Option<Coordinates> {
        let result = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle.block_on(self.lookup(address)),
            Err(_) => match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime.block_on(self.lookup(address)),
                Err(e) => Err(GeocodeError::Communication(format!("Failed to start runtime: {}", e))),
            },
        };

        match result {
            Ok(coordinates) => Some(coordinates),
            Err(e) => {
                warn!("Geocoding failed for '{}': {}", address, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_item() {
        let body = r#"{"items":[
            {"title":"City Hall","position":{"lat":43.04999,"lng":-76.14739}},
            {"title":"Elsewhere","position":{"lat":1.0,"lng":2.0}}
        ]}"#;
        let coordinates = parse_first_position(body).unwrap();
        assert_eq!(coordinates, Coordinates { lat: 43.04999, lng: -76.14739 });
    }

    #[test]
    fn test_parse_no_items_is_no_match() {
        assert!(matches!(parse_first_position(r#"{"items":[]}"#), Err(GeocodeError::NoMatch)));
        assert!(matches!(parse_first_position("{}"), Err(GeocodeError::NoMatch)));
    }

    #[test]
    fn test_parse_missing_position() {
        let result = parse_first_position(r#"{"items":[{"title":"x"}]}"#);
        assert!(matches!(result, Err(GeocodeError::InvalidResponse(_))));
    }

    #[test]
    fn test_parse_error_body() {
        let result = parse_first_position(r#"{"error":"Unauthorized"#);
        assert!(matches!(result, Err(GeocodeError::InvalidResponse(_))));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let geocoder = HereGeocoder::new("secret-here-key", Duration::from_secs(1)).unwrap();
        assert!(!format!("{:?}", geocoder).contains("secret-here-key"));
    }

    #[test]
    fn test_unreachable_endpoint_yields_none() {
        let geocoder = HereGeocoder::new("key", Duration::from_secs(2))
            .unwrap()
            .with_url("http://127.0.0.1:1/v1/geocode");
        assert_eq!(geocoder.geocode("100 Main St"), None);
    }

    #[tokio::test]
    async fn test_lookup_keeps_failure_cause() {
        let geocoder = HereGeocoder::new("key", Duration::from_secs(2))
            .unwrap()
            .with_url("http://127.0.0.1:1/v1/geocode");
        let result = geocoder.lookup("100 Main St").await;
        assert!(matches!(result, Err(GeocodeError::Communication(_))));
    }
}
