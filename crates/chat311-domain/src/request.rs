//! Service request record - the output of one pipeline run

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A numeric position returned by a geocoding capability
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in decimal degrees
    pub lat: f64,
    /// Longitude in decimal degrees
    pub lng: f64,
}

/// A structured 311 service request
///
/// Built once per completed pipeline run and never mutated afterwards.
/// Every text field except the coordinates comes straight from the model
/// (trimmed); the coordinates are absent when the geocoder strategy could
/// not resolve the location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    /// Verbatim complaint text
    pub complaint: String,

    /// Category chosen by the model
    pub category: String,

    /// Single-line severity judgement
    pub severity: String,

    /// Single-sentence description of the issue
    pub description: String,

    /// Single-sentence description of where the issue is
    pub location: String,

    /// Latitude as text, if known
    pub latitude: Option<String>,

    /// Longitude as text, if known
    pub longitude: Option<String>,

    /// When the request was assembled (UTC)
    pub created_at: DateTime<Utc>,
}

impl ServiceRequest {
    /// ISO-8601 rendering of `created_at` used by every sink
    pub fn created_at_iso(&self) -> String {
        self.created_at.to_rfc3339_opts(SecondsFormat::Micros, false)
    }

    /// Position suitable for a map view
    ///
    /// Returns `None` unless both coordinate strings parse as finite numbers.
    pub fn map_position(&self) -> Option<(f64, f64)> {
        let lat = parse_finite(self.latitude.as_deref()?)?;
        let lon = parse_finite(self.longitude.as_deref()?)?;
        Some((lat, lon))
    }
}

fn parse_finite(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> ServiceRequest {
        ServiceRequest {
            complaint: "Pothole on Main St".to_string(),
            category: "potholes".to_string(),
            severity: "Moderate".to_string(),
            description: "A pothole is damaging cars.".to_string(),
            location: "Main Street near the library.".to_string(),
            latitude: Some("43.0481".to_string()),
            longitude: Some("-76.1474".to_string()),
            created_at: Utc.with_ymd_and_hms(2023, 3, 1, 12, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_map_position_parses_both() {
        assert_eq!(sample().map_position(), Some((43.0481, -76.1474)));
    }

    #[test]
    fn test_map_position_missing_coordinate() {
        let mut request = sample();
        request.longitude = None;
        assert_eq!(request.map_position(), None);
    }

    #[test]
    fn test_map_position_rejects_text() {
        let mut request = sample();
        request.latitude = Some("north of downtown".to_string());
        assert_eq!(request.map_position(), None);

        request.latitude = Some("NaN".to_string());
        assert_eq!(request.map_position(), None);
    }

    #[test]
    fn test_created_at_is_iso8601_utc() {
        assert_eq!(sample().created_at_iso(), "2023-03-01T12:30:00.000000+00:00");
    }

    #[test]
    fn test_serializes_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["category"], "potholes");
        assert_eq!(json["latitude"], "43.0481");
        assert!(json["created_at"].as_str().unwrap().starts_with("2023-03-01T12:30:00"));
    }

    proptest::proptest! {
        #[test]
        fn prop_map_position_reads_back_rendered_numbers(
            lat in -90.0f64..90.0,
            lng in -180.0f64..180.0,
        ) {
            let mut request = sample();
            request.latitude = Some(lat.to_string());
            request.longitude = Some(lng.to_string());
            proptest::prop_assert_eq!(request.map_position(), Some((lat, lng)));
        }
    }
}
