//! Parse model output into record fields

use crate::config::CategoryMode;
use crate::error::PipelineError;
use chat311_domain::{match_category, OTHER_CATEGORY};
use tracing::warn;

/// Split a "latitude, longitude" answer into its two trimmed fields
///
/// The answer must contain exactly one comma.
///
/// ```
/// use chat311_builder::split_coordinates;
///
/// let (lat, lon) = split_coordinates("42.1, -76.1").unwrap();
/// assert_eq!((lat.as_str(), lon.as_str()), ("42.1", "-76.1"));
/// assert!(split_coordinates("unknown").is_err());
/// ```
pub fn split_coordinates(answer: &str) -> Result<(String, String), PipelineError> {
    let fields: Vec<&str> = answer.split(',').map(str::trim).collect();
    match fields.as_slice() {
        [lat, lon] => Ok((lat.to_string(), lon.to_string())),
        _ => Err(PipelineError::MalformedCoordinates(answer.to_string())),
    }
}

/// Apply the category policy to a trimmed model answer
pub fn normalize_category(answer: &str, mode: CategoryMode) -> String {
    match mode {
        CategoryMode::Accept => answer.to_string(),
        CategoryMode::Strict => match match_category(answer) {
            Some(category) => category.to_string(),
            None => {
                warn!("Model returned off-list category {:?}, using {}", answer, OTHER_CATEGORY);
                OTHER_CATEGORY.to_string()
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_trims_fields() {
        let (lat, lon) = split_coordinates("42.1, -76.1").unwrap();
        assert_eq!(lat, "42.1");
        assert_eq!(lon, "-76.1");

        let (lat, lon) = split_coordinates("  43.0481 ,\t-76.1474 ").unwrap();
        assert_eq!(lat, "43.0481");
        assert_eq!(lon, "-76.1474");
    }

    #[test]
    fn test_split_without_comma_is_malformed() {
        assert_eq!(
            split_coordinates("unknown"),
            Err(PipelineError::MalformedCoordinates("unknown".to_string()))
        );
    }

    #[test]
    fn test_split_with_extra_commas_is_malformed() {
        assert!(split_coordinates("43.0, -76.1, 120m").is_err());
    }

    #[test]
    fn test_split_keeps_non_numeric_fields() {
        // Parsing to numbers is the display layer's concern
        let (lat, lon) = split_coordinates("N 43°, W 76°").unwrap();
        assert_eq!(lat, "N 43°");
        assert_eq!(lon, "W 76°");
    }

    #[test]
    fn test_accept_mode_keeps_answer() {
        assert_eq!(normalize_category("Dragons", CategoryMode::Accept), "Dragons");
    }

    #[test]
    fn test_strict_mode_canonicalizes() {
        assert_eq!(normalize_category("POTHOLES", CategoryMode::Strict), "potholes");
        assert_eq!(normalize_category("Dragons", CategoryMode::Strict), OTHER_CATEGORY);
    }
}
