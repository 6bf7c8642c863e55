//! The closed list of service request categories
//!
//! The list is presented to the model verbatim and in this order on every
//! request so completions stay reproducible for a fixed model and
//! temperature. Two entries are redirect notices rather than categories.

/// Category used by strict mode when the model answers off-list
pub const OTHER_CATEGORY: &str = "Other";

/// Every category a service request may be filed under, in prompt order
pub const CATEGORIES: [&str; 47] = [
    "pavement markings",
    "potholes",
    "snow & ice",
    "sidewalks",
    "street lights",
    "traffic signals",
    "traffic & parking signs",
    "To report an abandoned vehicle, please call the Syracuse Police Ordinance at 315-448-8650. If this is an emergency, please call 911. Do NOT submit requests to Cityline.",
    "To report an illegally parked vehicle, please call the Syracuse Police Ordinance at 315-448-8650. If this is an emergency, please call 911. Do NOT submit requests to Cityline.",
    "Parking Meter",
    "Parking Tickets",
    "Other Parking & Vehicles Concern",
    "Dog Control",
    "Roadkill",
    "Animal Control",
    "Deer Sighting",
    "Graffiti on Private Land",
    "Electronics & Hazardous Waste",
    "Illegal Setouts",
    "Large or Bulk Items- Setout notification only",
    "Large or Bulk Items- Skipped Pickup",
    "Tires",
    "Public Trash Can",
    "Recycling",
    "Recycling (pick up that has been skipped)",
    "Report Litter on Private Land",
    "Weekly Trash Pickup",
    "Register for Adopt-A-Block",
    "Adopt-A-Block - Request for Trash pick up",
    "Yard Waste",
    "Graffiti on Public Land",
    "Report Litter on Public Land",
    "Home & Building Maintenance",
    "Vacant Buildings",
    "Vacant Land",
    "Report Overgrown Grass on Private Land",
    "Report Trash/Debris Outside a Home/Building",
    "Other Housing & Property Maintenance Concern",
    "Overgrown Grass in Public Spaces",
    "Park Maintenance",
    "Playground Equipment",
    "Tree Care and Removal",
    "Other Parks, Trees & Public Utilities Concern",
    "Request a free street tree planting (City of Syracuse Property Owners Only)",
    "Sewer-related Concerns",
    "Water-related Concerns",
    "Health, Safety & Social Services",
];

/// Find the canonical list entry for a model answer
///
/// Comparison ignores surrounding whitespace and ASCII case, so
/// `" Potholes "` resolves to `"potholes"`.
///
/// # Examples
///
/// ```
/// use chat311_domain::match_category;
///
/// assert_eq!(match_category("Potholes"), Some("potholes"));
/// assert_eq!(match_category("a dragon"), None);
/// ```
pub fn match_category(answer: &str) -> Option<&'static str> {
    let answer = answer.trim();
    CATEGORIES
        .iter()
        .copied()
        .find(|category| category.eq_ignore_ascii_case(answer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_categories_are_unique() {
        let unique: HashSet<_> = CATEGORIES.iter().collect();
        assert_eq!(unique.len(), CATEGORIES.len());
    }

    #[test]
    fn test_redirect_entries_present() {
        let redirects = CATEGORIES
            .iter()
            .filter(|c| c.starts_with("To report"))
            .count();
        assert_eq!(redirects, 2);
    }

    #[test]
    fn test_order_is_stable() {
        assert_eq!(CATEGORIES[0], "pavement markings");
        assert_eq!(CATEGORIES[CATEGORIES.len() - 1], "Health, Safety & Social Services");
    }

    #[test]
    fn test_match_category_case_insensitive() {
        assert_eq!(match_category("STREET LIGHTS"), Some("street lights"));
        assert_eq!(match_category("  Tires\n"), Some("Tires"));
    }

    #[test]
    fn test_match_category_rejects_partial() {
        assert_eq!(match_category("pothole"), None);
        assert_eq!(match_category(""), None);
        assert_eq!(match_category(OTHER_CATEGORY), None);
    }
}
