//! Human-readable rendering of a service request
//!
//! Plain substitution into a fixed template. Field text is not escaped, so
//! text that looks like template lines renders as such.

use chat311_domain::ServiceRequest;

/// Public-safety notice appended to every rendered request
pub const EMERGENCY_NOTICE: &str = "Note: If this is an emergency, please call 911. For reporting an abandoned vehicle or an illegally parked vehicle, please call the Syracuse Police Ordinance at 315-448-8650. For all non-emergencies and service requests, call (315) 448-CITY (2489).";

/// Rendering used for a coordinate the pipeline could not derive
pub const UNAVAILABLE: &str = "unavailable";

/// Render a service request for display
pub fn format_request(request: &ServiceRequest) -> String {
    format!(
        "Service Request:

Location: {location}
Latitude: {latitude}
Longitude: {longitude}
Severity: {severity}
Category: {category}

Description: {description}

Complaint: {complaint}
Created: {created_at}

{notice} The category chosen for this request is {category}.
",
        location = request.location,
        latitude = request.latitude.as_deref().unwrap_or(UNAVAILABLE),
        longitude = request.longitude.as_deref().unwrap_or(UNAVAILABLE),
        severity = request.severity,
        category = request.category,
        description = request.description,
        complaint = request.complaint,
        created_at = request.created_at_iso(),
        notice = EMERGENCY_NOTICE,
    )
}
