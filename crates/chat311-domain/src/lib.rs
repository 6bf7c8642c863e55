//! Chat311 Domain Layer
//!
//! Core record types and capability traits for turning a free-text citizen
//! complaint into a structured 311 service request.
//!
//! ## Key Concepts
//!
//! - **Complaint**: raw citizen-submitted free text describing an issue
//! - **Service request**: the structured record produced from one complaint
//! - **Category list**: the closed, ordered set of request categories
//! - **Capabilities**: text completion, geocoding and persistence are
//!   external collaborators reached only through the traits in [`traits`]
//!
//! ## Architecture
//!
//! This crate holds no I/O. Infrastructure implementations live in the
//! `chat311-llm`, `chat311-geocode` and `chat311-store` crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod category;
pub mod request;
pub mod traits;

// Re-exports for convenience
pub use category::{match_category, CATEGORIES, OTHER_CATEGORY};
pub use request::{Coordinates, ServiceRequest};
