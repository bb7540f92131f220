//! Data models for the `PlaceFinder` library
//!
//! This module contains the core domain models organized by concern:
//! - Location: Geographic coordinates
//! - Place: Places and the reviews attached to them
//! - Status: Progress updates emitted while a search is running

pub mod location;
pub mod place;
pub mod status;

// Re-export all public types for convenient access
pub use location::Coordinate;
pub use place::{Place, Review, ReviewSource};
pub use status::FetchStatus;
