//! `PlaceFinder` - Nearby place search with review enrichment
//!
//! This library provides the search orchestration (cache, circuit breaker,
//! rate limiter, primary and fallback sources), review aggregation with spam
//! filtering and sentiment scoring, and the HTTP surface serving it.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod resilience;
pub mod reviews;
pub mod sources;
pub mod web;

// Re-export core types for public API
pub use cache::{CacheEntry, MemoryPlaceCache, PersistentPlaceCache, PlaceCache};
pub use config::PlaceFinderConfig;
pub use error::PlaceFinderError;
pub use models::{Coordinate, FetchStatus, Place, Review, ReviewSource};
pub use orchestrator::{PlaceFetchOrchestrator, SearchSettings};
pub use resilience::{CircuitBreaker, RateLimiter};
pub use reviews::{KeywordRanker, ReviewAggregator, SentimentScorer, SpamFilter};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, PlaceFinderError>;
