//! Outbound data sources
//!
//! Each source is a trait so the orchestrator can be driven by any transport.
//! The concrete clients talk to Google Places (primary), Overpass (fallback),
//! TripAdvisor (scrape reviews) and Twitter (social mentions).

pub mod google_places;
pub mod http;
pub mod overpass;
pub mod tripadvisor;
pub mod twitter;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{Coordinate, Place};

pub use google_places::GooglePlacesClient;
pub use overpass::OverpassClient;
pub use tripadvisor::TripAdvisorScraper;
pub use twitter::TwitterSearchClient;

/// A place as returned by the primary source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrimaryPlaceRecord {
    pub id: String,
    pub name: String,
    pub rating: Option<f64>,
    pub review_count: Option<u32>,
    pub price_level: Option<u8>,
}

impl From<PrimaryPlaceRecord> for Place {
    fn from(record: PrimaryPlaceRecord) -> Self {
        Place {
            id: record.id,
            name: record.name,
            rating: record.rating,
            review_count: record.review_count,
            price_level: record.price_level,
            reviews: Vec::new(),
        }
    }
}

/// A place as returned by the fallback source, which carries no ratings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FallbackPlaceRecord {
    pub id: String,
    pub name: String,
}

impl From<FallbackPlaceRecord> for Place {
    fn from(record: FallbackPlaceRecord) -> Self {
        Place::bare(record.id, record.name)
    }
}

/// Area query understood by the fallback source
#[derive(Debug, Clone, PartialEq)]
pub struct GeoQuery {
    pub coordinate: Coordinate,
    pub radius_m: u32,
    /// Tag values to match, e.g. `["restaurant", "bakery"]`
    pub tags: Vec<String>,
}

/// A review scraped from a review site
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedReview {
    pub content: String,
    pub rating: Option<f64>,
    pub timestamp: String,
}

/// A social media post mentioning a place
#[derive(Debug, Clone, PartialEq)]
pub struct SocialMention {
    pub content: String,
    pub timestamp: String,
}

/// Primary place search
#[async_trait]
pub trait PrimaryPlaceSource: Send + Sync {
    async fn search(
        &self,
        coordinate: Coordinate,
        radius_m: u32,
        category_filter: &str,
        field_mask: &str,
    ) -> Result<Vec<PrimaryPlaceRecord>>;
}

/// Degraded place search used while the primary circuit is open
#[async_trait]
pub trait FallbackPlaceSource: Send + Sync {
    async fn search(&self, query: &GeoQuery) -> Result<Vec<FallbackPlaceRecord>>;
}

/// Review site scraper
#[async_trait]
pub trait ScrapeReviewSource: Send + Sync {
    async fn fetch_reviews(
        &self,
        place_name: &str,
        coordinate: Coordinate,
    ) -> Result<Vec<ScrapedReview>>;
}

/// Social media search
#[async_trait]
pub trait SocialReviewSource: Send + Sync {
    async fn search_mentions(&self, query: &str) -> Result<Vec<SocialMention>>;
}
