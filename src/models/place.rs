//! Place and review models
//!
//! These types are cached in binary form, so they must stay free of
//! conditional serde attributes such as `skip_serializing_if`.

use serde::{Deserialize, Serialize};

/// A point of interest returned by a place source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Place {
    /// Source-assigned identifier
    pub id: String,
    pub name: String,
    /// Average rating, when the source provides one
    pub rating: Option<f64>,
    /// Total number of ratings behind `rating`
    pub review_count: Option<u32>,
    /// Price bracket (0 = free .. 4 = very expensive)
    pub price_level: Option<u8>,
    /// Reviews in aggregation order
    pub reviews: Vec<Review>,
}

impl Place {
    /// Create a place that carries only an identifier and a name
    #[must_use]
    pub fn bare(id: String, name: String) -> Self {
        Self {
            id,
            name,
            rating: None,
            review_count: None,
            price_level: None,
            reviews: Vec::new(),
        }
    }
}

/// Where a review came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ReviewSource {
    Primary,
    Scrape,
    Social,
}

impl std::fmt::Display for ReviewSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReviewSource::Primary => "primary",
            ReviewSource::Scrape => "scrape",
            ReviewSource::Social => "social",
        };
        write!(f, "{name}")
    }
}

/// A single review of a place
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub source: ReviewSource,
    pub content: String,
    /// Rating on a 0-5 scale, when the source provides one
    pub rating: Option<f64>,
    /// Timestamp as reported by the source, unparsed
    pub timestamp: String,
    /// Sentiment in [-1, 1], assigned during aggregation
    pub sentiment_score: Option<f64>,
}

impl Review {
    /// Create an unscored review
    #[must_use]
    pub fn new(source: ReviewSource, content: String, rating: Option<f64>, timestamp: String) -> Self {
        Self {
            source,
            content,
            rating,
            timestamp,
            sentiment_score: None,
        }
    }

    /// Return a copy of this review carrying the given sentiment score
    #[must_use]
    pub fn with_sentiment(self, score: f64) -> Self {
        Self {
            sentiment_score: Some(score),
            ..self
        }
    }
}
