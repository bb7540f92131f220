//! Review enrichment
//!
//! This module gathers reviews for a place from two independent secondary
//! sources, drops spam, and scores what is left:
//! - `SpamFilter`: promotional-token and minimum-length rules
//! - `KeywordRanker`: degree ranking over a word co-occurrence graph
//! - `SentimentScorer`: lexicon lookup over the ranked keywords
//! - `ReviewAggregator`: concurrent fan-out, merge, filter and score

pub mod keywords;
pub mod sentiment;
pub mod spam;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::{debug, warn};

use crate::models::{Coordinate, Review, ReviewSource};
use crate::sources::{ScrapeReviewSource, SocialReviewSource};

pub use keywords::KeywordRanker;
pub use sentiment::SentimentScorer;
pub use spam::SpamFilter;

/// Build the social search query for a place name.
///
/// Matches the name or its hashtag form in food-related posts, optionally
/// restricted to one country.
#[must_use]
pub fn social_query(place_name: &str, country: Option<&str>) -> String {
    let hashtag: String = place_name.split_whitespace().collect();
    let mut query = format!("({place_name} OR #{hashtag}) (food OR meal)");
    if let Some(country) = country {
        query.push_str(&format!(" place_country:{country}"));
    }
    query
}

/// Collects, filters and scores reviews from the secondary sources.
///
/// A failing, slow or cancelled source contributes nothing; it never fails
/// the aggregate.
pub struct ReviewAggregator {
    scrape: Arc<dyn ScrapeReviewSource>,
    social: Arc<dyn SocialReviewSource>,
    spam_filter: SpamFilter,
    scorer: SentimentScorer,
    source_timeout: Option<Duration>,
    social_country: Option<String>,
}

impl ReviewAggregator {
    #[must_use]
    pub fn new(scrape: Arc<dyn ScrapeReviewSource>, social: Arc<dyn SocialReviewSource>) -> Self {
        Self {
            scrape,
            social,
            spam_filter: SpamFilter::new(),
            scorer: SentimentScorer::default(),
            source_timeout: None,
            social_country: None,
        }
    }

    /// Give up on a source after `timeout`, treating it as empty
    #[must_use]
    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = Some(timeout);
        self
    }

    /// Restrict social mentions to a country code
    #[must_use]
    pub fn with_social_country<S: Into<String>>(mut self, country: S) -> Self {
        self.social_country = Some(country.into());
        self
    }

    /// Reviews for one place: scrape results first, then social results,
    /// spam removed, each survivor carrying a sentiment score.
    pub async fn fetch(&self, place_name: &str, coordinate: Coordinate) -> Vec<Review> {
        let query = social_query(place_name, self.social_country.as_deref());

        let (scraped, mentions) = tokio::join!(
            self.absorb_failure(
                ReviewSource::Scrape,
                place_name,
                self.scrape.fetch_reviews(place_name, coordinate)
            ),
            self.absorb_failure(
                ReviewSource::Social,
                place_name,
                self.social.search_mentions(&query)
            ),
        );

        let collected = scraped.len() + mentions.len();
        let reviews: Vec<Review> = scraped
            .into_iter()
            .map(|r| Review::new(ReviewSource::Scrape, r.content, r.rating, r.timestamp))
            .chain(
                mentions
                    .into_iter()
                    .map(|m| Review::new(ReviewSource::Social, m.content, None, m.timestamp)),
            )
            .filter(|review| !self.spam_filter.is_spam(&review.content))
            .map(|review| {
                let score = self.scorer.score(&review.content);
                review.with_sentiment(score)
            })
            .collect();

        debug!(
            "Kept {} of {} reviews for '{}'",
            reviews.len(),
            collected,
            place_name
        );
        reviews
    }

    async fn absorb_failure<T, F>(&self, source: ReviewSource, place_name: &str, call: F) -> Vec<T>
    where
        F: Future<Output = Result<Vec<T>>>,
    {
        let outcome = match self.source_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or_else(|_| Err(anyhow!("timed out after {:.1}s", limit.as_secs_f64()))),
            None => call.await,
        };

        outcome.unwrap_or_else(|e| {
            warn!("{} reviews for '{}' unavailable: {:#}", source, place_name, e);
            Vec::new()
        })
    }
}
