//! Place search orchestration
//!
//! A search consults the cache first, then either the primary source (rate
//! limited, guarded by the circuit breaker) or, while the primary circuit is
//! open, the fallback source. Primary results are enriched with reviews and
//! written back to the cache.

use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use chrono::Utc;
use futures::Stream;
use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheEntry, DEFAULT_TTL, PlaceCache};
use crate::config::PlaceFinderConfig;
use crate::models::{Coordinate, FetchStatus, Place};
use crate::resilience::{CircuitBreaker, RateLimiter};
use crate::reviews::ReviewAggregator;
use crate::sources::{
    FallbackPlaceSource, GeoQuery, GooglePlacesClient, OverpassClient, PrimaryPlaceSource,
    TripAdvisorScraper, TwitterSearchClient,
};
use crate::{PlaceFinderError, Result};

/// Circuit breaker key of the primary source
pub const PRIMARY_DEPENDENCY: &str = "primary";
/// Circuit breaker key of the fallback source
pub const FALLBACK_DEPENDENCY: &str = "fallback";

pub const SEARCHING_MESSAGE: &str = "Searching nearby places...";
pub const FALLBACK_MESSAGE: &str = "Using fallback API...";

/// Per-search parameters passed through to the sources
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub cache_ttl: Duration,
    pub category_filter: String,
    pub field_mask: String,
    pub fallback_tags: Vec<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_TTL,
            category_filter: "restaurant|bakery".to_string(),
            field_mask: "name,rating,user_ratings_total,price_level".to_string(),
            fallback_tags: vec!["restaurant".to_string(), "bakery".to_string()],
        }
    }
}

impl From<&PlaceFinderConfig> for SearchSettings {
    fn from(config: &PlaceFinderConfig) -> Self {
        Self {
            cache_ttl: config.cache.ttl(),
            category_filter: config.primary.category_filter.clone(),
            field_mask: config.primary.field_mask.clone(),
            fallback_tags: config.fallback.amenity_tags.clone(),
        }
    }
}

enum Route {
    Cached(Vec<Place>),
    Fallback,
    Primary,
}

pub struct PlaceFetchOrchestrator {
    primary: Arc<dyn PrimaryPlaceSource>,
    fallback: Arc<dyn FallbackPlaceSource>,
    reviews: ReviewAggregator,
    cache: Arc<dyn PlaceCache>,
    rate_limiter: Arc<RateLimiter>,
    circuit_breaker: Arc<CircuitBreaker>,
    settings: SearchSettings,
}

impl PlaceFetchOrchestrator {
    #[must_use]
    pub fn new(
        primary: Arc<dyn PrimaryPlaceSource>,
        fallback: Arc<dyn FallbackPlaceSource>,
        reviews: ReviewAggregator,
        cache: Arc<dyn PlaceCache>,
        rate_limiter: Arc<RateLimiter>,
        circuit_breaker: Arc<CircuitBreaker>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            primary,
            fallback,
            reviews,
            cache,
            rate_limiter,
            circuit_breaker,
            settings,
        }
    }

    /// Wire up the HTTP sources described by `config` around `cache`
    pub fn from_config(
        config: &PlaceFinderConfig,
        cache: Arc<dyn PlaceCache>,
    ) -> anyhow::Result<Self> {
        let primary = GooglePlacesClient::new(
            &config.primary.base_url,
            config.primary.api_key.as_deref().unwrap_or_default(),
            config.primary.timeout(),
        )?;
        let fallback = OverpassClient::new(&config.fallback.base_url, config.fallback.timeout())?;

        let scrape = TripAdvisorScraper::new(
            &config.reviews.scrape_base_url,
            config.reviews.timeout(),
            config.reviews.max_retries,
        )?;
        let social = TwitterSearchClient::new(
            &config.reviews.social_base_url,
            config.reviews.social_bearer_token.as_deref().unwrap_or_default(),
            config.reviews.timeout(),
            config.reviews.max_retries,
        )?;

        // Retries happen inside the per-source window, so allow for them
        let review_budget = config.reviews.timeout() * (config.reviews.max_retries + 1);
        let mut reviews = ReviewAggregator::new(Arc::new(scrape), Arc::new(social))
            .with_source_timeout(review_budget);
        if let Some(country) = &config.reviews.social_country {
            reviews = reviews.with_social_country(country.clone());
        }

        Ok(Self::new(
            Arc::new(primary),
            Arc::new(fallback),
            reviews,
            cache,
            Arc::new(RateLimiter::new(config.rate_limit.interval())),
            Arc::new(CircuitBreaker::new(
                config.circuit_breaker.failure_threshold,
                config.circuit_breaker.reset_timeout(),
            )),
            SearchSettings::from(config),
        ))
    }

    #[must_use]
    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    /// Places within `radius` meters of `coordinate`
    #[instrument(skip(self, coordinate), fields(location = %coordinate.format_coordinates()))]
    pub async fn fetch(&self, coordinate: Coordinate, radius: u32) -> Result<Vec<Place>> {
        match self.route(coordinate, radius).await {
            Route::Cached(places) => Ok(places),
            Route::Fallback => self.fetch_fallback(coordinate, radius).await,
            Route::Primary => self.fetch_primary(coordinate, radius).await,
        }
    }

    /// Same search as `fetch`, reported as progress updates ending in exactly
    /// one `Success` or `Error`.
    pub fn fetch_with_status(
        &self,
        coordinate: Coordinate,
        radius: u32,
    ) -> impl Stream<Item = FetchStatus> + Send + '_ {
        stream! {
            yield FetchStatus::loading(SEARCHING_MESSAGE);

            let result = match self.route(coordinate, radius).await {
                Route::Cached(places) => Ok(places),
                Route::Fallback => {
                    yield FetchStatus::loading(FALLBACK_MESSAGE);
                    self.fetch_fallback(coordinate, radius).await
                }
                Route::Primary => self.fetch_primary(coordinate, radius).await,
            };

            yield FetchStatus::from(result);
        }
    }

    async fn route(&self, coordinate: Coordinate, radius: u32) -> Route {
        if let Some(places) = self.cached_places(coordinate, radius).await {
            return Route::Cached(places);
        }

        if self.circuit_breaker.should_block(PRIMARY_DEPENDENCY) {
            info!("Primary source circuit open, routing to fallback");
            Route::Fallback
        } else {
            Route::Primary
        }
    }

    async fn cached_places(&self, coordinate: Coordinate, radius: u32) -> Option<Vec<Place>> {
        match self.cache.lookup(coordinate, radius).await {
            Ok(Some(entry)) if entry.is_fresh(Utc::now(), self.settings.cache_ttl) => {
                debug!("Cache hit with {} places", entry.places.len());
                Some(entry.places)
            }
            Ok(Some(entry)) => {
                debug!("Cache entry from {} is stale", entry.created_at);
                None
            }
            Ok(None) => {
                debug!("Cache miss");
                None
            }
            Err(e) => {
                warn!("Cache lookup failed, treating as miss: {:#}", e);
                None
            }
        }
    }

    async fn fetch_primary(&self, coordinate: Coordinate, radius: u32) -> Result<Vec<Place>> {
        self.rate_limiter.acquire().await;

        let records = self
            .primary
            .search(
                coordinate,
                radius,
                &self.settings.category_filter,
                &self.settings.field_mask,
            )
            .await
            .map_err(|e| {
                self.circuit_breaker.record_failure(PRIMARY_DEPENDENCY);
                warn!("Primary source failed: {:#}", e);
                PlaceFinderError::dependency(PRIMARY_DEPENDENCY, format!("{e:#}"))
            })?;

        let places = join_all(records.into_iter().map(|record| async move {
            let mut place = Place::from(record);
            place.reviews = self.reviews.fetch(&place.name, coordinate).await;
            place
        }))
        .await;

        info!("Found {} places from primary source", places.len());

        let entry = CacheEntry::new(coordinate, radius, places.clone());
        if let Err(e) = self.cache.store(entry).await {
            warn!("Failed to cache search result: {:#}", e);
        }

        Ok(places)
    }

    async fn fetch_fallback(&self, coordinate: Coordinate, radius: u32) -> Result<Vec<Place>> {
        let query = GeoQuery {
            coordinate,
            radius_m: radius,
            tags: self.settings.fallback_tags.clone(),
        };

        let records = self.fallback.search(&query).await.map_err(|e| {
            self.circuit_breaker.record_failure(FALLBACK_DEPENDENCY);
            warn!("Fallback source failed: {:#}", e);
            PlaceFinderError::dependency(FALLBACK_DEPENDENCY, format!("{e:#}"))
        })?;

        info!("Found {} places from fallback source", records.len());
        Ok(records.into_iter().map(Place::from).collect())
    }
}
