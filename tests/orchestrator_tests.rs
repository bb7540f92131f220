//! Integration tests driving the orchestrator through in-memory sources

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;
use chrono::Utc;
use placefinder::cache::{CacheEntry, MemoryPlaceCache, PlaceCache};
use placefinder::orchestrator::{PRIMARY_DEPENDENCY, SearchSettings};
use placefinder::sources::{
    FallbackPlaceRecord, FallbackPlaceSource, GeoQuery, PrimaryPlaceRecord, PrimaryPlaceSource,
    ScrapeReviewSource, ScrapedReview, SocialMention, SocialReviewSource,
};
use placefinder::{
    CircuitBreaker, Coordinate, Place, PlaceFetchOrchestrator, RateLimiter, ReviewAggregator,
    ReviewSource,
};
use tokio::time::Instant;

#[derive(Default)]
struct CountingPrimary {
    fail: AtomicBool,
    delay: Duration,
    calls: Mutex<Vec<Instant>>,
}

impl CountingPrimary {
    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl PrimaryPlaceSource for CountingPrimary {
    async fn search(
        &self,
        _coordinate: Coordinate,
        _radius_m: u32,
        category_filter: &str,
        _field_mask: &str,
    ) -> Result<Vec<PrimaryPlaceRecord>> {
        self.calls.lock().unwrap().push(Instant::now());
        assert_eq!(category_filter, "restaurant|bakery");
        tokio::time::sleep(self.delay).await;
        if self.fail.load(Ordering::SeqCst) {
            bail!("HTTP 500 Internal Server Error");
        }
        Ok(vec![
            PrimaryPlaceRecord {
                id: "ChIJ1".to_string(),
                name: "Dosa Corner".to_string(),
                rating: Some(4.4),
                review_count: Some(812),
                price_level: Some(1),
            },
            PrimaryPlaceRecord {
                id: "ChIJ2".to_string(),
                name: "Bun World".to_string(),
                rating: Some(3.9),
                review_count: Some(64),
                price_level: None,
            },
        ])
    }
}

#[derive(Default)]
struct CountingFallback {
    calls: AtomicUsize,
}

#[async_trait]
impl FallbackPlaceSource for CountingFallback {
    async fn search(&self, query: &GeoQuery) -> Result<Vec<FallbackPlaceRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![FallbackPlaceRecord {
            id: "4242".to_string(),
            name: format!("Bakery within {}m", query.radius_m),
        }])
    }
}

#[derive(Default)]
struct CountingScrape {
    delay: Duration,
    calls: AtomicUsize,
}

#[async_trait]
impl ScrapeReviewSource for CountingScrape {
    async fn fetch_reviews(&self, place_name: &str, _: Coordinate) -> Result<Vec<ScrapedReview>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        if place_name == "Bun World" {
            bail!("captcha page");
        }
        Ok(vec![
            ScrapedReview {
                content: "Excellent crispy dosa with great chutney".to_string(),
                rating: Some(5.0),
                timestamp: "March 3, 2024".to_string(),
            },
            ScrapedReview {
                content: "Claim your free meal voucher at www.example.com".to_string(),
                rating: Some(1.0),
                timestamp: "March 4, 2024".to_string(),
            },
        ])
    }
}

#[derive(Default)]
struct CountingSocial {
    delay: Duration,
    calls: AtomicUsize,
}

#[async_trait]
impl SocialReviewSource for CountingSocial {
    async fn search_mentions(&self, _query: &str) -> Result<Vec<SocialMention>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(vec![SocialMention {
            content: "Queue was long but the food came quickly".to_string(),
            timestamp: "2024-03-05T09:30:00.000Z".to_string(),
        }])
    }
}

struct Harness {
    primary: Arc<CountingPrimary>,
    fallback: Arc<CountingFallback>,
    scrape: Arc<CountingScrape>,
    social: Arc<CountingSocial>,
    cache: Arc<MemoryPlaceCache>,
    orchestrator: PlaceFetchOrchestrator,
}

impl Harness {
    fn new(rate_limit: Duration) -> Self {
        Self::with_sources(
            rate_limit,
            CountingPrimary::default(),
            CountingScrape::default(),
            CountingSocial::default(),
        )
    }

    fn with_sources(
        rate_limit: Duration,
        primary: CountingPrimary,
        scrape: CountingScrape,
        social: CountingSocial,
    ) -> Self {
        let primary = Arc::new(primary);
        let fallback = Arc::new(CountingFallback::default());
        let scrape = Arc::new(scrape);
        let social = Arc::new(social);
        let cache = Arc::new(MemoryPlaceCache::new());

        let orchestrator = PlaceFetchOrchestrator::new(
            primary.clone(),
            fallback.clone(),
            ReviewAggregator::new(scrape.clone(), social.clone()),
            cache.clone(),
            Arc::new(RateLimiter::new(rate_limit)),
            Arc::new(CircuitBreaker::default()),
            SearchSettings::default(),
        );

        Self {
            primary,
            fallback,
            scrape,
            social,
            cache,
            orchestrator,
        }
    }

    fn network_calls(&self) -> usize {
        self.primary.call_count()
            + self.fallback.calls.load(Ordering::SeqCst)
            + self.scrape.calls.load(Ordering::SeqCst)
            + self.social.calls.load(Ordering::SeqCst)
    }
}

fn bangalore() -> Coordinate {
    Coordinate::new(12.9, 77.6)
}

#[tokio::test]
async fn test_fresh_cache_entry_short_circuits() {
    let harness = Harness::new(Duration::ZERO);
    let cached = vec![Place::bare("cached-1".to_string(), "Cached Cafe".to_string())];
    harness
        .cache
        .store(CacheEntry::with_timestamp(
            bangalore(),
            2,
            cached.clone(),
            Utc::now() - chrono::Duration::minutes(10),
        ))
        .await
        .unwrap();

    let places = harness.orchestrator.fetch(bangalore(), 2).await.unwrap();

    assert_eq!(places, cached);
    assert_eq!(harness.network_calls(), 0);
}

#[tokio::test]
async fn test_end_to_end_enrichment_then_cached() {
    let harness = Harness::new(Duration::ZERO);

    let places = harness.orchestrator.fetch(bangalore(), 1).await.unwrap();
    assert_eq!(places.len(), 2);

    let dosa = &places[0];
    assert_eq!(dosa.name, "Dosa Corner");
    assert_eq!(dosa.rating, Some(4.4));
    assert_eq!(dosa.reviews.len(), 2);
    assert_eq!(dosa.reviews[0].source, ReviewSource::Scrape);
    assert_eq!(dosa.reviews[0].sentiment_score, Some(1.0));
    assert_eq!(dosa.reviews[1].source, ReviewSource::Social);
    assert_eq!(dosa.reviews[1].sentiment_score, Some(0.0));

    let bun = &places[1];
    assert_eq!(bun.reviews.len(), 1);
    assert_eq!(bun.reviews[0].source, ReviewSource::Social);

    let calls_after_first = harness.network_calls();
    assert_eq!(calls_after_first, 5);

    let again = harness.orchestrator.fetch(bangalore(), 1).await.unwrap();
    assert_eq!(again, places);
    assert_eq!(harness.network_calls(), calls_after_first);
}

#[tokio::test(start_paused = true)]
async fn test_primary_calls_are_spaced_by_rate_limit() {
    let harness = Harness::new(Duration::from_secs(2));

    harness.orchestrator.fetch(bangalore(), 1).await.unwrap();
    harness.orchestrator.fetch(bangalore(), 2).await.unwrap();
    harness.orchestrator.fetch(bangalore(), 3).await.unwrap();

    let calls = harness.primary.calls.lock().unwrap().clone();
    assert_eq!(calls.len(), 3);
    for pair in calls.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_secs(2));
    }
}

#[tokio::test(start_paused = true)]
async fn test_breaker_trips_to_fallback_and_recovers() {
    let harness = Harness::new(Duration::ZERO);
    harness.primary.fail.store(true, Ordering::SeqCst);

    for _ in 0..3 {
        let err = harness.orchestrator.fetch(bangalore(), 500).await.unwrap_err();
        assert!(err.is_dependency_failure());
    }
    assert_eq!(harness.primary.call_count(), 3);
    assert_eq!(harness.fallback.calls.load(Ordering::SeqCst), 0);

    let degraded = harness.orchestrator.fetch(bangalore(), 500).await.unwrap();
    assert_eq!(
        degraded,
        vec![Place::bare("4242".to_string(), "Bakery within 500m".to_string())]
    );
    assert_eq!(harness.primary.call_count(), 3);
    assert!(harness.cache.is_empty().await);

    harness.primary.fail.store(false, Ordering::SeqCst);
    tokio::time::advance(Duration::from_secs(60)).await;

    let recovered = harness.orchestrator.fetch(bangalore(), 500).await.unwrap();
    assert_eq!(recovered.len(), 2);
    assert_eq!(harness.primary.call_count(), 4);
    assert_eq!(
        harness
            .orchestrator
            .circuit_breaker()
            .failure_count(PRIMARY_DEPENDENCY),
        0
    );
}

#[tokio::test(start_paused = true)]
async fn test_review_fetches_run_concurrently() {
    let harness = Harness::with_sources(
        Duration::ZERO,
        CountingPrimary::default(),
        CountingScrape {
            delay: Duration::from_secs(1),
            ..Default::default()
        },
        CountingSocial {
            delay: Duration::from_secs(1),
            ..Default::default()
        },
    );

    let start = Instant::now();
    let places = harness.orchestrator.fetch(bangalore(), 1).await.unwrap();
    let elapsed = start.elapsed();

    // Two places times two sources, one second each
    assert_eq!(places.len(), 2);
    assert_eq!(harness.scrape.calls.load(Ordering::SeqCst), 2);
    assert_eq!(harness.social.calls.load(Ordering::SeqCst), 2);
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_fetch_records_no_failure() {
    let harness = Harness::with_sources(
        Duration::ZERO,
        CountingPrimary {
            delay: Duration::from_secs(10),
            ..Default::default()
        },
        CountingScrape::default(),
        CountingSocial::default(),
    );

    let outcome =
        tokio::time::timeout(Duration::from_secs(1), harness.orchestrator.fetch(bangalore(), 1))
            .await;

    assert!(outcome.is_err());
    assert_eq!(harness.primary.call_count(), 1);
    assert_eq!(
        harness
            .orchestrator
            .circuit_breaker()
            .failure_count(PRIMARY_DEPENDENCY),
        0
    );
    assert!(harness.cache.is_empty().await);
}
