//! Configuration management for `PlaceFinder`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::PlaceFinderError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the `PlaceFinder` application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceFinderConfig {
    /// Primary place source (Google Places)
    pub primary: PrimaryConfig,
    /// Fallback place source (Overpass)
    pub fallback: FallbackConfig,
    /// Secondary review sources
    pub reviews: ReviewsConfig,
    pub rate_limit: RateLimitConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
    pub server: ServerConfig,
}

/// Primary place source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryConfig {
    #[serde(default = "default_primary_base_url")]
    pub base_url: String,
    /// Google Places API key
    pub api_key: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_primary_timeout")]
    pub timeout_seconds: u32,
    /// Place types to search for, `|`-separated
    #[serde(default = "default_category_filter")]
    pub category_filter: String,
    /// Fields requested per place
    #[serde(default = "default_field_mask")]
    pub field_mask: String,
}

/// Fallback place source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    #[serde(default = "default_fallback_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_fallback_timeout")]
    pub timeout_seconds: u32,
    /// `amenity` tag values to match
    #[serde(default = "default_amenity_tags")]
    pub amenity_tags: Vec<String>,
}

/// Review source settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewsConfig {
    #[serde(default = "default_scrape_base_url")]
    pub scrape_base_url: String,
    #[serde(default = "default_social_base_url")]
    pub social_base_url: String,
    /// Bearer token for the social search API
    pub social_bearer_token: Option<String>,
    /// Country code social mentions are restricted to, `""` for no restriction
    #[serde(default = "default_social_country")]
    pub social_country: Option<String>,
    /// Per-source timeout in seconds
    #[serde(default = "default_reviews_timeout")]
    pub timeout_seconds: u32,
    /// Retries for transient failures
    #[serde(default = "default_reviews_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Minimum spacing between primary calls in milliseconds
    #[serde(default = "default_rate_limit_interval")]
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_reset_timeout")]
    pub reset_timeout_seconds: u64,
}

/// Where cached place lists live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    Disk,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache TTL in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
    #[serde(default = "default_cache_backend")]
    pub backend: CacheBackend,
    /// Cache directory location, used by the disk backend
    #[serde(default = "default_cache_location")]
    pub location: String,
    /// How often expired entries are swept, in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_port")]
    pub port: u16,
}

// Default value functions
fn default_primary_base_url() -> String {
    crate::sources::google_places::DEFAULT_BASE_URL.to_string()
}

fn default_primary_timeout() -> u32 {
    10
}

fn default_category_filter() -> String {
    "restaurant|bakery".to_string()
}

fn default_field_mask() -> String {
    "name,rating,user_ratings_total,price_level".to_string()
}

fn default_fallback_base_url() -> String {
    crate::sources::overpass::DEFAULT_BASE_URL.to_string()
}

fn default_fallback_timeout() -> u32 {
    25
}

fn default_amenity_tags() -> Vec<String> {
    vec!["restaurant".to_string(), "bakery".to_string()]
}

fn default_scrape_base_url() -> String {
    crate::sources::tripadvisor::DEFAULT_BASE_URL.to_string()
}

fn default_social_base_url() -> String {
    crate::sources::twitter::DEFAULT_BASE_URL.to_string()
}

#[allow(clippy::unnecessary_wraps)]
fn default_social_country() -> Option<String> {
    Some("IN".to_string())
}

fn default_reviews_timeout() -> u32 {
    10
}

fn default_reviews_max_retries() -> u32 {
    2
}

fn default_rate_limit_interval() -> u64 {
    2000
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_reset_timeout() -> u64 {
    60
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_cache_backend() -> CacheBackend {
    CacheBackend::Memory
}

fn default_cache_location() -> String {
    dirs::cache_dir()
        .map(|dir| dir.join("placefinder"))
        .unwrap_or_else(|| PathBuf::from(".placefinder-cache"))
        .to_string_lossy()
        .into_owned()
}

fn default_sweep_interval() -> u64 {
    600
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_server_port() -> u16 {
    3000
}

impl Default for PrimaryConfig {
    fn default() -> Self {
        Self {
            base_url: default_primary_base_url(),
            api_key: None,
            timeout_seconds: default_primary_timeout(),
            category_filter: default_category_filter(),
            field_mask: default_field_mask(),
        }
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            base_url: default_fallback_base_url(),
            timeout_seconds: default_fallback_timeout(),
            amenity_tags: default_amenity_tags(),
        }
    }
}

impl Default for ReviewsConfig {
    fn default() -> Self {
        Self {
            scrape_base_url: default_scrape_base_url(),
            social_base_url: default_social_base_url(),
            social_bearer_token: None,
            social_country: default_social_country(),
            timeout_seconds: default_reviews_timeout(),
            max_retries: default_reviews_max_retries(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_rate_limit_interval(),
        }
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            reset_timeout_seconds: default_reset_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_cache_ttl(),
            backend: default_cache_backend(),
            location: default_cache_location(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
        }
    }
}

impl PrimaryConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.timeout_seconds))
    }
}

impl FallbackConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.timeout_seconds))
    }
}

impl ReviewsConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.timeout_seconds))
    }
}

impl RateLimitConfig {
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl CircuitBreakerConfig {
    #[must_use]
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_secs(self.reset_timeout_seconds)
    }
}

impl CacheConfig {
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }

    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}

impl PlaceFinderConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // PLACEFINDER_CACHE__TTL_SECONDS=600 overrides cache.ttl_seconds
        builder = builder.add_source(
            Environment::with_prefix("PLACEFINDER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: PlaceFinderConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("placefinder").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.primary.base_url.is_empty() {
            self.primary.base_url = default_primary_base_url();
        }
        if self.primary.timeout_seconds == 0 {
            self.primary.timeout_seconds = default_primary_timeout();
        }
        if self.primary.category_filter.is_empty() {
            self.primary.category_filter = default_category_filter();
        }
        if self.primary.field_mask.is_empty() {
            self.primary.field_mask = default_field_mask();
        }
        if self.fallback.base_url.is_empty() {
            self.fallback.base_url = default_fallback_base_url();
        }
        if self.fallback.timeout_seconds == 0 {
            self.fallback.timeout_seconds = default_fallback_timeout();
        }
        if self.fallback.amenity_tags.is_empty() {
            self.fallback.amenity_tags = default_amenity_tags();
        }
        if self.reviews.scrape_base_url.is_empty() {
            self.reviews.scrape_base_url = default_scrape_base_url();
        }
        if self.reviews.social_base_url.is_empty() {
            self.reviews.social_base_url = default_social_base_url();
        }
        if self.reviews.timeout_seconds == 0 {
            self.reviews.timeout_seconds = default_reviews_timeout();
        }
        // An empty country turns the social country filter off
        if self
            .reviews
            .social_country
            .as_deref()
            .is_some_and(|country| country.trim().is_empty())
        {
            self.reviews.social_country = None;
        }
        if self.circuit_breaker.failure_threshold == 0 {
            self.circuit_breaker.failure_threshold = default_failure_threshold();
        }
        if self.circuit_breaker.reset_timeout_seconds == 0 {
            self.circuit_breaker.reset_timeout_seconds = default_reset_timeout();
        }
        if self.cache.ttl_seconds == 0 {
            self.cache.ttl_seconds = default_cache_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.cache.sweep_interval_seconds == 0 {
            self.cache.sweep_interval_seconds = default_sweep_interval();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.server.port == 0 {
            self.server.port = default_server_port();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        // Without a key every primary call fails and searches run on the fallback
        if let Some(api_key) = &self.primary.api_key {
            if api_key.is_empty() {
                return Err(PlaceFinderError::config(
                    "Primary API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }

            if api_key.len() < 8 {
                return Err(PlaceFinderError::config(
                    "Primary API key appears to be invalid (too short). Please check your API key.",
                )
                .into());
            }
        }

        if let Some(token) = &self.reviews.social_bearer_token {
            if token.is_empty() {
                return Err(PlaceFinderError::config(
                    "Social bearer token cannot be empty if provided.",
                )
                .into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        let timeouts = [
            ("Primary", self.primary.timeout_seconds),
            ("Fallback", self.fallback.timeout_seconds),
            ("Review", self.reviews.timeout_seconds),
        ];
        for (name, seconds) in timeouts {
            if seconds > 300 {
                return Err(PlaceFinderError::config(format!(
                    "{name} timeout cannot exceed 300 seconds"
                ))
                .into());
            }
        }

        if self.reviews.max_retries > 10 {
            return Err(PlaceFinderError::config("Review max retries cannot exceed 10").into());
        }

        if self.rate_limit.interval_ms > 60_000 {
            return Err(
                PlaceFinderError::config("Rate limit interval cannot exceed 60000 ms").into(),
            );
        }

        if self.circuit_breaker.failure_threshold > 100 {
            return Err(PlaceFinderError::config(
                "Circuit breaker failure threshold cannot exceed 100",
            )
            .into());
        }

        if self.circuit_breaker.reset_timeout_seconds > 3600 {
            return Err(PlaceFinderError::config(
                "Circuit breaker reset timeout cannot exceed 3600 seconds",
            )
            .into());
        }

        if self.cache.ttl_seconds > 7 * 24 * 3600 {
            return Err(PlaceFinderError::config("Cache TTL cannot exceed 1 week").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(PlaceFinderError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "compact"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(PlaceFinderError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let urls = [
            ("Primary", &self.primary.base_url),
            ("Fallback", &self.fallback.base_url),
            ("Scrape", &self.reviews.scrape_base_url),
            ("Social", &self.reviews.social_base_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(PlaceFinderError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        // Tags are interpolated into Overpass QL
        if let Some(tag) = self.fallback.amenity_tags.iter().find(|tag| {
            tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }) {
            return Err(PlaceFinderError::config(format!(
                "Invalid amenity tag '{tag}'. Use letters, digits and underscores only"
            ))
            .into());
        }

        Ok(())
    }
}
