use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use futures::StreamExt;
use placefinder::api::DEFAULT_RADIUS_M;
use placefinder::cache::{PlaceCache, expiry_cutoff};
use placefinder::config::CacheBackend;
use placefinder::{
    Coordinate, FetchStatus, MemoryPlaceCache, PersistentPlaceCache, PlaceFetchOrchestrator,
    PlaceFinderConfig, PlaceFinderError, logging, web,
};
use tracing::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(name = "placefinder", version, about = "Find nearby places with aggregated reviews")]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run one search and print the places as JSON
    Search {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        /// Radius in meters
        #[arg(short, long, default_value_t = DEFAULT_RADIUS_M)]
        radius: u32,
    },
    /// Remove expired entries from the cache
    Purge,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = PlaceFinderConfig::load_from_path(cli.config)?;
    logging::init(&config.logging)?;
    debug!("Loaded config: {:?}", config.cache);

    let cache = open_cache(&config)?;

    match cli.command {
        Command::Serve { port } => {
            spawn_sweep(
                cache.clone(),
                config.cache.ttl(),
                config.cache.sweep_interval(),
            );
            let orchestrator = PlaceFetchOrchestrator::from_config(&config, cache)?;
            web::run(port.unwrap_or(config.server.port), Arc::new(orchestrator)).await
        }
        Command::Search { lat, lng, radius } => {
            let coordinate = Coordinate::try_new(lat, lng)?;
            let orchestrator = PlaceFetchOrchestrator::from_config(&config, cache)?;
            search(&orchestrator, coordinate, radius).await
        }
        Command::Purge => {
            if config.cache.backend != CacheBackend::Disk {
                return Err(PlaceFinderError::config(
                    "purge needs the disk cache backend (cache.backend = \"disk\")",
                )
                .into());
            }
            let removed = purge(cache.as_ref(), config.cache.ttl()).await?;
            println!("Removed {removed} expired cache entries");
            Ok(())
        }
    }
}

fn open_cache(config: &PlaceFinderConfig) -> Result<Arc<dyn PlaceCache>> {
    match config.cache.backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryPlaceCache::new())),
        CacheBackend::Disk => {
            let location = PathBuf::from(&config.cache.location);
            std::fs::create_dir_all(&location).map_err(|e| {
                PlaceFinderError::cache(format!(
                    "cannot create cache directory {}: {e}",
                    location.display()
                ))
            })?;
            info!("Using disk cache at {}", location.display());
            let cache = PersistentPlaceCache::open(&location).map_err(|e| {
                PlaceFinderError::cache(format!(
                    "cannot open cache at {}: {e:#}",
                    location.display()
                ))
            })?;
            Ok(Arc::new(cache))
        }
    }
}

async fn purge(cache: &dyn PlaceCache, ttl: Duration) -> Result<usize> {
    let before = expiry_cutoff(Utc::now(), ttl).context("Cache TTL out of range")?;
    cache.purge_expired(before).await
}

fn spawn_sweep(cache: Arc<dyn PlaceCache>, ttl: Duration, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match purge(cache.as_ref(), ttl).await {
                Ok(0) => debug!("Cache sweep found nothing to remove"),
                Ok(removed) => info!("Cache sweep removed {} expired entries", removed),
                Err(e) => warn!("Cache sweep failed: {:#}", e),
            }
        }
    });
}

async fn search(
    orchestrator: &PlaceFetchOrchestrator,
    coordinate: Coordinate,
    radius: u32,
) -> Result<()> {
    let updates = orchestrator.fetch_with_status(coordinate, radius);
    futures::pin_mut!(updates);

    while let Some(update) = updates.next().await {
        match update {
            FetchStatus::Loading { reason } => eprintln!("{reason}"),
            FetchStatus::Success { places } => {
                println!("{}", serde_json::to_string_pretty(&places)?);
            }
            FetchStatus::Error { message } => {
                eprintln!("❌ {message}");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
