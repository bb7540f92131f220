use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::http::{build_retrying_client, ensure_success};
use super::{ScrapeReviewSource, ScrapedReview};
use crate::models::Coordinate;

pub const DEFAULT_BASE_URL: &str = "https://www.tripadvisor.com";

/// Scrapes reviews from TripAdvisor search result pages
pub struct TripAdvisorScraper {
    client: ClientWithMiddleware,
    base_url: String,
}

impl TripAdvisorScraper {
    pub fn new(base_url: &str, timeout: Duration, max_retries: u32) -> Result<Self> {
        Ok(Self {
            client: build_retrying_client(timeout, max_retries)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Search page URL for a place near a coordinate
    #[must_use]
    pub fn search_url(&self, place_name: &str, coordinate: Coordinate) -> String {
        let query = place_name
            .split_whitespace()
            .map(|word| urlencoding::encode(word).into_owned())
            .collect::<Vec<_>>()
            .join("+");
        let (lat, lng) = coordinate.rounded(2);
        format!("{}/Search?q={}&geo={},{}", self.base_url, query, lat, lng)
    }
}

#[async_trait]
impl ScrapeReviewSource for TripAdvisorScraper {
    async fn fetch_reviews(
        &self,
        place_name: &str,
        coordinate: Coordinate,
    ) -> Result<Vec<ScrapedReview>> {
        let url = self.search_url(place_name, coordinate);
        debug!("Scraping reviews from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("TripAdvisor request failed")?;

        let html = ensure_success(response, "TripAdvisor")
            .await?
            .text()
            .await
            .context("Failed to read TripAdvisor page")?;

        Ok(parse_reviews(&html))
    }
}

/// Extract review blocks from a search result page.
///
/// Blocks without review text are skipped. An unreadable bubble rating
/// leaves the rating empty.
#[must_use]
pub fn parse_reviews(html: &str) -> Vec<ScrapedReview> {
    let document = Html::parse_document(html);
    let container_sel = Selector::parse(".review-container").unwrap_or_else(|_| unreachable!());
    let text_sel = Selector::parse(".reviewText").unwrap_or_else(|_| unreachable!());
    let rating_sel = Selector::parse(".ui_bubble_rating").unwrap_or_else(|_| unreachable!());
    let date_sel = Selector::parse(".ratingDate").unwrap_or_else(|_| unreachable!());

    document
        .select(&container_sel)
        .filter_map(|container| {
            let content = container
                .select(&text_sel)
                .next()
                .map(element_text)
                .filter(|text| !text.is_empty())?;

            let rating = container
                .select(&rating_sel)
                .next()
                .and_then(|bubble| bubble.value().attr("class"))
                .and_then(bubble_rating);

            let timestamp = container
                .select(&date_sel)
                .next()
                .map(|date| {
                    date.value()
                        .attr("title")
                        .map_or_else(|| element_text(date), str::to_string)
                })
                .unwrap_or_default();

            Some(ScrapedReview {
                content,
                rating,
                timestamp,
            })
        })
        .collect()
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// `"ui_bubble_rating bubble_45"` -> 4.5
fn bubble_rating(class_attr: &str) -> Option<f64> {
    let (_, suffix) = class_attr.rsplit_once('_')?;
    suffix.trim().parse::<f64>().ok().map(|value| value / 10.0)
}
