use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::http::{build_client, ensure_success};
use super::{PrimaryPlaceRecord, PrimaryPlaceSource};
use crate::models::Coordinate;

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";
const NEARBY_SEARCH_PATH: &str = "/maps/api/place/nearbysearch/json";

/// Google Places nearby search
pub struct GooglePlacesClient {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct NearbySearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<NearbyResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NearbyResult {
    place_id: String,
    name: String,
    rating: Option<f64>,
    user_ratings_total: Option<u32>,
    price_level: Option<u8>,
}

impl From<NearbyResult> for PrimaryPlaceRecord {
    fn from(result: NearbyResult) -> Self {
        PrimaryPlaceRecord {
            id: result.place_id,
            name: result.name,
            rating: result.rating,
            review_count: result.user_ratings_total,
            price_level: result.price_level,
        }
    }
}

impl GooglePlacesClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl PrimaryPlaceSource for GooglePlacesClient {
    async fn search(
        &self,
        coordinate: Coordinate,
        radius_m: u32,
        category_filter: &str,
        field_mask: &str,
    ) -> Result<Vec<PrimaryPlaceRecord>> {
        let url = format!("{}{}", self.base_url, NEARBY_SEARCH_PATH);
        debug!(
            "Google nearby search at {} within {}m",
            coordinate.to_query_param(),
            radius_m
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("location", coordinate.to_query_param()),
                ("radius", radius_m.to_string()),
                ("type", category_filter.to_string()),
                ("fields", field_mask.to_string()),
                ("key", self.api_key.clone()),
            ])
            .send()
            .await
            .context("Google Places request failed")?;

        let body: NearbySearchResponse = ensure_success(response, "Google Places")
            .await?
            .json()
            .await
            .context("Failed to parse Google Places response")?;

        match body.status.as_str() {
            "OK" | "ZERO_RESULTS" => Ok(body.results.into_iter().map(Into::into).collect()),
            status => bail!(
                "Google Places returned status {}: {}",
                status,
                body.error_message.unwrap_or_default()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> GooglePlacesClient {
        GooglePlacesClient::new(&server.base_url(), "test-key", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_search_maps_results() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path(NEARBY_SEARCH_PATH)
                    .query_param("location", "12.9,77.6")
                    .query_param("radius", "2")
                    .query_param("type", "restaurant|bakery")
                    .query_param("key", "test-key");
                then.status(200).json_body(json!({
                    "status": "OK",
                    "results": [
                        {
                            "place_id": "abc",
                            "name": "Dosa Corner",
                            "rating": 4.4,
                            "user_ratings_total": 812,
                            "price_level": 1
                        },
                        { "place_id": "def", "name": "Bun World" }
                    ]
                }));
            })
            .await;

        let records = client(&server)
            .search(
                Coordinate::new(12.9, 77.6),
                2,
                "restaurant|bakery",
                "name,rating,user_ratings_total,price_level",
            )
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "abc");
        assert_eq!(records[0].review_count, Some(812));
        assert_eq!(records[0].price_level, Some(1));
        assert_eq!(records[1].rating, None);
    }

    #[tokio::test]
    async fn test_zero_results_is_empty() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(NEARBY_SEARCH_PATH);
                then.status(200)
                    .json_body(json!({ "status": "ZERO_RESULTS", "results": [] }));
            })
            .await;

        let records = client(&server)
            .search(Coordinate::new(0.0, 0.0), 100, "restaurant", "name")
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_denied_status_is_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(NEARBY_SEARCH_PATH);
                then.status(200).json_body(json!({
                    "status": "REQUEST_DENIED",
                    "error_message": "The provided API key is invalid."
                }));
            })
            .await;

        let err = client(&server)
            .search(Coordinate::new(0.0, 0.0), 100, "restaurant", "name")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("REQUEST_DENIED"));
    }

    #[tokio::test]
    async fn test_http_error_is_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path(NEARBY_SEARCH_PATH);
                then.status(503).body("unavailable");
            })
            .await;

        let err = client(&server)
            .search(Coordinate::new(0.0, 0.0), 100, "restaurant", "name")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("503"));
    }
}
