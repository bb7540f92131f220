use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::http::{build_client, ensure_success};
use super::{FallbackPlaceRecord, FallbackPlaceSource, GeoQuery};

pub const DEFAULT_BASE_URL: &str = "https://overpass-api.de";
const INTERPRETER_PATH: &str = "/api/interpreter";
const UNKNOWN_NAME: &str = "Unknown";

/// OpenStreetMap Overpass client used as the degraded place source
pub struct OverpassClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
struct OverpassElement {
    id: u64,
    #[serde(default)]
    tags: HashMap<String, String>,
}

impl From<OverpassElement> for FallbackPlaceRecord {
    fn from(element: OverpassElement) -> Self {
        let name = element
            .tags
            .get("name")
            .cloned()
            .unwrap_or_else(|| UNKNOWN_NAME.to_string());
        FallbackPlaceRecord {
            id: element.id.to_string(),
            name,
        }
    }
}

/// Overpass QL selecting amenity nodes around a point
#[must_use]
pub fn build_query(query: &GeoQuery) -> String {
    format!(
        "[out:json]; node[\"amenity\"~\"{}\"](around:{},{},{}); out body;",
        query.tags.join("|"),
        query.radius_m,
        query.coordinate.latitude,
        query.coordinate.longitude
    )
}

impl OverpassClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl FallbackPlaceSource for OverpassClient {
    async fn search(&self, query: &GeoQuery) -> Result<Vec<FallbackPlaceRecord>> {
        let overpass_ql = build_query(query);
        debug!("Overpass query: {}", overpass_ql);

        let response = self
            .client
            .post(format!("{}{}", self.base_url, INTERPRETER_PATH))
            .form(&[("data", overpass_ql)])
            .send()
            .await
            .context("Overpass request failed")?;

        let body: OverpassResponse = ensure_success(response, "Overpass")
            .await?
            .json()
            .await
            .context("Failed to parse Overpass response")?;

        Ok(body.elements.into_iter().map(Into::into).collect())
    }
}
