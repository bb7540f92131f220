use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::debug;

use super::http::{build_retrying_client, ensure_success};
use super::{SocialMention, SocialReviewSource};

pub const DEFAULT_BASE_URL: &str = "https://api.twitter.com";
const RECENT_SEARCH_PATH: &str = "/2/tweets/search/recent";

/// Twitter recent-search client
pub struct TwitterSearchClient {
    client: ClientWithMiddleware,
    base_url: String,
    bearer_token: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Tweet>,
}

#[derive(Debug, Deserialize)]
struct Tweet {
    text: String,
    #[serde(default)]
    created_at: String,
}

impl TwitterSearchClient {
    pub fn new(
        base_url: &str,
        bearer_token: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self> {
        Ok(Self {
            client: build_retrying_client(timeout, max_retries)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            bearer_token: bearer_token.to_string(),
        })
    }

    #[must_use]
    pub fn search_url(&self, query: &str) -> String {
        format!(
            "{}{}?query={}&tweet.fields=created_at",
            self.base_url,
            RECENT_SEARCH_PATH,
            urlencoding::encode(query)
        )
    }
}

#[async_trait]
impl SocialReviewSource for TwitterSearchClient {
    async fn search_mentions(&self, query: &str) -> Result<Vec<SocialMention>> {
        debug!("Twitter search: {}", query);

        let response = self
            .client
            .get(self.search_url(query))
            .bearer_auth(&self.bearer_token)
            .send()
            .await
            .context("Twitter request failed")?;

        let body: SearchResponse = ensure_success(response, "Twitter")
            .await?
            .json()
            .await
            .context("Failed to parse Twitter response")?;

        Ok(body
            .data
            .into_iter()
            .map(|tweet| SocialMention {
                content: tweet.text,
                timestamp: tweet.created_at,
            })
            .collect())
    }
}
