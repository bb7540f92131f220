//! Shared HTTP client construction

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};

pub const USER_AGENT: &str = concat!("PlaceFinder/", env!("CARGO_PKG_VERSION"));

/// Plain client with a request timeout
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("Failed to create HTTP client")
}

/// Client that retries transient failures with exponential backoff.
///
/// `max_retries` of zero still goes through the middleware but never retries.
pub fn build_retrying_client(timeout: Duration, max_retries: u32) -> Result<ClientWithMiddleware> {
    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);

    Ok(ClientBuilder::new(build_client(timeout)?)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Fail with the status line and body when the response is not a success
pub async fn ensure_success(response: reqwest::Response, service: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    anyhow::bail!("{service} returned HTTP {status}: {}", truncate(&body, 200))
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
