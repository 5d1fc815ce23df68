//! HTTP access behind a small trait so the crawl can run against scripted responses.

use crate::error::{DblpError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// User agent sent with every request
const USER_AGENT: &str = concat!("rustdblp/", env!("CARGO_PKG_VERSION"));

/// Status and body of one GET request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }
}

/// How the crawler reacts to a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ok(String),
    NotFound,
    RateLimited,
    Other(u16),
}

impl From<FetchResponse> for Outcome {
    fn from(response: FetchResponse) -> Self {
        match response.status {
            200..=299 => Outcome::Ok(response.body),
            404 => Outcome::NotFound,
            429 => Outcome::RateLimited,
            status => Outcome::Other(status),
        }
    }
}

/// Issues GET requests
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch `url`. Non-success statuses are returned, not turned into errors.
    async fn get(&self, url: &str) -> Result<FetchResponse>;
}

/// reqwest-backed fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| DblpError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse> {
        debug!(url = url, "GET");
        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(FetchResponse { status, body })
    }
}
