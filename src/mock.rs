//! Scripted fetcher for tests.
//!
//! Routes match on a URL substring. Each route replays its responses in order
//! and keeps returning the last one once the script runs out, so
//! `on("api", 429).on("api", 200)` means "rate limited once, then fine".

use crate::error::Result;
use crate::http::{Fetch, FetchResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Search response with no hits
pub const EMPTY_HITS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<result>
<hits total="0" computed="0" sent="0" first="0"></hits>
</result>"#;

#[derive(Debug)]
struct Route {
    pattern: String,
    responses: VecDeque<FetchResponse>,
}

/// Fetcher returning predefined responses and recording requested URLs.
#[derive(Debug)]
pub struct MockFetcher {
    routes: Mutex<Vec<Route>>,
    fallback: FetchResponse,
    calls: Mutex<Vec<String>>,
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    /// Unmatched URLs get a 200 with an empty hit list.
    pub fn new() -> Self {
        Self::with_fallback(FetchResponse::ok(EMPTY_HITS_XML))
    }

    pub fn with_fallback(fallback: FetchResponse) -> Self {
        Self {
            routes: Mutex::new(Vec::new()),
            fallback,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue `response` for URLs containing `pattern`.
    pub fn on(self, pattern: &str, response: FetchResponse) -> Self {
        if let Ok(mut routes) = self.routes.lock() {
            match routes.iter_mut().find(|r| r.pattern == pattern) {
                Some(route) => route.responses.push_back(response),
                None => routes.push(Route {
                    pattern: pattern.to_string(),
                    responses: VecDeque::from([response]),
                }),
            }
        }
        self
    }

    /// URLs requested so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of requested URLs containing `pattern`
    pub fn count(&self, pattern: &str) -> usize {
        self.calls().iter().filter(|u| u.contains(pattern)).count()
    }

    fn respond(&self, url: &str) -> FetchResponse {
        let Ok(mut routes) = self.routes.lock() else {
            return self.fallback.clone();
        };
        match routes.iter_mut().find(|r| url.contains(&r.pattern)) {
            Some(route) if route.responses.len() > 1 => route
                .responses
                .pop_front()
                .unwrap_or_else(|| self.fallback.clone()),
            Some(route) => route
                .responses
                .front()
                .cloned()
                .unwrap_or_else(|| self.fallback.clone()),
            None => self.fallback.clone(),
        }
    }
}

#[async_trait]
impl Fetch for MockFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(url.to_string());
        }
        Ok(self.respond(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_then_sticky_last() -> Result<()> {
        let fetcher = MockFetcher::new()
            .on("api", FetchResponse::new(429, ""))
            .on("api", FetchResponse::ok("done"));

        assert_eq!(fetcher.get("http://x/api?q=1").await?.status, 429);
        assert_eq!(fetcher.get("http://x/api?q=1").await?.body, "done");
        assert_eq!(fetcher.get("http://x/api?q=1").await?.body, "done");
        assert_eq!(fetcher.get("http://x/other").await?.body, EMPTY_HITS_XML);
        assert_eq!(fetcher.count("api"), 3);
        assert_eq!(fetcher.calls().len(), 4);
        Ok(())
    }
}
