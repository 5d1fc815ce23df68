//! Venue × keyword search with rate-limit backoff.
//!
//! Requests are strictly sequential. A 404 skips the keyword, a 429 is retried
//! after [`BackoffPolicy::retry_delay`] until the retry budget runs out, and any
//! other status aborts the crawl.

use crate::backoff::BackoffPolicy;
use crate::config::{CrawlConfig, Endpoints};
use crate::dblp::{build_search_url, parse_hits};
use crate::error::{DblpError, Result};
use crate::http::{Fetch, Outcome};
use crate::results::{ResultSet, SearchHit, SortOrder, VenueAccumulator};
use crate::venue::Venue;
use tracing::{debug, info, warn};

/// Search parameters shared by every query of a crawl
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub keywords: Vec<String>,
    pub start_year: i32,
    pub hits_per_query: u32,
    pub sort_order: SortOrder,
}

impl From<&CrawlConfig> for SearchOptions {
    fn from(config: &CrawlConfig) -> Self {
        Self {
            keywords: config
                .keywords
                .iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
            start_year: config.start_year,
            hits_per_query: config.hits_per_query,
            sort_order: config.sort_order,
        }
    }
}

/// Runs the per-venue searches
pub struct SearchEngine<'a, F: Fetch + ?Sized> {
    fetcher: &'a F,
    endpoints: &'a Endpoints,
    policy: &'a BackoffPolicy,
    options: &'a SearchOptions,
}

impl<'a, F: Fetch + ?Sized> SearchEngine<'a, F> {
    pub fn new(
        fetcher: &'a F,
        endpoints: &'a Endpoints,
        policy: &'a BackoffPolicy,
        options: &'a SearchOptions,
    ) -> Self {
        Self {
            fetcher,
            endpoints,
            policy,
            options,
        }
    }

    /// Search every venue in order, storing each venue's sorted hits in `results`.
    ///
    /// On error the venues finished so far stay in `results`.
    pub async fn run(&self, venues: &[Venue], results: &mut ResultSet) -> Result<()> {
        let total = venues.len();
        for (idx, venue) in venues.iter().enumerate() {
            info!(
                venue = %venue,
                kind = %venue.kind,
                progress = %format!("{}/{}", idx + 1, total),
                "Searching venue"
            );

            let existing = results.hits(&venue.name).unwrap_or_default();
            let hits = self.search_venue(venue, existing).await?;
            info!(venue = %venue, hits = hits.len(), "Venue complete");
            results.set_hits(&venue.name, hits);

            self.pause().await;
        }
        Ok(())
    }

    /// Run every keyword against one venue and return the sorted, deduplicated hits.
    pub async fn search_venue(&self, venue: &Venue, existing: &[SearchHit]) -> Result<Vec<SearchHit>> {
        let mut acc = VenueAccumulator::from_existing(existing);

        for keyword in &self.options.keywords {
            match self.query(venue, keyword).await? {
                Some(hits) => {
                    let found = hits.len();
                    let mut kept = 0;
                    for hit in hits {
                        if hit.year < self.options.start_year {
                            continue;
                        }
                        if acc.push(hit) {
                            kept += 1;
                        }
                    }
                    debug!(
                        venue = %venue,
                        keyword = %keyword,
                        found = found,
                        kept = kept,
                        "Keyword searched"
                    );
                }
                None => {
                    warn!(venue = %venue, keyword = %keyword, "404 when searching, skipping");
                }
            }

            self.pause().await;
        }

        Ok(acc.into_sorted(self.options.sort_order))
    }

    /// One keyword/venue query. `None` means the API answered 404.
    async fn query(&self, venue: &Venue, keyword: &str) -> Result<Option<Vec<SearchHit>>> {
        let url = build_search_url(
            &self.endpoints.search_api,
            keyword,
            venue,
            self.options.hits_per_query,
        );

        match self.fetch_with_backoff(&url).await? {
            Some(body) => parse_hits(&body, &self.endpoints.record_base).map(Some),
            None => Ok(None),
        }
    }

    /// GET `url`, sleeping and retrying while the API answers 429.
    async fn fetch_with_backoff(&self, url: &str) -> Result<Option<String>> {
        let mut retries = 0;

        loop {
            let response = self.fetcher.get(url).await?;

            match Outcome::from(response) {
                Outcome::Ok(body) => return Ok(Some(body)),
                Outcome::NotFound => return Ok(None),
                Outcome::RateLimited => {
                    if self.policy.exhausted(retries) {
                        return Err(DblpError::RateLimited {
                            url: url.to_string(),
                            attempts: retries + 1,
                        });
                    }
                    retries += 1;
                    let wait = self.policy.retry_delay(retries);
                    warn!(
                        retry = retries,
                        max_retries = self.policy.max_retries,
                        wait_ms = wait.as_millis() as u64,
                        "Rate limited, backing off"
                    );
                    tokio::time::sleep(wait).await;
                }
                Outcome::Other(code) => {
                    return Err(DblpError::Api {
                        code,
                        message: format!("DBLP search failed for {}", url),
                    });
                }
            }
        }
    }

    async fn pause(&self) {
        let pause = self.policy.pause();
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::FetchResponse;
    use crate::mock::{MockFetcher, EMPTY_HITS_XML};
    use std::time::Duration;
    use tokio::time::Instant;

    fn hit_xml(title: &str, year: i32, score: u32) -> String {
        format!(
            r#"<hit score="{score}"><info><title>{title}</title><year>{year}</year><key>conf/x/{score}</key><ee>https://example.org/{score}</ee></info></hit>"#
        )
    }

    fn result_xml(hits: &[String]) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><result><hits total="{n}" computed="{n}" sent="{n}" first="0">{body}</hits></result>"#,
            n = hits.len(),
            body = hits.concat()
        )
    }

    fn options(keywords: &[&str], start_year: i32) -> SearchOptions {
        SearchOptions {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            start_year,
            hits_per_query: 1000,
            sort_order: SortOrder::YearThenScore,
        }
    }

    async fn run(
        fetcher: &MockFetcher,
        venues: &[Venue],
        options: &SearchOptions,
        max_retries: u32,
    ) -> (Result<()>, ResultSet) {
        let endpoints = Endpoints::rooted_at("http://dblp.test");
        let policy = BackoffPolicy::immediate(max_retries);
        let engine = SearchEngine::new(fetcher, &endpoints, &policy, options);
        let mut results = ResultSet::new();
        let outcome = engine.run(venues, &mut results).await;
        (outcome, results)
    }

    #[tokio::test]
    async fn test_year_cutoff_keeps_recent_hit() {
        let body = result_xml(&[
            hit_xml("Recent Root Cause", 2020, 5),
            hit_xml("Old Root Cause", 2015, 9),
        ]);
        let fetcher = MockFetcher::new().on("search/publ/api", FetchResponse::ok(body));
        let (outcome, results) = run(
            &fetcher,
            &[Venue::conference("OSDI")],
            &options(&["root cause"], 2017),
            3,
        )
        .await;

        assert!(outcome.is_ok());
        let hits = results.hits("OSDI").expect("OSDI present");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].year, 2020);
        assert_eq!(hits[0].title, "Recent Root Cause");
        assert_eq!(
            fetcher.calls(),
            vec!["http://dblp.test/search/publ/api?q=root%20cause%20stream%3Astreams%2Fconf%2Fosdi%3A&h=1000&format=xml"]
        );
    }

    #[tokio::test]
    async fn test_rate_limited_once_then_success() {
        let body = result_xml(&[hit_xml("Backoff Works", 2022, 4)]);
        let fetcher = MockFetcher::new()
            .on("search/publ/api", FetchResponse::new(429, ""))
            .on("search/publ/api", FetchResponse::ok(body));
        let (outcome, results) = run(
            &fetcher,
            &[Venue::conference("NSDI")],
            &options(&["backoff"], 2020),
            3,
        )
        .await;

        assert!(outcome.is_ok());
        assert_eq!(fetcher.count("search/publ/api"), 2);
        assert_eq!(results.hits("NSDI").map(|h| h.len()), Some(1));
    }

    #[tokio::test]
    async fn test_rate_limited_forever_is_fatal_after_cap() {
        let fetcher = MockFetcher::new().on("search/publ/api", FetchResponse::new(429, ""));
        let (outcome, results) = run(
            &fetcher,
            &[Venue::conference("OSDI"), Venue::conference("SOSP")],
            &options(&["root cause"], 2017),
            3,
        )
        .await;

        match outcome {
            Err(DblpError::RateLimited { attempts, .. }) => assert_eq!(attempts, 4),
            other => panic!("expected rate limit error, got {:?}", other),
        }
        // first request plus three retries, second venue never reached
        assert_eq!(fetcher.count("search/publ/api"), 4);
        assert_eq!(fetcher.count("sosp"), 0);
        assert!(!results.contains("OSDI"));
    }

    #[tokio::test]
    async fn test_not_found_skips_keyword() {
        let body = result_xml(&[hit_xml("Second Keyword Hit", 2023, 2)]);
        let fetcher = MockFetcher::new()
            .on("missing", FetchResponse::new(404, ""))
            .on("present", FetchResponse::ok(body));
        let (outcome, results) = run(
            &fetcher,
            &[Venue::journal("TSE")],
            &options(&["missing", "present"], 2020),
            3,
        )
        .await;

        assert!(outcome.is_ok());
        assert_eq!(fetcher.calls().len(), 2);
        assert_eq!(results.hits("TSE").map(|h| h.len()), Some(1));
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let fetcher = MockFetcher::new().on("search/publ/api", FetchResponse::new(500, ""));
        let (outcome, _) = run(
            &fetcher,
            &[Venue::conference("OSDI")],
            &options(&["root cause"], 2017),
            5,
        )
        .await;

        assert!(matches!(outcome, Err(DblpError::Api { code: 500, .. })));
        assert_eq!(fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_titles_deduplicated_across_keywords() {
        let first = result_xml(&[hit_xml("Shared Title", 2021, 3), hit_xml("Only A", 2021, 2)]);
        let second = result_xml(&[hit_xml("Shared Title", 2024, 9), hit_xml("Only B", 2022, 1)]);
        let fetcher = MockFetcher::new()
            .on("alpha", FetchResponse::ok(first))
            .on("beta", FetchResponse::ok(second));
        let (outcome, results) = run(
            &fetcher,
            &[Venue::conference("ICSE")],
            &options(&["alpha", "beta"], 2020),
            3,
        )
        .await;

        assert!(outcome.is_ok());
        let hits = results.hits("ICSE").expect("ICSE present");
        let titles: Vec<_> = hits.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["Only B", "Shared Title", "Only A"]);
        let shared = hits.iter().find(|h| h.title == "Shared Title").expect("kept");
        assert_eq!(shared.year, 2021);
    }

    #[tokio::test]
    async fn test_every_venue_keyword_pair_is_queried_in_order() {
        let fetcher = MockFetcher::new();
        let (outcome, results) = run(
            &fetcher,
            &[Venue::conference("OSDI"), Venue::journal("TSE")],
            &options(&["alpha", "beta"], 2020),
            3,
        )
        .await;

        assert!(outcome.is_ok());
        let calls = fetcher.calls();
        assert_eq!(calls.len(), 4);
        assert!(calls[0].contains("alpha") && calls[0].contains("conf%2Fosdi"));
        assert!(calls[1].contains("beta") && calls[1].contains("conf%2Fosdi"));
        assert!(calls[2].contains("alpha") && calls[2].contains("journals%2Ftse"));
        assert!(calls[3].contains("beta") && calls[3].contains("journals%2Ftse"));
        assert_eq!(results.venue_names(), vec!["OSDI", "TSE"]);
        assert_eq!(results.total_hits(), 0);
    }

    fn timed_policy(base_ms: u64, step_ms: u64, pause_ms: u64) -> BackoffPolicy {
        BackoffPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(base_ms),
            step: Duration::from_millis(step_ms),
            jitter: Duration::ZERO,
            pause_min: Duration::from_millis(pause_ms),
            pause_max: Duration::from_millis(pause_ms),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_waits_and_pauses_between_requests() {
        let body = result_xml(&[hit_xml("Slow And Steady", 2022, 4)]);
        let fetcher = MockFetcher::new()
            .on("search/publ/api", FetchResponse::new(429, ""))
            .on("search/publ/api", FetchResponse::ok(body));
        let endpoints = Endpoints::rooted_at("http://dblp.test");
        let policy = timed_policy(2000, 0, 500);
        let options = options(&["alpha", "beta"], 2020);
        let engine = SearchEngine::new(&fetcher, &endpoints, &policy, &options);
        let mut results = ResultSet::new();

        let started = Instant::now();
        engine
            .run(&[Venue::conference("OSDI")], &mut results)
            .await
            .expect("search succeeds");

        // one retry delay, a pause after each of two keywords, one after the venue
        assert!(started.elapsed() >= Duration::from_millis(2000 + 3 * 500));
        assert_eq!(fetcher.count("search/publ/api"), 3);
        assert_eq!(results.total_hits(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_delay_grows_per_retry() {
        let fetcher = MockFetcher::new()
            .on("search/publ/api", FetchResponse::new(429, ""))
            .on("search/publ/api", FetchResponse::new(429, ""))
            .on("search/publ/api", FetchResponse::ok(EMPTY_HITS_XML));
        let endpoints = Endpoints::rooted_at("http://dblp.test");
        let policy = timed_policy(1000, 2000, 0);
        let options = options(&["alpha"], 2020);
        let engine = SearchEngine::new(&fetcher, &endpoints, &policy, &options);
        let mut results = ResultSet::new();

        let started = Instant::now();
        engine
            .run(&[Venue::journal("TSE")], &mut results)
            .await
            .expect("search succeeds");

        // 1s before the first retry, 1s + 2s before the second
        assert!(started.elapsed() >= Duration::from_millis(4000));
        assert_eq!(fetcher.count("search/publ/api"), 3);
    }
}
