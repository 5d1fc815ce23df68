//! # rustdblp
//!
//! DBLP venue × keyword literature crawler.
//!
//! ## Modules
//!
//! - [`venue`] - Venue abbreviations and the DBLP URLs derived from them
//! - [`dblp`] - Search URL building and XML response parsing
//! - [`search`] - Sequential search engine with rate-limit backoff
//! - [`validate`] - Venue listing checks
//! - [`report`] - Markdown, spreadsheet and CSV writers
//! - [`snapshot`] - JSON snapshot of a crawl's results
//! - [`pipeline`] - The crawl orchestrator
//! - [`config`] - TOML configuration and endpoints
//! - [`http`] - The fetch seam and the reqwest-backed fetcher
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rustdblp::{config::CrawlConfig, http::HttpFetcher, pipeline::Crawl};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = CrawlConfig {
//!         conferences: vec!["OSDI".to_string()],
//!         journals: vec![],
//!         keywords: vec!["root cause".to_string()],
//!         ..Default::default()
//!     };
//!     let fetcher = HttpFetcher::new(config.timeout())?;
//!     let report = Crawl::new(config, fetcher).run().await?;
//!     println!("Found {} hits", report.results.total_hits());
//!     Ok(())
//! }
//! ```

pub mod backoff;
pub mod config;
pub mod dblp;
pub mod error;
pub mod http;
pub mod mock;
pub mod pipeline;
pub mod report;
pub mod results;
pub mod search;
pub mod snapshot;
pub mod validate;
pub mod venue;

pub use error::{DblpError, Result};
