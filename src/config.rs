//! Crawl configuration.
//!
//! Values come from built-in defaults, optionally overridden by a TOML file
//! (`~/.config/rustdblp/config.toml` or an explicit `--config` path), and
//! finally by command-line flags applied in `main`.

use crate::backoff::BackoffPolicy;
use crate::error::{DblpError, Result};
use crate::results::SortOrder;
use crate::venue::{venue_list, Venue};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// DBLP publication search endpoint
pub const DEFAULT_SEARCH_API: &str = "https://dblp.org/search/publ/api";

/// Base of the venue listing pages (`<base>/conf/osdi/index.html`)
pub const DEFAULT_LISTING_BASE: &str = "https://dblp.org/db";

/// Base of the record pages used for BibTeX links
pub const DEFAULT_RECORD_BASE: &str = "https://dblp.org/rec";

/// Default config file: `<config dir>/rustdblp/config.toml`
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|p| p.join("rustdblp").join("config.toml"))
        .ok_or_else(|| DblpError::Config("Cannot determine config directory".to_string()))
}

/// Endpoints queried during a crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub search_api: String,
    pub listing_base: String,
    pub record_base: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            search_api: DEFAULT_SEARCH_API.to_string(),
            listing_base: DEFAULT_LISTING_BASE.to_string(),
            record_base: DEFAULT_RECORD_BASE.to_string(),
        }
    }
}

impl Endpoints {
    /// Point every endpoint at one local server (used with mock servers).
    pub fn rooted_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            search_api: format!("{}/search/publ/api", base),
            listing_base: format!("{}/db", base),
            record_base: format!("{}/rec", base),
        }
    }
}

/// Backoff timings in milliseconds, as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffSettings {
    pub base_delay_ms: u64,
    pub step_ms: u64,
    pub jitter_ms: u64,
    pub pause_min_ms: u64,
    pub pause_max_ms: u64,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            base_delay_ms: 1000,
            step_ms: 1000,
            jitter_ms: 500,
            pause_min_ms: 500,
            pause_max_ms: 1500,
        }
    }
}

impl BackoffSettings {
    /// All delays zero
    pub fn none() -> Self {
        Self {
            base_delay_ms: 0,
            step_ms: 0,
            jitter_ms: 0,
            pause_min_ms: 0,
            pause_max_ms: 0,
        }
    }
}

/// Everything one crawl needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub conferences: Vec<String>,
    pub journals: Vec<String>,
    pub keywords: Vec<String>,
    /// Hits published before this year are discarded
    pub start_year: i32,
    /// Output base name; `.md`, `.json`, `.xlsx` and `.csv` are appended
    pub output: String,
    pub max_retries: u32,
    /// `h=` parameter of the search API
    pub hits_per_query: u32,
    pub sort_order: SortOrder,
    pub snapshot: bool,
    pub spreadsheet: bool,
    pub csv: bool,
    /// Validate venues even if earlier output exists
    pub force_validation: bool,
    pub timeout_secs: u64,
    pub endpoints: Endpoints,
    pub backoff: BackoffSettings,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            conferences: [
                "ICSE", "FSE", "ASE", "ISSTA", "SOSP", "OSDI", "ATC", "NSDI", "DSN", "ISSRE",
                "ASPLOS",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            journals: ["TSE", "TOSEM", "TDSC", "TPDS", "ESE"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            keywords: Vec::new(),
            start_year: 2021,
            output: "search_result".to_string(),
            max_retries: 10,
            hits_per_query: 1000,
            sort_order: SortOrder::default(),
            snapshot: true,
            spreadsheet: true,
            csv: false,
            force_validation: false,
            timeout_secs: 30,
            endpoints: Endpoints::default(),
            backoff: BackoffSettings::default(),
        }
    }
}

impl CrawlConfig {
    /// Load from an explicit file, or from the default location if it exists,
    /// or fall back to built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = default_config_path()?;
                if default_path.exists() {
                    Self::from_file(&default_path)
                } else {
                    debug!(path = ?default_path, "No config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)
            .map_err(|e| DblpError::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = ?path, "Loaded config");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| DblpError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| DblpError::Config(e.to_string()))
    }

    /// Conferences first, then journals
    pub fn venues(&self) -> Vec<Venue> {
        venue_list(&self.conferences, &self.journals)
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.backoff.base_delay_ms),
            step: Duration::from_millis(self.backoff.step_ms),
            jitter: Duration::from_millis(self.backoff.jitter_ms),
            pause_min: Duration::from_millis(self.backoff.pause_min_ms),
            pause_max: Duration::from_millis(self.backoff.pause_max_ms),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject configurations that cannot produce a meaningful crawl.
    pub fn validate(&self) -> Result<()> {
        if self.keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(DblpError::Validation(
                "at least one keyword is required".to_string(),
            ));
        }
        if self.conferences.is_empty() && self.journals.is_empty() {
            return Err(DblpError::Validation(
                "at least one conference or journal is required".to_string(),
            ));
        }
        if self.output.trim().is_empty() {
            return Err(DblpError::Validation("output name is empty".to_string()));
        }
        if self.hits_per_query == 0 {
            return Err(DblpError::Validation(
                "hits_per_query must be positive".to_string(),
            ));
        }
        if self.backoff.pause_min_ms > self.backoff.pause_max_ms {
            return Err(DblpError::Validation(format!(
                "pause_min_ms ({}) exceeds pause_max_ms ({})",
                self.backoff.pause_min_ms, self.backoff.pause_max_ms
            )));
        }
        for (name, value) in [
            ("search_api", &self.endpoints.search_api),
            ("listing_base", &self.endpoints.listing_base),
            ("record_base", &self.endpoints.record_base),
        ] {
            Url::parse(value)
                .map_err(|e| DblpError::Config(format!("Invalid {} '{}': {}", name, value, e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> CrawlConfig {
        CrawlConfig {
            keywords: vec!["root cause".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = CrawlConfig::default();
        assert_eq!(config.start_year, 2021);
        assert_eq!(config.output, "search_result");
        assert_eq!(config.hits_per_query, 1000);
        assert_eq!(config.conferences.len(), 11);
        assert_eq!(config.journals.len(), 5);
        assert_eq!(config.sort_order, SortOrder::YearThenScore);
        assert!(config.snapshot);
        assert!(!config.csv);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() -> Result<()> {
        let config = CrawlConfig::from_toml(
            r#"
            conferences = ["OSDI"]
            journals = []
            keywords = ["root cause"]
            start_year = 2017
            sort_order = "score-then-year"

            [backoff]
            jitter_ms = 0
            "#,
        )?;
        assert_eq!(config.conferences, vec!["OSDI"]);
        assert!(config.journals.is_empty());
        assert_eq!(config.start_year, 2017);
        assert_eq!(config.sort_order, SortOrder::ScoreThenYear);
        assert_eq!(config.backoff.jitter_ms, 0);
        assert_eq!(config.backoff.base_delay_ms, 1000);
        assert_eq!(config.endpoints.search_api, DEFAULT_SEARCH_API);
        Ok(())
    }

    #[test]
    fn test_toml_roundtrip() -> Result<()> {
        let config = valid();
        let parsed = CrawlConfig::from_toml(&config.to_toml()?)?;
        assert_eq!(parsed, config);
        Ok(())
    }

    #[test]
    fn test_validate() {
        assert!(valid().validate().is_ok());

        let no_keywords = CrawlConfig::default();
        assert!(matches!(
            no_keywords.validate(),
            Err(DblpError::Validation(_))
        ));

        let no_venues = CrawlConfig {
            conferences: vec![],
            journals: vec![],
            ..valid()
        };
        assert!(no_venues.validate().is_err());

        let mut bad_pause = valid();
        bad_pause.backoff.pause_min_ms = 10;
        bad_pause.backoff.pause_max_ms = 5;
        assert!(bad_pause.validate().is_err());

        let mut bad_url = valid();
        bad_url.endpoints.search_api = "not a url".to_string();
        assert!(matches!(bad_url.validate(), Err(DblpError::Config(_))));
    }

    #[test]
    fn test_backoff_policy_from_settings() {
        let mut config = valid();
        config.max_retries = 4;
        config.backoff = BackoffSettings::none();
        let policy = config.backoff_policy();
        assert_eq!(policy, BackoffPolicy::immediate(4));
    }

    #[test]
    fn test_rooted_endpoints() {
        let endpoints = Endpoints::rooted_at("http://127.0.0.1:1234/");
        assert_eq!(endpoints.search_api, "http://127.0.0.1:1234/search/publ/api");
        assert_eq!(endpoints.listing_base, "http://127.0.0.1:1234/db");
    }
}
