//! Serialized copy of a crawl's results for later reuse.

use crate::error::Result;
use crate::results::ResultSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Results plus the parameters that produced them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub created_at: DateTime<Utc>,
    pub keywords: Vec<String>,
    pub start_year: i32,
    pub results: ResultSet,
}

impl Snapshot {
    pub fn new(keywords: Vec<String>, start_year: i32, results: ResultSet) -> Self {
        Self {
            created_at: Utc::now(),
            keywords,
            start_year,
            results,
        }
    }
}

/// Write `snapshot` as pretty JSON, replacing any existing file.
pub fn save_snapshot(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let content = serde_json::to_string_pretty(snapshot)?;
    std::fs::write(path, content)?;
    info!(
        path = ?path,
        venues = snapshot.results.venue_count(),
        hits = snapshot.results.total_hits(),
        "Saved snapshot"
    );
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot> {
    let content = std::fs::read_to_string(path)?;
    let snapshot: Snapshot = serde_json::from_str(&content)?;
    info!(
        path = ?path,
        venues = snapshot.results.venue_count(),
        "Loaded snapshot"
    );
    Ok(snapshot)
}
