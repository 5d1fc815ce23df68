//! Search hits, the per-run result set and per-venue accumulation.
//!
//! A [`ResultSet`] keeps venues in first-insertion order. While one venue is
//! being searched its hits live in a [`VenueAccumulator`], which enforces title
//! uniqueness; the accumulator is sorted and folded back into the result set
//! once the venue is done.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// One search result record returned by DBLP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub relevance_score: f64,
    pub year: i32,
    pub article_link: Option<String>,
    pub bibliography_link: Option<String>,
}

/// Descending sort order applied to each venue's hits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    /// Newest first, higher score first within a year
    #[default]
    YearThenScore,
    /// Highest score first, newer first within a score
    ScoreThenYear,
}

impl SortOrder {
    /// Compare two hits so that `sort_by` puts the preferred hit first.
    pub fn compare(self, a: &SearchHit, b: &SearchHit) -> Ordering {
        let by_year = b.year.cmp(&a.year);
        let by_score = b.relevance_score.total_cmp(&a.relevance_score);
        match self {
            SortOrder::YearThenScore => by_year.then(by_score),
            SortOrder::ScoreThenYear => by_score.then(by_year),
        }
    }

    /// Stable in-place sort
    pub fn sort(self, hits: &mut [SearchHit]) {
        hits.sort_by(|a, b| self.compare(a, b));
    }
}

/// Hits found for one venue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueResults {
    pub venue: String,
    pub hits: Vec<SearchHit>,
}

/// Mapping from venue name to its ordered hits
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    venues: Vec<VenueResults>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty entry for `venue` unless one exists.
    pub fn ensure_venue(&mut self, venue: &str) {
        if !self.contains(venue) {
            self.venues.push(VenueResults {
                venue: venue.to_string(),
                hits: Vec::new(),
            });
        }
    }

    pub fn contains(&self, venue: &str) -> bool {
        self.venues.iter().any(|v| v.venue == venue)
    }

    pub fn hits(&self, venue: &str) -> Option<&[SearchHit]> {
        self.venues
            .iter()
            .find(|v| v.venue == venue)
            .map(|v| v.hits.as_slice())
    }

    /// Replace the hits stored for `venue`, adding the venue if needed.
    pub fn set_hits(&mut self, venue: &str, hits: Vec<SearchHit>) {
        match self.venues.iter_mut().find(|v| v.venue == venue) {
            Some(entry) => entry.hits = hits,
            None => self.venues.push(VenueResults {
                venue: venue.to_string(),
                hits,
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &VenueResults> {
        self.venues.iter()
    }

    pub fn venue_names(&self) -> Vec<&str> {
        self.venues.iter().map(|v| v.venue.as_str()).collect()
    }

    pub fn venue_count(&self) -> usize {
        self.venues.len()
    }

    pub fn total_hits(&self) -> usize {
        self.venues.iter().map(|v| v.hits.len()).sum()
    }

    /// Re-sort every venue, e.g. after loading a snapshot.
    pub fn sort_all(&mut self, order: SortOrder) {
        for entry in &mut self.venues {
            order.sort(&mut entry.hits);
        }
    }
}

/// Append-only hit list for the venue currently being searched.
#[derive(Debug, Default)]
pub struct VenueAccumulator {
    hits: Vec<SearchHit>,
    seen_titles: HashSet<String>,
}

impl VenueAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from hits already recorded for the venue in this run.
    pub fn from_existing(hits: &[SearchHit]) -> Self {
        let mut acc = Self::new();
        for hit in hits {
            acc.push(hit.clone());
        }
        acc
    }

    /// Append `hit` unless its title was already seen. Returns whether it was kept.
    pub fn push(&mut self, hit: SearchHit) -> bool {
        if !self.seen_titles.insert(hit.title.clone()) {
            return false;
        }
        self.hits.push(hit);
        true
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Sort and hand over the hits; the seen-title set is dropped.
    pub fn into_sorted(self, order: SortOrder) -> Vec<SearchHit> {
        let mut hits = self.hits;
        order.sort(&mut hits);
        hits
    }
}
