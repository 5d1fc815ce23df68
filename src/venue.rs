//! Venue identifiers and the DBLP URLs derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a venue is a conference or a journal.
///
/// DBLP files the two under different stream prefixes (`conf/` and `journals/`),
/// which changes both the listing page and the query clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueKind {
    Conference,
    Journal,
}

impl VenueKind {
    fn stream_prefix(self) -> &'static str {
        match self {
            VenueKind::Conference => "conf",
            VenueKind::Journal => "journals",
        }
    }
}

impl fmt::Display for VenueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VenueKind::Conference => write!(f, "conference"),
            VenueKind::Journal => write!(f, "journal"),
        }
    }
}

/// A conference or journal identified by its abbreviation (e.g. "OSDI", "TSE").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Venue {
    pub name: String,
    pub kind: VenueKind,
}

impl Venue {
    pub fn conference(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VenueKind::Conference,
        }
    }

    pub fn journal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VenueKind::Journal,
        }
    }

    /// DBLP stream id, e.g. `conf/osdi` or `journals/tse`
    pub fn stream_id(&self) -> String {
        format!(
            "{}/{}",
            self.kind.stream_prefix(),
            self.name.trim().to_lowercase()
        )
    }

    /// Listing page used to check that the abbreviation exists
    pub fn listing_url(&self, listing_base: &str) -> String {
        format!(
            "{}/{}/index.html",
            listing_base.trim_end_matches('/'),
            self.stream_id()
        )
    }

    /// Search clause restricting a query to this venue's stream
    pub fn query_clause(&self) -> String {
        format!("stream:streams/{}:", self.stream_id())
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Build the ordered venue list: conferences first, then journals.
pub fn venue_list(conferences: &[String], journals: &[String]) -> Vec<Venue> {
    conferences
        .iter()
        .map(Venue::conference)
        .chain(journals.iter().map(Venue::journal))
        .collect()
}
