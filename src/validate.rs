//! Venue abbreviation checks against the DBLP listing pages.

use crate::backoff::BackoffPolicy;
use crate::error::Result;
use crate::http::{Fetch, Outcome};
use crate::results::ResultSet;
use crate::venue::Venue;
use std::path::Path;
use tracing::{info, warn};

/// What the validator did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Venues looked up
    pub checked: usize,
    /// Venues whose listing page returned 404
    pub missing: Vec<String>,
    /// Venues that could not be verified (rate limited or other status)
    pub unverified: Vec<String>,
    /// True when the lookups were skipped because earlier output exists
    pub skipped: bool,
}

/// Seed `results` with every venue without issuing requests.
pub fn seed_venues(venues: &[Venue], results: &mut ResultSet) {
    for venue in venues {
        results.ensure_venue(&venue.name);
    }
}

/// Whether any of `artifacts` exists on disk
pub fn prior_output_exists<P: AsRef<Path>>(artifacts: &[P]) -> bool {
    artifacts.iter().any(|p| p.as_ref().exists())
}

/// Check each venue's listing page and make sure it has a key in `results`.
///
/// A 404 only produces a warning; the venue is still searched.
pub async fn validate_venues<F: Fetch + ?Sized>(
    fetcher: &F,
    venues: &[Venue],
    listing_base: &str,
    policy: &BackoffPolicy,
    results: &mut ResultSet,
) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();

    for (idx, venue) in venues.iter().enumerate() {
        if idx > 0 {
            let pause = policy.pause();
            if !pause.is_zero() {
                tokio::time::sleep(pause).await;
            }
        }

        let url = venue.listing_url(listing_base);
        let response = fetcher.get(&url).await?;
        report.checked += 1;

        match Outcome::from(response) {
            Outcome::Ok(_) => {
                info!(venue = %venue, kind = %venue.kind, "Venue listing found");
            }
            Outcome::NotFound => {
                warn!(
                    venue = %venue,
                    url = %url,
                    "Check the abbreviation \"{}\": no {} listing found",
                    venue.name,
                    venue.kind
                );
                report.missing.push(venue.name.clone());
            }
            Outcome::RateLimited => {
                warn!(venue = %venue, "Rate limited while checking venue, not verified");
                report.unverified.push(venue.name.clone());
            }
            Outcome::Other(status) => {
                warn!(venue = %venue, status = status, "Unexpected status while checking venue");
                report.unverified.push(venue.name.clone());
            }
        }

        results.ensure_venue(&venue.name);
    }

    Ok(report)
}
