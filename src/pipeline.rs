//! One crawl, start to finish: validate venues, search, write reports.

use crate::config::CrawlConfig;
use crate::error::Result;
use crate::http::Fetch;
use crate::report::{write_csv, write_markdown, write_spreadsheet, ReportMeta};
use crate::results::ResultSet;
use crate::search::{SearchEngine, SearchOptions};
use crate::snapshot::{save_snapshot, Snapshot};
use crate::validate::{prior_output_exists, seed_venues, validate_venues, ValidationReport};
use std::path::{Path, PathBuf};
use tracing::info;

/// Artifact paths derived from the output base name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub markdown: PathBuf,
    pub snapshot: PathBuf,
    pub spreadsheet: PathBuf,
    pub csv: PathBuf,
}

impl OutputPaths {
    /// `base` may contain directories; the extensions are appended to it.
    pub fn new(base: impl AsRef<Path>) -> Self {
        let base = base.as_ref();
        let with_ext = |ext: &str| {
            let mut name = base.as_os_str().to_owned();
            name.push(".");
            name.push(ext);
            PathBuf::from(name)
        };
        Self {
            markdown: with_ext("md"),
            snapshot: with_ext("json"),
            spreadsheet: with_ext("xlsx"),
            csv: with_ext("csv"),
        }
    }

    /// Create the directory the artifacts go into.
    pub fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.markdown.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// Which reports to produce
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub spreadsheet: bool,
    pub csv: bool,
}

/// Write markdown plus the optional spreadsheet and CSV; returns written paths.
pub fn write_reports(
    paths: &OutputPaths,
    results: &ResultSet,
    meta: &ReportMeta,
    options: ReportOptions,
) -> Result<Vec<PathBuf>> {
    paths.ensure_parent()?;
    let mut written = Vec::new();

    write_markdown(&paths.markdown, results, meta)?;
    written.push(paths.markdown.clone());

    if options.spreadsheet && write_spreadsheet(&paths.spreadsheet, results)? {
        written.push(paths.spreadsheet.clone());
    }

    if options.csv {
        write_csv(&paths.csv, results)?;
        written.push(paths.csv.clone());
    }

    Ok(written)
}

/// Summary of a finished crawl
#[derive(Debug)]
pub struct CrawlReport {
    pub results: ResultSet,
    pub validation: ValidationReport,
    pub artifacts: Vec<PathBuf>,
}

/// Crawl context: owns the configuration, the fetcher and the results
pub struct Crawl<F: Fetch> {
    config: CrawlConfig,
    fetcher: F,
    results: ResultSet,
}

impl<F: Fetch> Crawl<F> {
    pub fn new(config: CrawlConfig, fetcher: F) -> Self {
        Self {
            config,
            fetcher,
            results: ResultSet::new(),
        }
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    /// Results gathered so far
    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    /// Run validator, search engine and report writer in sequence.
    ///
    /// A fatal error during the search returns before any report is written.
    pub async fn run(mut self) -> Result<CrawlReport> {
        self.config.validate()?;

        let venues = self.config.venues();
        let policy = self.config.backoff_policy();
        let paths = OutputPaths::new(&self.config.output);
        paths.ensure_parent()?;

        // Stage 1: venue validation
        println!("\n--- Stage 1: Venue Validation ---");
        let validation = if !self.config.force_validation
            && prior_output_exists(&[&paths.markdown, &paths.snapshot])
        {
            println!("Result files exist (would overwrite). Skipping abbreviation check.");
            seed_venues(&venues, &mut self.results);
            ValidationReport {
                skipped: true,
                ..Default::default()
            }
        } else {
            let report = validate_venues(
                &self.fetcher,
                &venues,
                &self.config.endpoints.listing_base,
                &policy,
                &mut self.results,
            )
            .await?;
            println!(
                "Checked {} venues: {} not found, {} unverified",
                report.checked,
                report.missing.len(),
                report.unverified.len()
            );
            report
        };

        // Stage 2: search
        println!("\n--- Stage 2: Search ---");
        let options = SearchOptions::from(&self.config);
        println!(
            "Searching {} venues x {} keywords (since {})...",
            venues.len(),
            options.keywords.len(),
            options.start_year
        );
        let engine = SearchEngine::new(&self.fetcher, &self.config.endpoints, &policy, &options);
        engine.run(&venues, &mut self.results).await?;
        println!(
            "Found {} hits across {} venues",
            self.results.total_hits(),
            self.results.venue_count()
        );

        // Stage 3: reports
        println!("\n--- Stage 3: Reports ---");
        let meta = ReportMeta {
            keywords: options.keywords.clone(),
            start_year: options.start_year,
        };
        let mut artifacts = write_reports(
            &paths,
            &self.results,
            &meta,
            ReportOptions {
                spreadsheet: self.config.spreadsheet,
                csv: self.config.csv,
            },
        )?;

        if self.config.snapshot {
            let snapshot = Snapshot::new(
                options.keywords.clone(),
                options.start_year,
                self.results.clone(),
            );
            save_snapshot(&paths.snapshot, &snapshot)?;
            artifacts.push(paths.snapshot.clone());
        }

        for path in &artifacts {
            println!("Saved: {}", path.display());
        }
        info!(
            venues = self.results.venue_count(),
            hits = self.results.total_hits(),
            artifacts = artifacts.len(),
            "Crawl complete"
        );

        Ok(CrawlReport {
            results: self.results,
            validation,
            artifacts,
        })
    }
}
