//! rustdblp - DBLP venue × keyword literature crawler
//!
//! Searches DBLP for every combination of configured venues and keywords,
//! keeps recent papers, and writes a markdown report plus an optional
//! spreadsheet, CSV export and JSON snapshot.
//!
//! ## Usage
//!
//! ```bash
//! rustdblp search -c OSDI -c SOSP -j TSE -k "root cause" --start-year 2020
//! rustdblp render search_result.json --csv
//! rustdblp config init
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rustdblp::config::{default_config_path, CrawlConfig};
use rustdblp::http::HttpFetcher;
use rustdblp::pipeline::{write_reports, Crawl, OutputPaths, ReportOptions};
use rustdblp::report::ReportMeta;
use rustdblp::results::SortOrder;
use rustdblp::snapshot::load_snapshot;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// DBLP venue × keyword literature crawler
#[derive(Parser)]
#[command(name = "rustdblp")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search DBLP for every venue/keyword combination and write reports
    Search {
        /// Config file (defaults to the user config file if present)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Conference abbreviation (repeatable, replaces the configured list)
        #[arg(short = 'c', long = "conference")]
        conferences: Vec<String>,

        /// Journal abbreviation (repeatable, replaces the configured list)
        #[arg(short = 'j', long = "journal")]
        journals: Vec<String>,

        /// Keyword phrase (repeatable, replaces the configured list)
        #[arg(short = 'k', long = "keyword")]
        keywords: Vec<String>,

        /// Discard papers published before this year
        #[arg(long)]
        start_year: Option<i32>,

        /// Output base name (extensions are appended)
        #[arg(short, long)]
        output: Option<String>,

        /// Retries allowed for a rate-limited request
        #[arg(long)]
        max_retries: Option<u32>,

        /// Maximum hits requested per query
        #[arg(long)]
        hits: Option<u32>,

        /// Sort order within each venue
        #[arg(long, value_enum)]
        sort: Option<SortOrder>,

        /// Do not write the JSON snapshot
        #[arg(long)]
        no_snapshot: bool,

        /// Do not write the spreadsheet
        #[arg(long)]
        no_spreadsheet: bool,

        /// Also write a flat CSV of all hits
        #[arg(long)]
        csv: bool,

        /// Check venue abbreviations even if earlier output exists
        #[arg(long)]
        force_validation: bool,
    },

    /// Rewrite reports from a saved snapshot without querying DBLP
    Render {
        /// Snapshot file written by a previous search
        snapshot: PathBuf,

        /// Output base name (defaults to the snapshot path without extension)
        #[arg(short, long)]
        output: Option<String>,

        /// Re-sort every venue before writing
        #[arg(long, value_enum)]
        sort: Option<SortOrder>,

        /// Do not write the spreadsheet
        #[arg(long)]
        no_spreadsheet: bool,

        /// Also write a flat CSV of all hits
        #[arg(long)]
        csv: bool,
    },

    /// Manage the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a config file with the default settings
    Init {
        /// Target path (defaults to the user config file)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Show the default config file path
    Path,
    /// Print the effective configuration
    Show {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if cli.json_logs {
        fmt().json().with_env_filter(filter).with_target(true).init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .init();
    }

    match cli.command {
        Commands::Search {
            config,
            conferences,
            journals,
            keywords,
            start_year,
            output,
            max_retries,
            hits,
            sort,
            no_snapshot,
            no_spreadsheet,
            csv,
            force_validation,
        } => {
            let mut crawl_config =
                CrawlConfig::load(config.as_deref()).context("Failed to load config")?;

            if !conferences.is_empty() || !journals.is_empty() {
                crawl_config.conferences = conferences;
                crawl_config.journals = journals;
            }
            if !keywords.is_empty() {
                crawl_config.keywords = keywords;
            }
            if let Some(year) = start_year {
                crawl_config.start_year = year;
            }
            if let Some(output) = output {
                crawl_config.output = output;
            }
            if let Some(retries) = max_retries {
                crawl_config.max_retries = retries;
            }
            if let Some(hits) = hits {
                crawl_config.hits_per_query = hits;
            }
            if let Some(sort) = sort {
                crawl_config.sort_order = sort;
            }
            crawl_config.snapshot &= !no_snapshot;
            crawl_config.spreadsheet &= !no_spreadsheet;
            crawl_config.csv |= csv;
            crawl_config.force_validation |= force_validation;

            run_search(crawl_config).await
        }
        Commands::Render {
            snapshot,
            output,
            sort,
            no_spreadsheet,
            csv,
        } => run_render(snapshot, output, sort, !no_spreadsheet, csv),
        Commands::Config { action } => handle_config(action),
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn run_search(config: CrawlConfig) -> Result<()> {
    config.validate().context("Invalid configuration")?;

    let fetcher = HttpFetcher::new(config.timeout())?;
    let report = Crawl::new(config, fetcher)
        .run()
        .await
        .context("Crawl aborted")?;

    if !report.validation.missing.is_empty() {
        println!(
            "\nWarning: no DBLP listing for {}; check the abbreviations.",
            report.validation.missing.join(", ")
        );
    }

    println!(
        "\n✓ Crawl complete. {} hits across {} venues.",
        report.results.total_hits(),
        report.results.venue_count()
    );
    Ok(())
}

fn run_render(
    snapshot_path: PathBuf,
    output: Option<String>,
    sort: Option<SortOrder>,
    spreadsheet: bool,
    csv: bool,
) -> Result<()> {
    let mut snapshot = load_snapshot(&snapshot_path)
        .with_context(|| format!("Failed to load snapshot {}", snapshot_path.display()))?;

    if let Some(order) = sort {
        snapshot.results.sort_all(order);
    }

    let base = output
        .map(PathBuf::from)
        .unwrap_or_else(|| snapshot_path.with_extension(""));
    let paths = OutputPaths::new(base);
    let meta = ReportMeta {
        keywords: snapshot.keywords.clone(),
        start_year: snapshot.start_year,
    };

    let written = write_reports(
        &paths,
        &snapshot.results,
        &meta,
        ReportOptions { spreadsheet, csv },
    )?;
    for path in &written {
        println!("Saved: {}", path.display());
    }
    Ok(())
}

fn handle_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init { path, force } => {
            let path = match path {
                Some(p) => p,
                None => default_config_path()?,
            };
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
            std::fs::write(&path, CrawlConfig::default().to_toml()?)
                .context("Failed to write config file")?;
            println!("Wrote default config to {}", path.display());
        }
        ConfigAction::Path => {
            println!("Config file: {}", default_config_path()?.display());
        }
        ConfigAction::Show { config } => {
            let config = CrawlConfig::load(config.as_deref())?;
            print!("{}", config.to_toml()?);
        }
    }
    Ok(())
}
