//! Report writers: markdown tables, per-venue spreadsheet sheets and a flat CSV.

use crate::error::{DblpError, Result};
use crate::results::{ResultSet, SearchHit};
use regex::Regex;
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

/// Column headers shared by the markdown table and the spreadsheet sheets
pub const REPORT_COLUMNS: &[&str] = &["year", "title", "score", "article", "bib"];

/// Excel limit on sheet name length
const MAX_SHEET_NAME: usize = 31;

/// Context printed above the tables
#[derive(Debug, Clone, Default)]
pub struct ReportMeta {
    pub keywords: Vec<String>,
    pub start_year: i32,
}

/// Render the whole result set as markdown, one section per venue.
pub fn render_markdown(results: &ResultSet, meta: &ReportMeta) -> String {
    let mut out = String::from("# Results\n\n");

    if !meta.keywords.is_empty() {
        let keywords = meta
            .keywords
            .iter()
            .map(|k| format!("`{}`", k))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(out, "Keywords: {} | since {}\n", keywords, meta.start_year);
    }

    for venue in results.iter() {
        let _ = writeln!(out, "## {}\n", venue.venue);
        out.push_str("| year | title | score | article | bib |\n");
        out.push_str("| ---- | ----- | ----- | ------- | --- |\n");
        for hit in &venue.hits {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                hit.year,
                escape_cell(&hit.title),
                hit.relevance_score,
                link_cell("article", hit.article_link.as_deref()),
                link_cell("bib", hit.bibliography_link.as_deref()),
            );
        }
        out.push_str("\n\n");
    }

    out
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn link_cell(label: &str, url: Option<&str>) -> String {
    match url {
        Some(url) => format!("[{}]({})", label, url),
        None => "-".to_string(),
    }
}

/// Write the markdown report, replacing any existing file.
pub fn write_markdown(path: &Path, results: &ResultSet, meta: &ReportMeta) -> Result<()> {
    std::fs::write(path, render_markdown(results, meta))?;
    info!(path = ?path, venues = results.venue_count(), "Saved markdown report");
    Ok(())
}

/// Make a venue name usable as a sheet name: no `[]:*?/\`, at most 31
/// characters, unique among `taken` (compared case-insensitively).
pub fn sheet_name(venue: &str, taken: &mut HashSet<String>) -> Result<String> {
    let invalid =
        Regex::new(r"[\[\]:*?/\\]").map_err(|e| DblpError::Parse(e.to_string()))?;
    let cleaned = invalid.replace_all(venue, "_");
    let cleaned = cleaned.trim().trim_matches('\'').to_string();
    let base: String = if cleaned.is_empty() {
        "Sheet".to_string()
    } else {
        cleaned.chars().take(MAX_SHEET_NAME).collect()
    };

    let mut name = base.clone();
    let mut n = 2;
    while !taken.insert(name.to_lowercase()) {
        let suffix = format!("_{}", n);
        let keep = MAX_SHEET_NAME.saturating_sub(suffix.chars().count());
        name = format!("{}{}", base.chars().take(keep).collect::<String>(), suffix);
        n += 1;
    }
    Ok(name)
}

/// Write one sheet per venue that has hits. Returns false (and writes nothing)
/// when no venue has hits.
pub fn write_spreadsheet(path: &Path, results: &ResultSet) -> Result<bool> {
    let venues: Vec<_> = results.iter().filter(|v| !v.hits.is_empty()).collect();
    if venues.is_empty() {
        info!(path = ?path, "No hits, spreadsheet not written");
        return Ok(false);
    }

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    let mut taken = HashSet::new();

    for venue in &venues {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name(&venue.venue, &mut taken)?)?;

        for (col, title) in REPORT_COLUMNS.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *title, &header)?;
        }
        worksheet.set_column_width(1, 80)?;
        worksheet.set_column_width(3, 50)?;
        worksheet.set_column_width(4, 50)?;

        for (idx, hit) in venue.hits.iter().enumerate() {
            let row = idx as u32 + 1;
            worksheet.write_number(row, 0, hit.year as f64)?;
            worksheet.write_string(row, 1, &hit.title)?;
            worksheet.write_number(row, 2, hit.relevance_score)?;
            if let Some(link) = &hit.article_link {
                worksheet.write_string(row, 3, link)?;
            }
            if let Some(link) = &hit.bibliography_link {
                worksheet.write_string(row, 4, link)?;
            }
        }
    }

    workbook.save(path)?;
    info!(path = ?path, sheets = venues.len(), "Saved spreadsheet");
    Ok(true)
}

/// One CSV row: a hit plus the venue it was found in
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    venue: &'a str,
    year: i32,
    title: &'a str,
    score: f64,
    article_link: &'a str,
    bib_link: &'a str,
}

impl<'a> CsvRow<'a> {
    fn new(venue: &'a str, hit: &'a SearchHit) -> Self {
        Self {
            venue,
            year: hit.year,
            title: &hit.title,
            score: hit.relevance_score,
            article_link: hit.article_link.as_deref().unwrap_or_default(),
            bib_link: hit.bibliography_link.as_deref().unwrap_or_default(),
        }
    }
}

/// Write every hit of every venue to one CSV file.
pub fn write_csv(path: &Path, results: &ResultSet) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    for venue in results.iter() {
        for hit in &venue.hits {
            wtr.serialize(CsvRow::new(&venue.venue, hit))?;
        }
    }

    wtr.flush()?;
    info!(path = ?path, rows = results.total_hits(), "Saved CSV");
    Ok(())
}
