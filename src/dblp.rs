//! DBLP search API request building and XML response parsing.
//!
//! Example request:
//! `https://dblp.org/search/publ/api?q=root%20cause%20stream%3Astreams%2Fconf%2Fosdi%3A&h=1000&format=xml`

use crate::error::{DblpError, Result};
use crate::results::SearchHit;
use crate::venue::Venue;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::debug;

/// Build the search URL for one keyword restricted to one venue.
pub fn build_search_url(search_api: &str, keyword: &str, venue: &Venue, hits: u32) -> String {
    let query = format!("{} {}", keyword.trim(), venue.query_clause());
    format!(
        "{}?q={}&h={}&format=xml",
        search_api,
        urlencoding::encode(&query),
        hits
    )
}

/// BibTeX view of a DBLP record key
pub fn bibliography_url(record_base: &str, key: &str) -> String {
    format!(
        "{}/{}.html?view=bibtex&param=0",
        record_base.trim_end_matches('/'),
        key
    )
}

// === Hit extraction ===

/// `<info>` children whose text is collected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Year,
    Key,
    Ee,
}

impl Field {
    fn from_tag(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Self::Title),
            b"year" => Some(Self::Year),
            b"key" => Some(Self::Key),
            b"ee" => Some(Self::Ee),
            _ => None,
        }
    }
}

/// Raw text of one `<hit>` as it is read
#[derive(Debug, Default)]
struct RawHit {
    score: Option<String>,
    has_info: bool,
    title: String,
    year: String,
    key: String,
    ee: Vec<String>,
}

impl RawHit {
    fn start_field(&mut self, field: Field) {
        if field == Field::Ee {
            self.ee.push(String::new());
        }
    }

    fn push_text(&mut self, field: Field, text: &str) {
        let target = match field {
            Field::Title => &mut self.title,
            Field::Year => &mut self.year,
            Field::Key => &mut self.key,
            Field::Ee => match self.ee.last_mut() {
                Some(ee) => ee,
                None => return,
            },
        };
        target.push_str(text);
    }

    fn finish(self, record_base: &str) -> Option<SearchHit> {
        if !self.has_info {
            debug!("Hit without info element, skipping");
            return None;
        }

        // Inline markup such as <i> or <sub> leaves line breaks and runs of spaces.
        let title = self.title.split_whitespace().collect::<Vec<_>>().join(" ");
        if title.is_empty() {
            debug!("Hit without title, skipping");
            return None;
        }

        let Ok(year) = self.year.trim().parse::<i32>() else {
            debug!(title = %title, "Hit without numeric year, skipping");
            return None;
        };

        let relevance_score = self
            .score
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|s| s.is_finite())
            .unwrap_or(0.0);

        let article_link = self
            .ee
            .into_iter()
            .map(|e| e.trim().to_string())
            .find(|e| !e.is_empty());

        let key = self.key.trim();
        let bibliography_link =
            (!key.is_empty()).then(|| bibliography_url(record_base, key));

        Some(SearchHit {
            title,
            relevance_score,
            year,
            article_link,
            bibliography_link,
        })
    }
}

fn get_attr(e: &BytesStart<'_>, name: &str) -> Option<String> {
    e.attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == name.as_bytes())
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

fn parse_error(e: impl std::fmt::Display) -> DblpError {
    DblpError::Parse(format!("Failed to parse DBLP response: {}", e))
}

/// Parse a search response into hits.
///
/// Field text is gathered across nested markup, so `<title>Fast <i>k</i>-NN.</title>`
/// yields "Fast k-NN.". Entries without a title or a numeric year are skipped.
/// The first `<ee>` becomes the article link and the record key becomes the
/// BibTeX link. Malformed XML fails the whole response.
pub fn parse_hits(xml: &str, record_base: &str) -> Result<Vec<SearchHit>> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    let mut parsed = Vec::new();
    let mut current: Option<RawHit> = None;
    // Field being read and how many markup elements deep we are inside it
    let mut field: Option<(Field, usize)> = None;

    loop {
        match reader.read_event_into(&mut buf).map_err(parse_error)? {
            Event::Start(ref e) => {
                if let Some((f, depth)) = field {
                    field = Some((f, depth + 1));
                } else if let Some(hit) = current.as_mut() {
                    let name = e.name();
                    if name.as_ref() == b"info" {
                        hit.has_info = true;
                    } else if let Some(f) = Field::from_tag(name.as_ref()) {
                        hit.start_field(f);
                        field = Some((f, 0));
                    }
                } else if e.name().as_ref() == b"hit" {
                    current = Some(RawHit {
                        score: get_attr(e, "score"),
                        ..Default::default()
                    });
                }
            }
            Event::Empty(ref e) => {
                if let (Some(hit), None) = (current.as_mut(), field) {
                    if e.name().as_ref() == b"info" {
                        hit.has_info = true;
                    }
                }
            }
            Event::Text(ref e) => {
                if let (Some(hit), Some((f, _))) = (current.as_mut(), field) {
                    hit.push_text(f, &e.unescape().map_err(parse_error)?);
                }
            }
            Event::CData(ref e) => {
                if let (Some(hit), Some((f, _))) = (current.as_mut(), field) {
                    hit.push_text(f, &String::from_utf8_lossy(e));
                }
            }
            Event::End(ref e) => {
                if let Some((f, depth)) = field {
                    field = depth.checked_sub(1).map(|d| (f, d));
                } else if e.name().as_ref() == b"hit" {
                    if let Some(hit) = current.take().and_then(|h| h.finish(record_base)) {
                        parsed.push(hit);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(parsed)
}
