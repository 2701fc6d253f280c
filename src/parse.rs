use regex::Regex;
use scraper::{Html, Selector};

use crate::{Error, LinkRecord, Result};

/// A year is four digits glued to an underscore, e.g. `2023_06_20.pdf`.
const YEAR_PATTERN: &str = r"(\d{4})_";

/// Parses a directory listing and returns every anchor that points at an entry.
/// The parent directory anchor (`parent_href`) and icon placeholders (`href` starting
/// with `[`) are dropped. Order follows the document.
pub fn parse_listing(html: &str, origin: &str, parent_href: &str) -> Result<Vec<LinkRecord>> {
    let doc = Html::parse_document(html);
    let anchor_selector = create_selector("a[href]")?;

    let mut records = Vec::new();
    for anchor in doc.select(&anchor_selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if href == parent_href || href.starts_with('[') {
            continue;
        }

        // Every text node trimmed on its own, then glued together.
        let display_name = anchor.text().map(str::trim).collect::<String>();
        records.push(LinkRecord {
            display_name,
            relative_url: href.to_string(),
            absolute_url: format!("{origin}{href}"),
        });
    }
    Ok(records)
}

/// Finds the year key of a display name: the digits of the first `YYYY_` match.
#[derive(Debug, Clone)]
pub struct YearMatcher {
    re: Regex,
}

impl YearMatcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            re: Regex::new(YEAR_PATTERN)?,
        })
    }

    pub fn year_of<'a>(&self, name: &'a str) -> Option<&'a str> {
        self.re
            .captures(name)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::ParseMissingSelector(sel_str.into()))
}
