use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::parse::YearMatcher;
use crate::{Error, Result};

/// One entry of the listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub display_name: String,
    pub relative_url: String,
    pub absolute_url: String,
}

/// The flat link list plus the two lookups derived from it.
/// Built once per process and handed to whoever needs it by reference.
#[derive(Debug, Clone, Default)]
pub struct LinkIndex {
    records: Vec<LinkRecord>,
    /// year -> display names, in listing order.
    by_year: BTreeMap<String, Vec<String>>,
    /// display name -> position of the first record with that name.
    by_name: HashMap<String, usize>,
}

/// Shape of the reusable artifact on disk. Only `records` is read back.
#[derive(Serialize)]
struct LinkArtifact<'a> {
    names: Vec<&'a str>,
    urls: Vec<&'a str>,
    records: &'a [LinkRecord],
    total: usize,
    by_year: &'a BTreeMap<String, Vec<String>>,
}

#[derive(Deserialize)]
struct StoredRecords {
    records: Vec<LinkRecord>,
}

impl LinkIndex {
    pub fn new(records: Vec<LinkRecord>) -> Result<Self> {
        let years = YearMatcher::new()?;
        let mut by_year: BTreeMap<String, Vec<String>> = BTreeMap::new();
        let mut by_name = HashMap::with_capacity(records.len());

        for (pos, record) in records.iter().enumerate() {
            if let Some(year) = years.year_of(&record.display_name) {
                by_year
                    .entry(year.to_string())
                    .or_default()
                    .push(record.display_name.clone());
            }
            by_name.entry(record.display_name.clone()).or_insert(pos);
        }

        Ok(Self {
            records,
            by_year,
            by_name,
        })
    }

    pub fn records(&self) -> &[LinkRecord] {
        &self.records
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.display_name.as_str())
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.absolute_url.as_str())
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn by_year(&self) -> &BTreeMap<String, Vec<String>> {
        &self.by_year
    }

    /// Names listed under `year`. Unknown years give an empty slice.
    pub fn compiti_by_year(&self, year: &str) -> &[String] {
        self.by_year.get(year).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Absolute URL of the first record named exactly `name`.
    pub fn url_by_name(&self, name: &str) -> Option<&str> {
        self.by_name
            .get(name)
            .map(|&pos| self.records[pos].absolute_url.as_str())
    }

    /// Years in ascending order.
    pub fn years(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.by_year.keys().map(String::as_str)
    }

    /// The `n` latest years, oldest first.
    pub fn recent_years(&self, n: usize) -> Vec<&str> {
        let mut years = self.years().rev().take(n).collect::<Vec<_>>();
        years.reverse();
        years
    }

    pub fn to_json(&self) -> Result<String> {
        let artifact = LinkArtifact {
            names: self.names().collect(),
            urls: self.urls().collect(),
            records: &self.records,
            total: self.total(),
            by_year: &self.by_year,
        };
        Ok(serde_json::to_string_pretty(&artifact)?)
    }

    /// Rebuilds the index from the `records` of a stored artifact.
    /// The year map and lookups are derived again, never taken from disk.
    pub fn from_json(json: &str) -> Result<Self> {
        let stored: StoredRecords = serde_json::from_str(json)?;
        Self::new(stored.records)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, self.to_json()?).await?;
        Ok(())
    }

    pub async fn load(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path).await? {
            return Err(Error::MissingInput(path.to_path_buf()));
        }
        let json = tokio::fs::read_to_string(path).await?;
        Self::from_json(&json)
    }
}
