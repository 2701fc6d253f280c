use std::collections::BTreeMap;
use std::path::Path;

use chrono::Local;
use tokio::time::sleep;
use url::Url;

use crate::config::DownloadSettings;
use crate::request::Transport;
use crate::{info_time, warn_time, Error, LinkIndex, LinkRecord, Result};

/// What happened to one link. Only lives long enough to be summarised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadOutcome {
    pub display_name: String,
    pub absolute_url: String,
    pub derived_filename: String,
    pub success: bool,
    /// Bytes on disk for this file; for skipped files the size already present.
    pub bytes_written: u64,
    pub already_present: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DownloadSummary {
    pub outcomes: Vec<DownloadOutcome>,
}

impl DownloadSummary {
    pub fn requested(&self) -> usize {
        self.outcomes.len()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &DownloadOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }

    /// Percentage of successful links, 0 when nothing was requested.
    pub fn success_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 0.0;
        }
        self.success_count() as f64 / self.outcomes.len() as f64 * 100.0
    }
}

/// Sequential downloader: one link at a time, bounded retries with a fixed pause,
/// and a fixed delay between links.
pub struct Downloader<T> {
    transport: T,
    settings: DownloadSettings,
}

impl<T: Transport> Downloader<T> {
    pub fn new(transport: T, settings: DownloadSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Downloads every record into `folder`. A failing link never stops the batch.
    pub async fn download_all(
        &self,
        records: &[LinkRecord],
        folder: &Path,
    ) -> Result<DownloadSummary> {
        let start_time = Local::now();
        tokio::fs::create_dir_all(folder).await?;
        info_time!(
            "Downloading {} files into {}",
            records.len(),
            folder.display()
        );

        let entries = records
            .iter()
            .map(|r| (r.display_name.as_str(), Some(r.absolute_url.as_str())))
            .collect::<Vec<_>>();
        let summary = self.download_entries(&entries, folder).await;

        info_time!(
            start_time,
            "Finished downloading: {}/{} ok",
            summary.success_count(),
            summary.requested()
        );
        Ok(summary)
    }

    /// Downloads the papers of a single year, resolving names through the index.
    /// An unknown year downloads nothing.
    pub async fn download_year(
        &self,
        index: &LinkIndex,
        year: &str,
        folder: &Path,
    ) -> Result<DownloadSummary> {
        let names = index.compiti_by_year(year);
        if names.is_empty() {
            warn_time!("No papers found for year {year}");
            return Ok(DownloadSummary::default());
        }

        tokio::fs::create_dir_all(folder).await?;
        info_time!("Downloading {} papers of {year}", names.len());

        let entries = names
            .iter()
            .map(|name| (name.as_str(), index.url_by_name(name)))
            .collect::<Vec<_>>();
        Ok(self.download_entries(&entries, folder).await)
    }

    async fn download_entries(
        &self,
        entries: &[(&str, Option<&str>)],
        folder: &Path,
    ) -> DownloadSummary {
        let total = entries.len();
        let mut summary = DownloadSummary {
            outcomes: Vec::with_capacity(total),
        };

        for (i, (name, url)) in entries.iter().enumerate() {
            info_time!("[{}/{}] {}", i + 1, total, name);
            let outcome = match url {
                Some(url) => self.download_link(name, url, folder).await,
                None => {
                    warn_time!("No URL known for {name}");
                    DownloadOutcome {
                        display_name: name.to_string(),
                        absolute_url: String::new(),
                        derived_filename: String::new(),
                        success: false,
                        bytes_written: 0,
                        already_present: false,
                    }
                }
            };
            summary.outcomes.push(outcome);

            if i + 1 < total && !self.settings.link_delay.is_zero() {
                sleep(self.settings.link_delay).await;
            }
        }
        summary
    }

    /// Fetches one link into `folder`, named after the URL's last path segment.
    /// Files already on disk and non-empty are not fetched again.
    pub async fn download_link(&self, name: &str, url: &str, folder: &Path) -> DownloadOutcome {
        let mut outcome = DownloadOutcome {
            display_name: name.to_string(),
            absolute_url: url.to_string(),
            derived_filename: String::new(),
            success: false,
            bytes_written: 0,
            already_present: false,
        };

        let filename = match file_name_from_url(url) {
            Ok(filename) => filename,
            Err(e) => {
                warn_time!("Skipping {name}: {e}");
                return outcome;
            }
        };
        let dest = folder.join(&filename);
        outcome.derived_filename = filename;

        if let Ok(meta) = tokio::fs::metadata(&dest).await {
            if meta.is_file() && meta.len() > 0 {
                info_time!(
                    "Already present: {} ({} bytes)",
                    outcome.derived_filename,
                    meta.len()
                );
                outcome.success = true;
                outcome.bytes_written = meta.len();
                outcome.already_present = true;
                return outcome;
            }
        }

        let max = self.settings.max_retries.max(1);
        for attempt in 1..=max {
            info_time!(
                "Downloading {} (attempt {attempt}/{max})",
                outcome.derived_filename
            );
            match self.transport.fetch_to(url, &dest).await {
                Ok(written) => {
                    info_time!("Done: {} ({written} bytes)", outcome.derived_filename);
                    outcome.success = true;
                    outcome.bytes_written = written;
                    return outcome;
                }
                Err(e) => {
                    warn_time!("Attempt {attempt} failed: {e}");
                    if attempt < max {
                        sleep(self.settings.retry_pause).await;
                    }
                }
            }
        }

        warn_time!(
            "Giving up on {} after {max} attempts",
            outcome.derived_filename
        );
        outcome
    }
}

/// Last path segment of `url`, as it appears in the URL.
pub fn file_name_from_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url)?;
    parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::NoFileName(url.to_string()))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtensionStats {
    pub count: usize,
    pub bytes: u64,
}

/// What is actually in the download folder, previous runs included.
#[derive(Debug, Clone, Default)]
pub struct FolderStats {
    /// Lowercased extension with its dot (`.pdf`), empty for none.
    pub by_extension: BTreeMap<String, ExtensionStats>,
    pub file_count: usize,
    pub total_bytes: u64,
}

pub async fn folder_stats(folder: &Path) -> Result<FolderStats> {
    let mut stats = FolderStats::default();
    let mut entries = tokio::fs::read_dir(folder).await?;
    while let Some(entry) = entries.next_entry().await? {
        let meta = entry.metadata().await?;
        if !meta.is_file() {
            continue;
        }
        let path = entry.path();
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();

        let slot = stats.by_extension.entry(ext).or_default();
        slot.count += 1;
        slot.bytes += meta.len();
        stats.file_count += 1;
        stats.total_bytes += meta.len();
    }
    Ok(stats)
}
