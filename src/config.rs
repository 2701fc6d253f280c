use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::{
    ANALYSIS_REPORT_FILE, HEADER_MARKER, LINK_DELAY_SECS, LINK_INDEX_FILE, LINK_REPORT_FILE,
    LISTING_FILE, MAX_RETRIES, MIN_QUESTION_LEN, ORIGIN, PARENT_HREF, PDF_DIR, PDF_PAGES,
    REQUEST_TIMEOUT_SECS, RETRY_PAUSE_SECS, USER_AGENT,
};

/// Everything the stages need to know about where things live and how to behave.
/// Every relative path is resolved against `root`, nothing touches the working directory.
#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub listing_file: PathBuf,
    pub link_report_file: PathBuf,
    pub link_index_file: PathBuf,
    pub analysis_report_file: PathBuf,
    pub pdf_dir: PathBuf,
    pub origin: String,
    pub parent_href: String,
    pub download: DownloadSettings,
    pub analysis: AnalysisSettings,
}

#[derive(Debug, Clone)]
pub struct DownloadSettings {
    /// Attempts per file, not retries after the first one.
    pub max_retries: u32,
    pub retry_pause: Duration,
    /// Pause between two different links.
    pub link_delay: Duration,
    pub timeout: Duration,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub pages: Vec<usize>,
    pub min_question_len: usize,
    pub header_marker: String,
}

impl Config {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            listing_file: root.join(LISTING_FILE),
            link_report_file: root.join(LINK_REPORT_FILE),
            link_index_file: root.join(LINK_INDEX_FILE),
            analysis_report_file: root.join(ANALYSIS_REPORT_FILE),
            pdf_dir: root.join(PDF_DIR),
            root,
            origin: ORIGIN.to_string(),
            parent_href: PARENT_HREF.to_string(),
            download: DownloadSettings::default(),
            analysis: AnalysisSettings::default(),
        }
    }

    /// Path relative to the root, for printing.
    pub fn display_path<'a>(&self, path: &'a Path) -> std::path::Display<'a> {
        path.strip_prefix(&self.root).unwrap_or(path).display()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(".")
    }
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            retry_pause: Duration::from_secs(RETRY_PAUSE_SECS),
            link_delay: Duration::from_secs(LINK_DELAY_SECS),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            pages: PDF_PAGES.to_vec(),
            min_question_len: MIN_QUESTION_LEN,
            header_marker: HEADER_MARKER.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_hang_off_the_root() {
        let config = Config::new("/tmp/exams");
        assert_eq!(config.listing_file, Path::new("/tmp/exams/data/data.html"));
        assert_eq!(config.pdf_dir, Path::new("/tmp/exams/pdfs"));
        assert_eq!(
            config.display_path(&config.link_index_file).to_string(),
            "output/links.json"
        );
    }

    #[test]
    fn defaults_match_the_listing_site() {
        let config = Config::default();
        assert_eq!(config.download.max_retries, 3);
        assert_eq!(config.download.retry_pause, Duration::from_secs(2));
        assert_eq!(config.download.link_delay, Duration::from_secs(1));
        assert_eq!(config.download.timeout, Duration::from_secs(30));
        assert_eq!(config.analysis.pages, vec![2, 3]);
        assert_eq!(config.analysis.min_question_len, 10);
    }
}
