//! EXAM PAPER SCRAPER
//! Three stages sharing nothing but files on disk:
//! listing page -> link index, link index -> downloaded papers,
//! downloaded papers -> recurring question report.

mod error;
mod macros;

pub mod config;
pub mod download;
pub mod index;
pub mod menu;
pub mod parse;
pub mod pdf;
pub mod process;
pub mod questions;
pub mod report;
pub mod request;

pub use config::Config;
pub use error::{Error, Result};
pub use index::{LinkIndex, LinkRecord};

const LISTING_FILE: &str = "data/data.html";
const LINK_REPORT_FILE: &str = "output/links.txt";
const LINK_INDEX_FILE: &str = "output/links.json";
const ANALYSIS_REPORT_FILE: &str = "output/question_analysis.txt";
const PDF_DIR: &str = "pdfs";

const ORIGIN: &str = "https://biolab.csr.unibo.it";
/// The listing's "To Parent Directory" anchor.
const PARENT_HREF: &str = "/arc/";

const MAX_RETRIES: u32 = 3;
const RETRY_PAUSE_SECS: u64 = 2;
const LINK_DELAY_SECS: u64 = 1;
const REQUEST_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Zero based, so the third and fourth page.
const PDF_PAGES: [usize; 2] = [2, 3];
const MIN_QUESTION_LEN: usize = 10;
const HEADER_MARKER: &str = "Architetture degli elaboratori";
