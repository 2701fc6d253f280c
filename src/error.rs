use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("The selector you are trying to scrape for is invalid. Selector: {0}")]
    ParseMissingSelector(String),

    #[error("Required input is missing: {}", .0.display())]
    MissingInput(PathBuf),
    #[error("No PDF found in {}, download the papers first", .0.display())]
    NothingToAnalyze(PathBuf),

    #[error("Io Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Reqwest Error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Server answered {status} for {url}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("URL has no file name to save to: {0}")]
    NoFileName(String),

    #[error("Regex Error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Pdf Error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Tokio Join Error, couldn't await a task! {0}")]
    RuntimeJoin(#[from] tokio::task::JoinError),
    #[error("Standard input was closed.")]
    PromptClosed,
}
