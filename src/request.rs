use std::ffi::OsString;
use std::path::{Path, PathBuf};

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use tokio::{fs::File, io::AsyncWriteExt};

use crate::config::DownloadSettings;
use crate::{Error, Result};

/// Fetches one URL into one file. A single call is a single attempt,
/// retries and pacing are the caller's business.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Returns the number of bytes written to `dest`.
    async fn fetch_to(&self, url: &str, dest: &Path) -> Result<u64>;
}

/// `reqwest` backed transport. The body is streamed into `<dest>.part`
/// and only renamed to `dest` once the last chunk is on disk.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(settings: &DownloadSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_str(&settings.user_agent)?);
        // Bounds each read, not the whole transfer.
        let client = Client::builder()
            .connect_timeout(settings.timeout)
            .read_timeout(settings.timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self { client })
    }

    async fn stream_to(&self, url: &str, part: &Path) -> Result<u64> {
        let mut res = self.client.get(url).send().await?;
        let status = res.status();
        if !status.is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let mut file = File::create(part).await?;
        let mut written = 0u64;
        while let Some(chunk) = res.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        file.sync_all().await?;
        Ok(written)
    }
}

impl Transport for HttpTransport {
    async fn fetch_to(&self, url: &str, dest: &Path) -> Result<u64> {
        let part = part_path(dest);
        match self.stream_to(url, &part).await {
            Ok(written) => {
                tokio::fs::rename(&part, dest).await?;
                Ok(written)
            }
            Err(e) => {
                // Never leave a half file that looks like a finished one.
                let _ = tokio::fs::remove_file(&part).await;
                Err(e)
            }
        }
    }
}

/// `paper.pdf` -> `paper.pdf.part`
pub fn part_path(dest: &Path) -> PathBuf {
    let mut name = OsString::from(dest.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}
