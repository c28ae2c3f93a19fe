use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use reqwest::{Client, Proxy};
use thiserror::Error;
use tracing::{debug, info};

/// Callback type for reporting download progress.
/// Arguments: source URL, bytes downloaded, total bytes, MiB/s, is_complete
pub type ProgressFn = Arc<dyn Fn(&str, u64, u64, f64, bool) + Send + Sync>;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("download of {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build an HTTP client, optionally with proxy support.
pub fn build_client(proxy: Option<&str>) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .user_agent(concat!("webview-natives/", env!("CARGO_PKG_VERSION")));
    if let Some(proxy_url) = proxy {
        builder = builder.proxy(Proxy::all(proxy_url)?);
    }
    builder.build()
}

/// Streams release assets to local cache files.
pub struct Downloader {
    client: Client,
    /// Optional progress callback.
    pub progress: Option<ProgressFn>,
}

impl Downloader {
    pub fn new(client: Client, progress: Option<ProgressFn>) -> Self {
        Self { client, progress }
    }

    /// Stream `url` into `dest`, overwriting it.
    ///
    /// Bytes land in a sibling `.part` file first; `dest` only appears once the
    /// whole body has been written, so a present `dest` is always complete.
    pub async fn fetch(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let part = part_path(dest);

        info!(%url, dest = %dest.display(), "downloading asset");
        let result = self.stream_to(url, &part).await;
        if result.is_err() {
            let _ = std::fs::remove_file(&part);
            return result;
        }

        std::fs::rename(&part, dest)?;
        Ok(())
    }

    async fn stream_to(&self, url: &str, path: &Path) -> Result<(), FetchError> {
        let resp = self.client.get(url).send().await?;
        if !resp.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_owned(),
                status: resp.status().as_u16(),
            });
        }

        let total = resp.content_length().unwrap_or(0);
        let mut downloaded: u64 = 0;
        let mut stream = resp.bytes_stream();
        let mut file = std::fs::File::create(path)?;
        let start = Instant::now();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            downloaded += chunk.len() as u64;
            file.write_all(&chunk)?;
            self.report(url, downloaded, total, start, false);
        }
        file.flush()?;

        self.report(url, downloaded, total, start, true);
        debug!(%url, bytes = downloaded, "download complete");
        Ok(())
    }

    fn report(&self, src: &str, downloaded: u64, total: u64, start: Instant, complete: bool) {
        if let Some(progress) = &self.progress {
            let elapsed = start.elapsed().as_secs_f64();
            let mib_per_sec = if elapsed > 0.0 {
                (downloaded as f64) / (1024.0 * 1024.0) / elapsed
            } else {
                0.0
            };
            progress(src, downloaded, total, mib_per_sec, complete);
        }
    }
}

pub(crate) fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}
