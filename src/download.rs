//! Streaming download of a finished video to local disk.

use crate::error::{ArkGenError, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;

/// Outcome of a download attempt. No retry state is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadResult {
    /// Whether the file was written completely.
    pub success: bool,
    /// Destination path.
    pub path: PathBuf,
    /// Bytes written on success.
    pub bytes_written: u64,
    /// Failure description.
    pub error: Option<String>,
}

/// Fetches result URLs to disk.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: reqwest::Client,
}

impl Downloader {
    /// Default limit on a single stalled read. A slow transfer that keeps
    /// delivering bytes is never cut off.
    pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(300);

    /// Limit on establishing the connection.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates a downloader with the default read timeout.
    pub fn new() -> Result<Self> {
        Self::with_read_timeout(Self::DEFAULT_READ_TIMEOUT)
    }

    /// Creates a downloader that fails when no data arrives for `timeout`.
    pub fn with_read_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Self::CONNECT_TIMEOUT.min(timeout))
            .read_timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Downloads `url` to `dest`, logging and folding any error into the result.
    pub async fn download(&self, url: &str, dest: impl AsRef<Path>) -> DownloadResult {
        let dest = dest.as_ref();
        match self.try_download(url, dest).await {
            Ok(bytes_written) => DownloadResult {
                success: true,
                path: dest.to_path_buf(),
                bytes_written,
                error: None,
            },
            Err(e) => {
                tracing::error!(path = %dest.display(), "download failed: {e}");
                DownloadResult {
                    success: false,
                    path: dest.to_path_buf(),
                    bytes_written: 0,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Downloads `url` to `dest`, returning the number of bytes written.
    ///
    /// Missing parent directories are created. A non-success HTTP status is
    /// rejected before the file is opened; a stream that breaks midway
    /// leaves no partial file behind.
    pub async fn try_download(&self, url: &str, dest: impl AsRef<Path>) -> Result<u64> {
        let dest = dest.as_ref();
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ArkGenError::Download(format!(
                "server answered {status} for the video URL"
            )));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let written = match stream_body(&mut response, &mut file).await {
            Ok(n) => n,
            Err(e) => {
                drop(file);
                if let Err(rm) = tokio::fs::remove_file(dest).await {
                    tracing::warn!(path = %dest.display(), "could not remove partial file: {rm}");
                }
                return Err(e);
            }
        };

        tracing::debug!(path = %dest.display(), bytes = written, "video saved");
        Ok(written)
    }
}

async fn stream_body(response: &mut reqwest::Response, file: &mut tokio::fs::File) -> Result<u64> {
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        if chunk.is_empty() {
            continue;
        }
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;
    Ok(written)
}

/// Seconds since the Unix epoch, for naming output files.
pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// `video_<ts>.mp4`
pub fn timestamped_video_name(timestamp: u64) -> String {
    format!("video_{timestamp}.mp4")
}
