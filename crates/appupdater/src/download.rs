//! Archive download with progress tracking and cooperative cancellation
//!
//! The response body is streamed to disk in fixed-size chunks; the full
//! payload is never held in memory. The cancellation token is sampled before
//! every chunk write. A cancelled download removes the whole directory that
//! contains the destination file, not just the partial archive.
//!
//! # Example
//!
//! ```no_run
//! use appupdater::{Downloader, DownloadOutcome};
//! use appupdater_core::NetworkConfig;
//! use std::path::Path;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> appupdater::Result<()> {
//!     let downloader = Downloader::new(&NetworkConfig::default())?;
//!     let cancel = CancellationToken::new();
//!
//!     let outcome = downloader
//!         .download(
//!             "https://example.com/app.zip",
//!             Path::new("/opt/app/temp.zip"),
//!             |progress| println!("{:?}", progress.percentage()),
//!             &cancel,
//!         )
//!         .await?;
//!
//!     if let DownloadOutcome::Completed { bytes_written } = outcome {
//!         println!("Downloaded {} bytes", bytes_written);
//!     }
//!     Ok(())
//! }
//! ```

use appupdater_core::NetworkConfig;
use bytes::BytesMut;
use futures_util::StreamExt;
use reqwest::header::CONTENT_LENGTH;
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{Result, UpdateError};

/// Download progress information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Total bytes to download, 0 when the server sent no content length
    pub total_bytes: u64,

    /// Bytes written to disk so far
    pub downloaded_bytes: u64,
}

impl DownloadProgress {
    /// Create a new progress tracker
    pub fn new(total_bytes: u64) -> Self {
        Self {
            total_bytes,
            downloaded_bytes: 0,
        }
    }

    /// Update progress with the running byte count
    pub fn update(&mut self, downloaded_bytes: u64) {
        self.downloaded_bytes = downloaded_bytes;
    }

    /// Completed fraction in `0.0..=1.0`, or `None` when the total is unknown
    pub fn fraction(&self) -> Option<f64> {
        if self.total_bytes > 0 {
            Some((self.downloaded_bytes as f64 / self.total_bytes as f64).min(1.0))
        } else {
            None
        }
    }

    /// Progress percentage (0-100), or `None` when indeterminate
    pub fn percentage(&self) -> Option<f64> {
        self.fraction().map(|f| f * 100.0)
    }

    /// Check if the download is complete
    ///
    /// Always false while the total is unknown.
    pub fn is_complete(&self) -> bool {
        self.total_bytes > 0 && self.downloaded_bytes >= self.total_bytes
    }
}

/// How a download ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The stream was written to disk in full
    Completed { bytes_written: u64 },

    /// Cancellation was observed; the destination directory is gone
    Cancelled { bytes_written: u64 },
}

/// Streaming archive downloader
#[derive(Debug, Clone)]
pub struct Downloader {
    /// HTTP client
    client: reqwest::Client,

    /// Bytes per disk write and per progress report
    chunk_size: usize,
}

impl Downloader {
    /// Create a downloader from network settings
    ///
    /// Connection setup and each read of the body are bounded; the overall
    /// transfer is not, so large archives on slow links still complete.
    pub fn new(network: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(&network.user_agent)
            .connect_timeout(network.connect_timeout())
            .read_timeout(network.download_timeout())
            .build()
            .map_err(|e| UpdateError::Unexpected(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            chunk_size: network.download_chunk_size.max(1),
        })
    }

    /// Set the chunk size
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Stream `url` into `dest_file`
    ///
    /// `on_progress` is called after every chunk written. An empty body is
    /// not an error here; the caller validates the archive afterwards.
    pub async fn download<F>(
        &self,
        url: &str,
        dest_file: &Path,
        mut on_progress: F,
        cancel: &CancellationToken,
    ) -> Result<DownloadOutcome>
    where
        F: FnMut(DownloadProgress),
    {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpdateError::network(url, e))?;

        if !response.status().is_success() {
            return Err(UpdateError::HttpStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let total_size = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|ct| ct.to_str().ok())
            .and_then(|ct| ct.parse::<u64>().ok())
            .unwrap_or(0);

        info!(
            "Downloading {} ({})",
            url,
            if total_size > 0 {
                human_readable_size(total_size)
            } else {
                "unknown size".to_string()
            }
        );

        let mut file = File::create(dest_file).await.map_err(|e| {
            UpdateError::io(format!("Failed to create {}", dest_file.display()), e)
        })?;

        let mut progress = DownloadProgress::new(total_size);
        let mut pending = BytesMut::with_capacity(self.chunk_size);
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| UpdateError::network(url, e))?;
            pending.extend_from_slice(&chunk);

            while pending.len() >= self.chunk_size {
                let piece = pending.split_to(self.chunk_size);
                if cancel.is_cancelled() {
                    drop(file);
                    return self.abort(dest_file, progress.downloaded_bytes).await;
                }
                self.write_chunk(&mut file, dest_file, &piece, &mut progress)
                    .await?;
                on_progress(progress);
            }
        }

        if !pending.is_empty() {
            if cancel.is_cancelled() {
                drop(file);
                return self.abort(dest_file, progress.downloaded_bytes).await;
            }
            self.write_chunk(&mut file, dest_file, &pending, &mut progress)
                .await?;
            on_progress(progress);
        }

        file.flush()
            .await
            .map_err(|e| UpdateError::io(format!("Failed to flush {}", dest_file.display()), e))?;

        debug!("Download finished: {} bytes", progress.downloaded_bytes);
        Ok(DownloadOutcome::Completed {
            bytes_written: progress.downloaded_bytes,
        })
    }

    async fn write_chunk(
        &self,
        file: &mut File,
        dest_file: &Path,
        piece: &[u8],
        progress: &mut DownloadProgress,
    ) -> Result<()> {
        file.write_all(piece)
            .await
            .map_err(|e| UpdateError::io(format!("Failed to write {}", dest_file.display()), e))?;
        progress.update(progress.downloaded_bytes + piece.len() as u64);
        Ok(())
    }

    /// Remove the destination directory after a cancellation
    async fn abort(&self, dest_file: &Path, bytes_written: u64) -> Result<DownloadOutcome> {
        match dest_file.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(dir) => {
                info!(
                    "Download cancelled after {} bytes, removing {}",
                    bytes_written,
                    dir.display()
                );
                fs::remove_dir_all(dir).await.map_err(|e| {
                    UpdateError::io(format!("Failed to remove {}", dir.display()), e)
                })?;
            }
            None => {
                info!("Download cancelled after {} bytes", bytes_written);
                fs::remove_file(dest_file).await.map_err(|e| {
                    UpdateError::io(format!("Failed to remove {}", dest_file.display()), e)
                })?;
            }
        }

        Ok(DownloadOutcome::Cancelled { bytes_written })
    }
}

/// Convert bytes to human-readable size
fn human_readable_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}
