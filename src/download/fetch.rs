//! Per-item fetch strategy.
//!
//! For one [`MediaItem`] the fetcher decides between skipping (an identical
//! file is already on disk), the pre-signed direct URL, and the archive
//! endpoint, and finally unwraps `.360` containers. Every byte lands in a
//! sidecar first and is renamed into place only once it is complete.

use std::io;
use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::archive::{extract_first_media, is_archive_content_type};
use super::filename::{PARTIAL_SUFFIX, sanitize_filename, with_suffix};
use super::retry::{RetryDecision, RetryPolicy};
use super::staging::Staged;
use super::unwrap::{is_container, unwrap_container};
use super::DownloadError;
use crate::api::{ApiError, CloudClient, MediaItem};

/// Result of fetching one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// A local file of the declared size already exists; nothing was requested.
    Skipped,
    /// The item was written to the target directory.
    Downloaded,
    /// Every delivery path failed; the reason was logged.
    Failed,
}

/// Downloads single catalog items into a target directory.
#[derive(Debug, Clone)]
pub struct ItemFetcher {
    client: CloudClient,
    retry: RetryPolicy,
    unwrap_containers: bool,
}

impl ItemFetcher {
    /// Creates a fetcher with container unwrapping enabled.
    #[must_use]
    pub fn new(client: CloudClient, retry: RetryPolicy) -> Self {
        Self {
            client,
            retry,
            unwrap_containers: true,
        }
    }

    /// Enables or disables the `.360` unwrap post-step.
    #[must_use]
    pub fn with_unwrap(mut self, enabled: bool) -> Self {
        self.unwrap_containers = enabled;
        self
    }

    /// Fetches `item` into `target_dir`.
    ///
    /// Never returns an error: failures are logged with the item id and
    /// filename and reported as [`FetchOutcome::Failed`].
    #[instrument(skip(self, item, target_dir), fields(item_id = %item.id))]
    pub async fn fetch(&self, item: &MediaItem, target_dir: &Path) -> FetchOutcome {
        match self.try_fetch(item, target_dir).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(
                    item_id = %item.id,
                    filename = %item.resolved_filename(),
                    error = %e,
                    "item failed"
                );
                FetchOutcome::Failed
            }
        }
    }

    async fn try_fetch(
        &self,
        item: &MediaItem,
        target_dir: &Path,
    ) -> Result<FetchOutcome, DownloadError> {
        let filename = sanitize_filename(&item.resolved_filename());
        let dest = target_dir.join(&filename);

        if is_already_synced(&dest, item.file_size).await {
            debug!(filename = %filename, "already synced, skipping");
            return Ok(FetchOutcome::Skipped);
        }

        let direct = match item.source_url() {
            Some(url) => match self.fetch_direct(url, &dest).await {
                Ok(bytes) => {
                    info!(filename = %filename, bytes, "downloaded via direct URL");
                    true
                }
                Err(e) => {
                    warn!(filename = %filename, error = %e, "direct download failed, trying archive endpoint");
                    false
                }
            },
            None => false,
        };

        if !direct {
            self.fetch_archive(item, &dest).await?;
            info!(filename = %filename, "downloaded via archive endpoint");
        }

        if self.unwrap_containers && is_container(&filename) {
            unwrap_in_background(dest).await;
        }

        Ok(FetchOutcome::Downloaded)
    }

    /// Streams a pre-signed URL to `dest` with no credential attached.
    async fn fetch_direct(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        let shown = redacted(&parsed);

        let response = self
            .client
            .plain_get(parsed.as_str())
            .send()
            .await
            .map_err(|e| DownloadError::transport(&shown, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(&shown, status.as_u16()));
        }

        let staged = Staged::new(with_suffix(dest, PARTIAL_SUFFIX));
        let bytes = stream_to_file(response, &shown, staged.path()).await?;
        staged.persist(dest)?;
        Ok(bytes)
    }

    /// Archive endpoint with bounded retries.
    async fn fetch_archive(&self, item: &MediaItem, dest: &Path) -> Result<(), DownloadError> {
        let url = self
            .client
            .zip_source_url(&item.id)
            .map_err(|e: ApiError| DownloadError::invalid_url(e.to_string()))?;

        let mut attempt = 1;
        loop {
            let error = match self.archive_attempt(&url, dest).await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };

            match self.retry.should_retry(&error, attempt) {
                RetryDecision::Retry {
                    delay,
                    attempt: next,
                } => {
                    warn!(
                        item_id = %item.id,
                        attempt,
                        max_attempts = self.retry.max_attempts(),
                        error = %error,
                        "archive download attempt failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    debug!(item_id = %item.id, attempt, reason = %reason, "giving up on archive endpoint");
                    return Err(error);
                }
            }
        }
    }

    async fn archive_attempt(&self, url: &Url, dest: &Path) -> Result<(), DownloadError> {
        let shown = redacted(url);
        let response = self
            .client
            .cookie_get(url.clone())
            .send()
            .await
            .map_err(|e| DownloadError::transport(&shown, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(&shown, status.as_u16()));
        }

        let is_archive = is_archive_content_type(
            response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok()),
        );

        let staged = Staged::new(with_suffix(dest, PARTIAL_SUFFIX));
        let bytes = stream_to_file(response, &shown, staged.path()).await?;
        debug!(bytes, is_archive, "archive endpoint payload received");

        if is_archive {
            let archive_path = staged.path().to_path_buf();
            let target = dest.to_path_buf();
            let extracted =
                tokio::task::spawn_blocking(move || extract_first_media(&archive_path, &target))
                    .await
                    .map_err(|e| DownloadError::io(dest, io::Error::other(e)))?;
            match extracted {
                Ok(entry) => {
                    debug!(entry = %entry, "extracted archive payload");
                    return Ok(());
                }
                Err(DownloadError::Archive { source, .. }) => {
                    warn!(error = %source, "payload labeled as archive is not one, keeping raw file");
                }
                Err(e) => return Err(e),
            }
        }

        staged.persist(dest)
    }
}

async fn is_already_synced(dest: &Path, expected: Option<u64>) -> bool {
    let Some(expected) = expected else {
        return false;
    };
    match tokio::fs::metadata(dest).await {
        Ok(meta) => meta.is_file() && meta.len() == expected,
        Err(_) => false,
    }
}

/// Runs the container unwrap on the blocking pool. Failures are logged only.
async fn unwrap_in_background(path: PathBuf) {
    let shown = path.display().to_string();
    match tokio::task::spawn_blocking(move || unwrap_container(&path)).await {
        Ok(Ok(output)) => debug!(output = %output.display(), "container unwrapped"),
        Ok(Err(e)) => warn!(path = %shown, error = %e, "container unwrap failed"),
        Err(e) => warn!(path = %shown, error = %e, "container unwrap task failed"),
    }
}

/// URL without its query string, safe to log.
fn redacted(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.to_string()
}

async fn stream_to_file(
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let file = File::create(file_path)
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::transport(url, e))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_redacted_drops_token_query() {
        let url = Url::parse("https://api.gopro.com/media/x/zip/source?ids=1&access_token=secret")
            .unwrap();
        let shown = redacted(&url);
        assert_eq!(shown, "https://api.gopro.com/media/x/zip/source");
        assert!(!shown.contains("secret"));
    }

    #[tokio::test]
    async fn test_is_already_synced_requires_exact_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"12345").unwrap();

        assert!(is_already_synced(&path, Some(5)).await);
        assert!(!is_already_synced(&path, Some(6)).await);
        assert!(!is_already_synced(&path, None).await);
        assert!(!is_already_synced(&dir.path().join("missing.mp4"), Some(5)).await);
    }

    #[tokio::test]
    async fn test_is_already_synced_ignores_directories() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("clip.mp4");
        std::fs::create_dir(&sub).unwrap();
        let len = std::fs::metadata(&sub).unwrap().len();
        assert!(!is_already_synced(&sub, Some(len)).await);
    }
}
