//! Sequential sync of the remote catalog into a local folder.
//!
//! [`SyncEngine::run`] walks a fixed sequence: create the target directory,
//! validate the token, list the catalog, then fetch every item in catalog
//! order. Items are isolated from each other: a failed item only bumps
//! [`SyncResult::failed`]. The run is unsuccessful only when the token is
//! rejected or the caller cancels.
//!
//! # Example
//!
//! ```no_run
//! use gopro_sync::{ClientConfig, Credential, ProgressSender, SyncEngine, SyncOptions};
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = SyncEngine::connect(
//!     Credential::new("token"),
//!     ClientConfig::default(),
//!     SyncOptions::default(),
//! )?;
//! let (progress, mut rx) = ProgressSender::channel();
//! tokio::spawn(async move {
//!     while let Some(event) = rx.recv().await {
//!         println!("{:?} {}", event.percent, event.message);
//!     }
//! });
//! let result = engine.run(Path::new("./media"), Some(&progress), None).await?;
//! println!("{} downloaded, {} skipped", result.downloaded, result.skipped);
//! # Ok(())
//! # }
//! ```

mod progress;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

pub use progress::{CancelFlag, ProgressSender, SyncProgress, item_percent};

use crate::api::{ApiError, ClientConfig, CloudClient, DEFAULT_PAGE_SIZE, PageLimit};
use crate::credential::Credential;
use crate::download::{FetchOutcome, ItemFetcher, RetryPolicy};

/// Progress message emitted before validation.
pub const MSG_VALIDATING: &str = "Validating token...";
/// Progress message emitted when the token is rejected.
pub const MSG_INVALID_TOKEN: &str = "Invalid token.";
/// Progress message emitted before listing the catalog.
pub const MSG_FETCHING: &str = "Fetching media list...";
/// Progress message emitted when the run stops on cancellation.
pub const MSG_CANCELLED: &str = "Sync cancelled.";
/// Final progress message of a completed run.
pub const MSG_COMPLETE: &str = "Sync complete.";

/// Errors that prevent a sync from starting.
///
/// Everything that happens after the target directory exists is reported
/// through [`SyncResult`] instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The target directory could not be created.
    #[error("cannot create target directory {path}: {source}")]
    TargetDir {
        /// The requested directory.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The catalog client could not be built.
    #[error(transparent)]
    Client(#[from] ApiError),
}

/// Tuning knobs for a sync run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Items requested per catalog page.
    pub page_size: u32,
    /// Cap on the number of catalog pages.
    pub max_pages: PageLimit,
    /// Retry policy of the archive endpoint.
    pub retry: RetryPolicy,
    /// Whether `.360` containers are unwrapped after download.
    pub unwrap_containers: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: PageLimit::Unbounded,
            retry: RetryPolicy::default(),
            unwrap_containers: true,
        }
    }
}

/// Aggregate outcome of a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncResult {
    /// Items returned by the catalog.
    pub total: usize,
    /// Items that reached the fetch step.
    pub processed: usize,
    /// Items written to disk.
    pub downloaded: usize,
    /// Items already present with the declared size.
    pub skipped: usize,
    /// Items for which every delivery path failed.
    pub failed: usize,
    /// False only when the token was rejected or the run was cancelled.
    pub success: bool,
    /// Whether the run stopped on cancellation.
    pub cancelled: bool,
}

impl SyncResult {
    fn tally(&mut self, outcome: FetchOutcome) {
        self.processed += 1;
        match outcome {
            FetchOutcome::Skipped => self.skipped += 1,
            FetchOutcome::Downloaded => self.downloaded += 1,
            FetchOutcome::Failed => self.failed += 1,
        }
    }
}

/// Drives validation, listing and per-item fetching.
#[derive(Debug, Clone)]
pub struct SyncEngine {
    client: CloudClient,
    fetcher: ItemFetcher,
    options: SyncOptions,
}

impl SyncEngine {
    /// Creates an engine around an existing client.
    #[must_use]
    pub fn new(client: CloudClient, options: SyncOptions) -> Self {
        let fetcher = ItemFetcher::new(client.clone(), options.retry.clone())
            .with_unwrap(options.unwrap_containers);
        Self {
            client,
            fetcher,
            options,
        }
    }

    /// Builds the client and the engine in one step.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Client`] if the client cannot be built.
    pub fn connect(
        credential: Credential,
        config: ClientConfig,
        options: SyncOptions,
    ) -> Result<Self, SyncError> {
        let client = CloudClient::new(credential, config)?;
        Ok(Self::new(client, options))
    }

    /// Returns the options this engine runs with.
    #[must_use]
    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Runs one sync into `target_dir`.
    ///
    /// `progress` receives notifications at fixed points (0% before
    /// validation, 5% before listing, 10%..100% across items, 100% at the
    /// end). `cancel` is polled before each item; an item already in flight
    /// always finishes first.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::TargetDir`] if the target directory cannot be
    /// created. Token rejection, cancellation and item failures are reported
    /// in the returned [`SyncResult`].
    #[instrument(skip(self, progress, cancel), fields(target = %target_dir.display()))]
    pub async fn run(
        &self,
        target_dir: &Path,
        progress: Option<&ProgressSender>,
        cancel: Option<&CancelFlag>,
    ) -> Result<SyncResult, SyncError> {
        let emit = |message: &str, percent: Option<u8>| {
            if let Some(tx) = progress {
                tx.emit(message, percent);
            }
        };

        tokio::fs::create_dir_all(target_dir)
            .await
            .map_err(|source| SyncError::TargetDir {
                path: target_dir.to_path_buf(),
                source,
            })?;

        let mut result = SyncResult::default();

        emit(MSG_VALIDATING, Some(0));
        if !self.client.validate().await {
            warn!("token rejected by both auth schemes");
            emit(MSG_INVALID_TOKEN, Some(0));
            return Ok(result);
        }

        emit(MSG_FETCHING, Some(5));
        let items = self
            .client
            .list_all(self.options.max_pages, self.options.page_size)
            .await;
        result.total = items.len();
        info!(total = result.total, "catalog listed");

        for (index, item) in items.iter().enumerate() {
            if cancel.is_some_and(CancelFlag::is_cancelled) {
                info!(
                    processed = result.processed,
                    total = result.total,
                    "sync cancelled"
                );
                emit(MSG_CANCELLED, None);
                result.cancelled = true;
                return Ok(result);
            }

            let filename = item.resolved_filename();
            emit(
                &format!("Processing {filename}..."),
                Some(item_percent(index, result.total)),
            );

            let outcome = self.fetcher.fetch(item, target_dir).await;
            debug!(item_id = %item.id, filename = %filename, ?outcome, "item done");
            result.tally(outcome);
        }

        result.success = true;
        info!(
            downloaded = result.downloaded,
            skipped = result.skipped,
            failed = result.failed,
            "sync complete"
        );
        emit(MSG_COMPLETE, Some(100));
        Ok(result)
    }
}
