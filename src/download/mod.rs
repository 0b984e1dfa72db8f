//! Per-item download strategy.
//!
//! [`ItemFetcher`] turns one catalog entry into a file in the target
//! directory:
//!
//! - skip when a local file already has the declared size
//! - stream the pre-signed source variation when one exists
//! - otherwise fall back to the archive endpoint, with retries, and extract
//!   the wrapped media file
//! - unwrap `.360` containers into their inner media file
//!
//! # Example
//!
//! ```no_run
//! use gopro_sync::api::{ClientConfig, CloudClient, MediaItem};
//! use gopro_sync::download::{FetchOutcome, ItemFetcher, RetryPolicy};
//! use gopro_sync::Credential;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = CloudClient::new(Credential::new("token"), ClientConfig::default())?;
//! let fetcher = ItemFetcher::new(client, RetryPolicy::default());
//! let outcome = fetcher.fetch(&MediaItem::new("abc"), Path::new("./media")).await;
//! assert_ne!(outcome, FetchOutcome::Failed);
//! # Ok(())
//! # }
//! ```

mod archive;
mod error;
mod fetch;
mod filename;
mod retry;
mod staging;
mod unwrap;

pub use error::DownloadError;
pub use fetch::{FetchOutcome, ItemFetcher};
pub use filename::{EXTRACT_SUFFIX, PARTIAL_SUFFIX};
pub use retry::{DEFAULT_MAX_RETRIES, RetryDecision, RetryPolicy};
pub use unwrap::{CONTAINER_EXTENSION, is_container, unwrap_container};
