//! GoPro cloud sync library
//!
//! This library mirrors a user's GoPro cloud media library into a local
//! folder. It validates an auth token, enumerates the remote catalog page by
//! page, and downloads each item, falling back from a direct source link to
//! the archive-wrapped delivery endpoint.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`api`] - Remote catalog client: token validation and catalog listing
//! - [`credential`] - Opaque bearer token and its providers (flag, env, keyring)
//! - [`download`] - Per-item fetch strategy, retry, archive extraction and `.360` unwrap
//! - [`sync`] - Sequential sync orchestration with progress and cancellation

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod credential;
pub mod download;
pub mod sync;
mod user_agent;

// Re-export commonly used types
pub use api::{ApiError, ClientConfig, CloudClient, MediaItem, PageLimit, Variation};
pub use credential::Credential;
pub use download::{
    DEFAULT_MAX_RETRIES, DownloadError, FetchOutcome, ItemFetcher, RetryDecision, RetryPolicy,
};
pub use sync::{
    CancelFlag, ProgressSender, SyncEngine, SyncError, SyncOptions, SyncProgress, SyncResult,
};
