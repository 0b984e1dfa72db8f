//! Unwrap of `.360` spherical captures.
//!
//! MAX cameras upload 360° captures as a zip container with a `.360`
//! extension. After download, the container is renamed to `<name>.zip`, its
//! first media entry is extracted as `<stem>.<entry extension>`, and the
//! intermediate archive is removed. If anything fails after the rename, the
//! archive is renamed back so the original download is left as it was.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use super::DownloadError;
use super::archive::MediaArchive;
use super::filename::{has_extension, with_suffix};
use crate::api::DEFAULT_FILE_EXTENSION;

/// Extension of single-file containers that need unwrapping.
pub const CONTAINER_EXTENSION: &str = "360";

/// Returns true if `filename` is a `.360` container.
#[must_use]
pub fn is_container(filename: &str) -> bool {
    has_extension(filename, CONTAINER_EXTENSION)
}

/// Replaces the container at `path` by its first media entry.
///
/// Returns the path of the extracted media file. Blocking; run it on the
/// blocking pool from async code.
///
/// # Errors
///
/// Returns [`DownloadError::Unwrap`]. `restored` tells whether the container
/// is back under its original name.
#[instrument]
pub fn unwrap_container(path: &Path) -> Result<PathBuf, DownloadError> {
    let archive_path = with_suffix(path, ".zip");

    if let Err(e) = std::fs::rename(path, &archive_path) {
        return Err(DownloadError::Unwrap {
            path: path.to_path_buf(),
            reason: format!("rename to archive failed: {e}"),
            restored: path.exists(),
        });
    }

    match extract_from(&archive_path, path) {
        Ok(output) => {
            if let Err(e) = std::fs::remove_file(&archive_path) {
                warn!(archive = %archive_path.display(), error = %e, "could not remove intermediate archive");
            }
            info!(container = %path.display(), output = %output.display(), "unwrapped container");
            Ok(output)
        }
        Err(e) => {
            let restored = restore(&archive_path, path);
            Err(DownloadError::Unwrap {
                path: path.to_path_buf(),
                reason: e.to_string(),
                restored,
            })
        }
    }
}

fn extract_from(archive_path: &Path, container: &Path) -> Result<PathBuf, DownloadError> {
    let mut archive = MediaArchive::open(archive_path)?;
    let (index, entry_name) = archive.first_media_entry()?;
    let output = output_path(container, &entry_name);
    let bytes = archive.extract_to(index, &output)?;
    debug!(entry = %entry_name, output = %output.display(), bytes, "extracted container entry");
    Ok(output)
}

/// `<dir>/<container stem>.<entry extension>`, defaulting the extension to `mp4`.
fn output_path(container: &Path, entry_name: &str) -> PathBuf {
    let stem = container
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = Path::new(entry_name)
        .extension()
        .map_or_else(|| DEFAULT_FILE_EXTENSION.to_string(), |e| e.to_string_lossy().into_owned());
    container.with_file_name(format!("{stem}.{extension}"))
}

/// Best-effort rename of the archive back to the container name.
fn restore(archive_path: &Path, container: &Path) -> bool {
    match std::fs::rename(archive_path, container) {
        Ok(()) => {
            debug!(container = %container.display(), "restored container after failed unwrap");
            true
        }
        Err(e) => {
            warn!(
                archive = %archive_path.display(),
                container = %container.display(),
                error = %e,
                "could not restore container after failed unwrap"
            );
            false
        }
    }
}
