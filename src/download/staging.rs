//! Sidecar files that are removed unless explicitly moved into place.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::DownloadError;

/// A temporary sibling of a final artifact.
///
/// Dropping the guard deletes the file; [`Staged::persist`] renames it to
/// its destination instead. Every exit path of a fetch therefore leaves no
/// sidecar behind.
#[derive(Debug)]
pub(crate) struct Staged {
    path: PathBuf,
    armed: bool,
}

impl Staged {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Moves the staged file to `dest`, replacing any stale file there.
    pub(crate) fn persist(mut self, dest: &Path) -> Result<(), DownloadError> {
        replace_file(&self.path, dest)?;
        self.armed = false;
        Ok(())
    }
}

impl Drop for Staged {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed staging file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove staging file"),
        }
    }
}

/// Renames `from` onto `to`, removing an existing `to` first.
pub(crate) fn replace_file(from: &Path, to: &Path) -> Result<(), DownloadError> {
    match std::fs::remove_file(to) {
        Ok(()) => debug!(path = %to.display(), "removed stale file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(DownloadError::io(to, e)),
    }
    std::fs::rename(from, to).map_err(|e| DownloadError::io(to, e))
}
