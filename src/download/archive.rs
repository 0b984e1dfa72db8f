//! Single-entry extraction from archive-wrapped deliveries.
//!
//! The archive endpoint wraps one media file in a zip, sometimes next to
//! metadata entries (`__MACOSX/`, dot-files). Only the first plain entry at
//! the archive root is ever extracted. These functions do blocking I/O and
//! are meant to run on the blocking pool.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;
use zip::ZipArchive;

use super::DownloadError;
use super::filename::{EXTRACT_SUFFIX, with_suffix};
use super::staging::Staged;

/// Returns true if a `Content-Type` value announces a zip payload.
pub(crate) fn is_archive_content_type(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .is_some_and(|mime| mime.contains("zip"))
}

/// Returns true for entries that can carry the wrapped media file.
///
/// Directories, names starting with `__` or `.`, and anything below the
/// archive root are rejected.
pub(crate) fn is_media_entry(name: &str, is_dir: bool) -> bool {
    !is_dir
        && !name.is_empty()
        && !name.starts_with("__")
        && !name.starts_with('.')
        && !name.contains('/')
        && !name.contains('\\')
}

/// An opened archive and the index of its first media entry.
pub(crate) struct MediaArchive {
    archive: ZipArchive<File>,
    path: PathBuf,
}

impl MediaArchive {
    /// Opens `path` as a zip archive.
    pub(crate) fn open(path: &Path) -> Result<Self, DownloadError> {
        let file = File::open(path).map_err(|e| DownloadError::io(path, e))?;
        let archive = ZipArchive::new(file).map_err(|e| DownloadError::archive(path, e))?;
        Ok(Self {
            archive,
            path: path.to_path_buf(),
        })
    }

    /// Finds the first media entry in archive order, returning its index and name.
    pub(crate) fn first_media_entry(&mut self) -> Result<(usize, String), DownloadError> {
        for index in 0..self.archive.len() {
            let entry = self
                .archive
                .by_index(index)
                .map_err(|e| DownloadError::archive(&self.path, e))?;
            let name = entry.name().to_string();
            if is_media_entry(&name, entry.is_dir()) {
                debug!(archive = %self.path.display(), entry = %name, "selected archive entry");
                return Ok((index, name));
            }
            debug!(entry = %name, "skipping archive entry");
        }
        Err(DownloadError::EmptyArchive {
            path: self.path.clone(),
        })
    }

    /// Writes entry `index` to `dest` through a sidecar, replacing any stale `dest`.
    ///
    /// Returns the number of bytes written.
    pub(crate) fn extract_to(&mut self, index: usize, dest: &Path) -> Result<u64, DownloadError> {
        let staged = Staged::new(with_suffix(dest, EXTRACT_SUFFIX));
        let mut entry = self
            .archive
            .by_index(index)
            .map_err(|e| DownloadError::archive(&self.path, e))?;

        let out = File::create(staged.path()).map_err(|e| DownloadError::io(staged.path(), e))?;
        let mut writer = BufWriter::new(out);
        let written = io::copy(&mut entry, &mut writer).map_err(|e| {
            // Corrupt deflate streams surface as read errors from the entry.
            if e.kind() == io::ErrorKind::InvalidData {
                DownloadError::archive(&self.path, zip::result::ZipError::Io(e))
            } else {
                DownloadError::io(staged.path(), e)
            }
        })?;
        writer.flush().map_err(|e| DownloadError::io(staged.path(), e))?;
        drop(writer);

        staged.persist(dest)?;
        Ok(written)
    }
}

/// Extracts the first media entry of `archive_path` to `dest`.
///
/// Returns the selected entry name.
pub(crate) fn extract_first_media(archive_path: &Path, dest: &Path) -> Result<String, DownloadError> {
    let mut archive = MediaArchive::open(archive_path)?;
    let (index, name) = archive.first_media_entry()?;
    let bytes = archive.extract_to(index, dest)?;
    debug!(entry = %name, dest = %dest.display(), bytes, "extracted archive entry");
    Ok(name)
}
