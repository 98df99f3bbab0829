//! Writing manifests to disk
//!
//! The destination is only touched when the serialized bytes differ from
//! what is already there, so incremental builds see an unchanged timestamp.

use crate::manifest::PackageManifest;
use crate::{PackageError, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// What happened to the destination file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// New content was written
    Written,
    /// Existing content was identical; nothing was written
    Unchanged,
}

/// Serialize the manifest and write it unless the file already matches
pub fn write_if_changed(manifest: &PackageManifest, path: &Path) -> Result<WriteOutcome> {
    write_bytes_if_changed(manifest.to_xml().as_bytes(), path)
}

/// Write `content` to `path` unless the file already holds exactly these bytes
pub fn write_bytes_if_changed(content: &[u8], path: &Path) -> Result<WriteOutcome> {
    if path.is_file() {
        let existing = std::fs::read(path).map_err(|e| PackageError::io(path, e))?;
        if existing == content {
            info!(path = %path.display(), "Skipping manifest generation because contents are identical");
            return Ok(WriteOutcome::Unchanged);
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| PackageError::io(parent, e))?;
    }

    // Write a sibling temp file, then rename over the destination. The temp
    // file is removed when dropped, so a failed write leaves nothing behind.
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(|e| PackageError::io(dir, e))?;
    temp.write_all(content)
        .and_then(|_| temp.flush())
        .map_err(|e| PackageError::io(temp.path(), e))?;
    temp.persist(path).map_err(|e| PackageError::io(path, e.error))?;

    debug!(path = %path.display(), bytes = content.len(), "Wrote manifest");
    Ok(WriteOutcome::Written)
}
