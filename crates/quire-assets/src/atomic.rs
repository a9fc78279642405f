//! Write-then-rename file replacement.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{AssetError, AssetResult};

/// Atomically replace `dest` with `data`.
///
/// The bytes are staged in a temporary file in the same directory as
/// `dest`, flushed to disk, then renamed over the destination. Readers see
/// either the old file or the new one, never a partial write. If anything
/// fails before the rename, the temporary file is removed and `dest` is
/// untouched.
pub fn write_atomic(dest: &Path, data: &[u8]) -> AssetResult<()> {
    let dir = dest
        .parent()
        .ok_or_else(|| AssetError::io(dest, std::io::ErrorKind::InvalidInput.into()))?;

    let mut staged = NamedTempFile::new_in(dir).map_err(|e| AssetError::io(dir, e))?;
    staged
        .write_all(data)
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|e| AssetError::io(staged.path(), e))?;

    staged.persist(dest).map_err(|e| AssetError::Persist {
        path: dest.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Remove a file, treating "already absent" as success.
///
/// Returns `true` if a file was removed.
pub fn remove_if_exists(path: &Path) -> AssetResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(AssetError::io(path, e)),
    }
}

/// Recursively remove a directory, treating "already absent" as success.
pub fn remove_dir_if_exists(path: &Path) -> AssetResult<bool> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(AssetError::io(path, e)),
    }
}
