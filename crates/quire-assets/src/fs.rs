//! Filesystem-backed [`AssetStore`].
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/<id>/content.md
//! <root>/<id>/images/<sanitized-name>
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use quire_types::{mime_for_filename, PublicationId};
use tracing::debug;
use walkdir::WalkDir;

use crate::atomic::{remove_dir_if_exists, remove_if_exists, write_atomic};
use crate::error::{AssetError, AssetResult};
use crate::names::sanitize_name;
use crate::traits::{AssetStore, StoredImage};

/// File name of the content blob inside a publication directory.
pub const CONTENT_FILE: &str = "content.md";

/// Name of the image subdirectory inside a publication directory.
pub const IMAGES_DIR: &str = "images";

/// Asset store rooted at a directory on the local filesystem.
#[derive(Clone, Debug)]
pub struct FsAssetStore {
    root: PathBuf,
}

impl FsAssetStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> AssetResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| AssetError::io(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding everything for one publication.
    pub fn publication_dir(&self, id: &PublicationId) -> PathBuf {
        self.root.join(id.to_hex())
    }

    fn content_path(&self, id: &PublicationId) -> PathBuf {
        self.publication_dir(id).join(CONTENT_FILE)
    }

    fn images_dir(&self, id: &PublicationId) -> PathBuf {
        self.publication_dir(id).join(IMAGES_DIR)
    }

    fn image_path(&self, id: &PublicationId, name: &str) -> AssetResult<(String, PathBuf)> {
        let clean = sanitize_name(name)?;
        let path = self.images_dir(id).join(&clean);
        Ok((clean, path))
    }
}

fn read_optional(path: &Path) -> AssetResult<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AssetError::io(path, e)),
    }
}

impl AssetStore for FsAssetStore {
    fn ensure_layout(&self, id: &PublicationId) -> AssetResult<()> {
        let images = self.images_dir(id);
        fs::create_dir_all(&images).map_err(|e| AssetError::io(&images, e))
    }

    fn write_content(&self, id: &PublicationId, text: &str) -> AssetResult<()> {
        let path = self.content_path(id);
        write_atomic(&path, text.as_bytes())?;
        debug!(id = %id, bytes = text.len(), "wrote content");
        Ok(())
    }

    fn read_content(&self, id: &PublicationId) -> AssetResult<Option<String>> {
        match read_optional(&self.content_path(id))? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| AssetError::InvalidContent { id: *id }),
            None => Ok(None),
        }
    }

    fn has_content(&self, id: &PublicationId) -> AssetResult<bool> {
        let path = self.content_path(id);
        match fs::metadata(&path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AssetError::io(&path, e)),
        }
    }

    fn write_image(&self, id: &PublicationId, name: &str, data: &[u8]) -> AssetResult<String> {
        let (clean, path) = self.image_path(id, name)?;
        write_atomic(&path, data)?;
        debug!(id = %id, image = %clean, bytes = data.len(), "wrote image");
        Ok(clean)
    }

    fn read_image(&self, id: &PublicationId, name: &str) -> AssetResult<Option<StoredImage>> {
        let (clean, path) = self.image_path(id, name)?;
        Ok(read_optional(&path)?.map(|data| StoredImage {
            data: Bytes::from(data),
            media_type: mime_for_filename(&clean),
        }))
    }

    fn delete_image(&self, id: &PublicationId, name: &str) -> AssetResult<bool> {
        let (clean, path) = self.image_path(id, name)?;
        let removed = remove_if_exists(&path)?;
        if removed {
            debug!(id = %id, image = %clean, "deleted image");
        }
        Ok(removed)
    }

    fn list_images(&self, id: &PublicationId) -> AssetResult<Vec<String>> {
        let dir = self.images_dir(id);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AssetError::io(&dir, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| AssetError::io(&dir, e))?;
            let is_file = entry
                .file_type()
                .map_err(|e| AssetError::io(entry.path(), e))?
                .is_file();
            let name = entry.file_name().to_string_lossy().into_owned();
            // Sanitized names never start with '.', staging files always do.
            if is_file && !name.starts_with('.') {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn delete_publication_tree(&self, id: &PublicationId) -> AssetResult<bool> {
        let removed = remove_dir_if_exists(&self.publication_dir(id))?;
        debug!(id = %id, removed, "deleted publication tree");
        Ok(removed)
    }

    fn list_publications(&self) -> AssetResult<Vec<PublicationId>> {
        let mut ids = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry.map_err(|e| {
                let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| self.root.clone());
                AssetError::io(path, e.into())
            })?;
            if !entry.file_type().is_dir() {
                continue;
            }
            match entry.file_name().to_str().map(PublicationId::parse) {
                Some(Ok(id)) => ids.push(id),
                _ => debug!(path = %entry.path().display(), "skipping non-publication directory"),
            }
        }
        ids.sort();
        Ok(ids)
    }
}
