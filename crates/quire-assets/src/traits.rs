use bytes::Bytes;
use quire_types::PublicationId;

use crate::error::AssetResult;

/// An image read back from the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredImage {
    pub data: Bytes,
    /// MIME type derived from the stored file name.
    pub media_type: &'static str,
}

/// Per-publication content and image storage.
///
/// All implementations must satisfy these invariants:
/// - Each publication's files live under a location derived only from its
///   identifier.
/// - Image names are sanitized identically on write, read and delete, so a
///   crafted name can never address a file outside the publication.
/// - Every write replaces its target atomically: a reader sees the old
///   bytes or the new bytes, never a mix.
/// - Absence is `Ok(None)` / `Ok(false)`, not an error.
pub trait AssetStore: Send + Sync {
    /// Create the publication's directory and image directory if missing.
    fn ensure_layout(&self, id: &PublicationId) -> AssetResult<()>;

    /// Atomically write the publication's content blob.
    fn write_content(&self, id: &PublicationId, text: &str) -> AssetResult<()>;

    /// Read the content blob. Returns `Ok(None)` if it does not exist.
    fn read_content(&self, id: &PublicationId) -> AssetResult<Option<String>>;

    /// Whether a content blob exists for the publication.
    fn has_content(&self, id: &PublicationId) -> AssetResult<bool>;

    /// Atomically write an image and return the sanitized name it was
    /// stored under.
    fn write_image(&self, id: &PublicationId, name: &str, data: &[u8]) -> AssetResult<String>;

    /// Read an image. Returns `Ok(None)` if it does not exist.
    fn read_image(&self, id: &PublicationId, name: &str) -> AssetResult<Option<StoredImage>>;

    /// Delete an image. Returns `true` if the file existed.
    fn delete_image(&self, id: &PublicationId, name: &str) -> AssetResult<bool>;

    /// Names of the image files currently on disk for the publication,
    /// sorted. Staging files are not included.
    fn list_images(&self, id: &PublicationId) -> AssetResult<Vec<String>>;

    /// Remove everything stored for the publication. Idempotent: returns
    /// `false` if nothing was there.
    fn delete_publication_tree(&self, id: &PublicationId) -> AssetResult<bool>;

    /// Identifiers of every publication directory present, sorted.
    /// Directories whose name is not a valid identifier are skipped.
    fn list_publications(&self) -> AssetResult<Vec<PublicationId>>;
}
