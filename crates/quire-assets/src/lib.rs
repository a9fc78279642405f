//! Asset filesystem layer for Quire.
//!
//! Owns the on-disk layout of every publication: one markdown content blob
//! and a directory of images, all addressed by the publication's
//! identifier.
//!
//! # Storage Backends
//!
//! All backends implement the [`AssetStore`] trait:
//!
//! - [`FsAssetStore`] -- directory-per-publication store on the local filesystem
//!
//! # Design Rules
//!
//! 1. Paths derive only from the identifier and a sanitized image name.
//! 2. Every file write is staged in a sibling temporary file, then renamed.
//! 3. Deletes tolerate "already absent".
//! 4. The store never interprets content -- markdown is opaque text.
//! 5. All I/O errors other than "not found" are propagated.

pub mod atomic;
pub mod error;
pub mod fs;
pub mod names;
pub mod traits;

pub use atomic::write_atomic;
pub use error::{AssetError, AssetResult};
pub use fs::{FsAssetStore, CONTENT_FILE, IMAGES_DIR};
pub use names::{sanitize_name, MAX_NAME_LEN};
pub use traits::{AssetStore, StoredImage};
