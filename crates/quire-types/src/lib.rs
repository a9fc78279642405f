//! Foundation types for Quire.
//!
//! Quire publishes markdown documents (with embedded images) under stable,
//! unguessable identifiers. This crate holds the vocabulary every other
//! Quire crate shares.
//!
//! # Key Types
//!
//! - [`PublicationId`]: Random 128-bit public identifier, hex encoded
//! - [`PublicationRecord`]: Metadata for one publication
//! - [`MediaType`]: Image media types Quire can label
//! - [`ImageUpload`]: An image submitted with a document, not yet validated

pub mod error;
pub mod id;
pub mod media;
pub mod record;

pub use error::TypeError;
pub use id::{PublicationId, ID_BYTES, ID_HEX_LEN};
pub use media::{mime_for_filename, ImageUpload, MediaType, OCTET_STREAM};
pub use record::PublicationRecord;
