//! Metadata index for Quire.
//!
//! Maps publication identifiers to their records and producer filenames to
//! identifiers. The index is the single source of truth for whether a
//! publication exists; it is held in memory and rewritten wholesale to one
//! JSON file on every mutation.
//!
//! # Key Types
//!
//! - [`MetadataIndex`] -- The in-memory index with durable persistence
//! - [`IndexDocument`] -- The serialized form of both mappings
//! - [`LoadStatus`] -- Whether loading found, created, or failed to read the file
//! - [`StagedIndex`] -- A snapshot written to a temp file, awaiting rename

pub mod document;
pub mod error;
pub mod index;

pub use document::{IndexDocument, INDEX_FORMAT_VERSION};
pub use error::{IndexError, IndexResult};
pub use index::{LoadStatus, MetadataIndex, StagedIndex};
