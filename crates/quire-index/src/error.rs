//! Error types for the index crate.

use std::path::PathBuf;

use quire_types::PublicationId;

/// Errors that can occur during index operations.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// The filename is already bound to a different publication.
    #[error("filename {filename:?} already belongs to publication {owner}")]
    FilenameTaken {
        filename: String,
        owner: PublicationId,
    },

    /// The index document violates referential integrity.
    #[error("index integrity violation: {0}")]
    Integrity(String),

    /// The index document uses a format version this build cannot read.
    #[error("unsupported index version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// Serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error reading or staging the index file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The staged index could not be renamed over the durable file.
    #[error("atomic replace of {path} failed: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IndexError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
