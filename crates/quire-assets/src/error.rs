use std::path::PathBuf;

use quire_types::PublicationId;

/// Errors from asset store operations.
///
/// Absence is not an error: reads of missing content or images return
/// `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// The image name is empty after sanitization.
    #[error("invalid asset name: {name:?}")]
    InvalidName { name: String },

    /// A content blob is not valid UTF-8.
    #[error("content for {id} is not valid UTF-8")]
    InvalidContent { id: PublicationId },

    /// I/O error from the underlying filesystem.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The staged temporary file could not be moved into place.
    #[error("atomic replace of {path} failed: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AssetError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for asset operations.
pub type AssetResult<T> = Result<T, AssetError>;
