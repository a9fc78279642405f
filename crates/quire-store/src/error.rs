use std::path::PathBuf;

use quire_types::PublicationId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("content is {size} bytes, limit is {max}")]
    ContentTooLarge { size: usize, max: usize },

    #[error("filename {filename:?} already belongs to publication {owner}")]
    FilenameTaken {
        filename: String,
        owner: PublicationId,
    },

    #[error("index error: {0}")]
    Index(#[from] quire_index::IndexError),

    #[error("asset error: {0}")]
    Assets(#[from] quire_assets::AssetError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("index lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Whether the error is the caller's fault rather than a storage failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::ContentTooLarge { .. } | Self::FilenameTaken { .. }
        )
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
