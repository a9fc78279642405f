//! Publication store for Quire.
//!
//! Binds the metadata index and the asset tree into one API: publish,
//! replace and delete publications, read their content and images, and
//! rebuild the index from disk when it cannot be read.

pub mod config;
pub mod error;
pub mod integrity;
pub mod publish;
pub mod recovery;
pub mod store;

pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use integrity::{IntegrityIssue, IntegrityReport};
pub use publish::{
    ImageRejection, PasswordChange, PublishOutcome, PublishRequest, RejectionReason, SaveOutcome,
};
pub use recovery::RecoveryReport;
pub use store::{OpenStatus, PublicationStore, INDEX_FILE, PUBLICATIONS_DIR};

pub use quire_assets::StoredImage;
pub use quire_types::{ImageUpload, MediaType, PublicationId, PublicationRecord};
