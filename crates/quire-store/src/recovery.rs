//! Index reconstruction from the asset tree.
//!
//! Runs only when the durable index cannot be read. Every publication
//! directory holding a content blob becomes a minimal record: the filename
//! is the identifier, there is no title and no password, the image list is
//! empty and both timestamps are "now". Titles, passwords and timestamps
//! are lost; every document stays reachable under its identifier.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use quire_assets::AssetStore;
use quire_index::MetadataIndex;
use quire_types::PublicationRecord;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{StoreError, StoreResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RecoveryReport {
    /// Why the index had to be rebuilt.
    pub reason: String,
    /// Records reconstructed.
    pub recovered: usize,
    /// Where the unreadable index file was moved, if it existed.
    pub quarantined: Option<PathBuf>,
}

/// Copy an unreadable index aside so the evidence survives the rebuild.
///
/// The original stays in place until the rebuilt index replaces it, so a
/// failure anywhere before that leaves the next open to try again.
pub(crate) fn quarantine(path: &Path, now: DateTime<Utc>) -> StoreResult<Option<PathBuf>> {
    let mut target = path.as_os_str().to_owned();
    target.push(format!(".corrupt-{}", now.timestamp()));
    let target = PathBuf::from(target);

    match fs::copy(path, &target) {
        Ok(_) => Ok(Some(target)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Synthesize a minimal record for every publication with a content blob.
pub(crate) fn scan(assets: &dyn AssetStore, now: DateTime<Utc>) -> StoreResult<Vec<PublicationRecord>> {
    let mut records = Vec::new();
    for id in assets.list_publications()? {
        if assets.has_content(&id)? {
            records.push(PublicationRecord::recovered(id, now));
        } else {
            warn!(id = %id, "publication directory without content; not recovered");
        }
    }
    Ok(records)
}

/// Rebuild `index` from the asset tree and persist it.
///
/// Order: scan, copy the corrupt file aside, then atomically replace it.
pub(crate) fn recover(
    index: &mut MetadataIndex,
    assets: &dyn AssetStore,
    reason: String,
) -> StoreResult<RecoveryReport> {
    let now = Utc::now();
    let records = scan(assets, now)?;
    let recovered = records.len();

    let quarantined = quarantine(index.path(), now)?;
    index.replace_all(records)?;

    info!(
        recovered,
        quarantined = ?quarantined,
        reason = %reason,
        "rebuilt index from asset tree"
    );
    Ok(RecoveryReport {
        reason,
        recovered,
        quarantined,
    })
}
