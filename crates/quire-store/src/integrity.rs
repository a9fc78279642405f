//! Cross-checks between the metadata index and the asset tree.

use std::collections::BTreeSet;

use quire_assets::AssetStore;
use quire_index::MetadataIndex;
use quire_types::PublicationId;
use serde::Serialize;

use crate::error::StoreResult;

/// One disagreement between the index and the files on disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityIssue {
    /// The record lists an image that is not on disk.
    MissingImage { id: PublicationId, name: String },
    /// An image file on disk is not listed by its record.
    OrphanedImage { id: PublicationId, name: String },
    /// The record has no content blob.
    MissingContent { id: PublicationId },
    /// A publication directory exists that the index does not know.
    UnindexedDirectory { id: PublicationId },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    /// Publications examined.
    pub checked: usize,
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

pub(crate) fn check(index: &MetadataIndex, assets: &dyn AssetStore) -> StoreResult<IntegrityReport> {
    let mut report = IntegrityReport::default();

    for record in index.records() {
        report.checked += 1;
        let id = record.id;

        if !assets.has_content(&id)? {
            report.issues.push(IntegrityIssue::MissingContent { id });
        }

        let on_disk: BTreeSet<String> = assets.list_images(&id)?.into_iter().collect();
        let listed: BTreeSet<String> = record.images.iter().cloned().collect();

        for name in listed.difference(&on_disk) {
            report.issues.push(IntegrityIssue::MissingImage {
                id,
                name: name.clone(),
            });
        }
        for name in on_disk.difference(&listed) {
            report.issues.push(IntegrityIssue::OrphanedImage {
                id,
                name: name.clone(),
            });
        }
    }

    for id in assets.list_publications()? {
        if !index.contains(&id) {
            report.issues.push(IntegrityIssue::UnindexedDirectory { id });
        }
    }

    Ok(report)
}
