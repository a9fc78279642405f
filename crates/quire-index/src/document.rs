//! The serialized form of the metadata index.

use std::collections::BTreeMap;

use quire_types::{PublicationId, PublicationRecord};
use serde::{Deserialize, Serialize};

use crate::error::{IndexError, IndexResult};

/// Current on-disk format version.
pub const INDEX_FORMAT_VERSION: u32 = 1;

/// Both index mappings, held and written as one unit.
///
/// Invariants (checked by [`IndexDocument::validate`]):
/// - every record is keyed by its own identifier
/// - every filename entry points at a present record whose filename is
///   that key
/// - every record is reachable from exactly its own filename entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDocument {
    pub version: u32,
    #[serde(default)]
    pub publications: BTreeMap<PublicationId, PublicationRecord>,
    #[serde(default)]
    pub filenames: BTreeMap<String, PublicationId>,
}

impl Default for IndexDocument {
    fn default() -> Self {
        Self {
            version: INDEX_FORMAT_VERSION,
            publications: BTreeMap::new(),
            filenames: BTreeMap::new(),
        }
    }
}

impl IndexDocument {
    /// Build a document from records, deriving the filename mapping.
    ///
    /// Fails if two records share a filename.
    pub fn from_records(records: impl IntoIterator<Item = PublicationRecord>) -> IndexResult<Self> {
        let mut doc = Self::default();
        for record in records {
            if let Some(owner) = doc.filenames.get(&record.filename) {
                return Err(IndexError::FilenameTaken {
                    filename: record.filename.clone(),
                    owner: *owner,
                });
            }
            doc.filenames.insert(record.filename.clone(), record.id);
            doc.publications.insert(record.id, record);
        }
        Ok(doc)
    }

    /// Check the format version and referential integrity.
    pub fn validate(&self) -> IndexResult<()> {
        if self.version != INDEX_FORMAT_VERSION {
            return Err(IndexError::UnsupportedVersion {
                found: self.version,
                expected: INDEX_FORMAT_VERSION,
            });
        }

        for (id, record) in &self.publications {
            if record.id != *id {
                return Err(IndexError::Integrity(format!(
                    "record keyed {id} carries id {}",
                    record.id
                )));
            }
            if self.filenames.get(&record.filename) != Some(id) {
                return Err(IndexError::Integrity(format!(
                    "record {id} filename {:?} does not resolve back to it",
                    record.filename
                )));
            }
        }

        for (filename, id) in &self.filenames {
            match self.publications.get(id) {
                None => {
                    return Err(IndexError::Integrity(format!(
                        "filename {filename:?} points at missing record {id}"
                    )))
                }
                Some(record) if record.filename != *filename => {
                    return Err(IndexError::Integrity(format!(
                        "filename {filename:?} points at record {id} named {:?}",
                        record.filename
                    )))
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(n: u8, filename: &str) -> PublicationRecord {
        PublicationRecord::new(PublicationId::from_bytes([n; 16]), filename, Utc::now())
    }

    #[test]
    fn empty_document_is_valid() {
        IndexDocument::default().validate().unwrap();
    }

    #[test]
    fn from_records_builds_both_mappings() {
        let doc = IndexDocument::from_records([record(1, "a.md"), record(2, "b.md")]).unwrap();
        doc.validate().unwrap();
        assert_eq!(doc.filenames["a.md"], PublicationId::from_bytes([1; 16]));
        assert_eq!(doc.publications.len(), 2);
    }

    #[test]
    fn from_records_rejects_shared_filename() {
        let result = IndexDocument::from_records([record(1, "a.md"), record(2, "a.md")]);
        assert!(matches!(result, Err(IndexError::FilenameTaken { .. })));
    }

    #[test]
    fn dangling_filename_is_an_integrity_violation() {
        let mut doc = IndexDocument::from_records([record(1, "a.md")]).unwrap();
        doc.filenames
            .insert("ghost.md".into(), PublicationId::from_bytes([9; 16]));
        assert!(matches!(doc.validate(), Err(IndexError::Integrity(_))));
    }

    #[test]
    fn unreachable_record_is_an_integrity_violation() {
        let mut doc = IndexDocument::from_records([record(1, "a.md")]).unwrap();
        doc.filenames.clear();
        assert!(matches!(doc.validate(), Err(IndexError::Integrity(_))));
    }

    #[test]
    fn wrong_version_is_rejected() {
        let doc = IndexDocument {
            version: 99,
            ..Default::default()
        };
        assert!(matches!(
            doc.validate(),
            Err(IndexError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn json_shape_uses_hex_keys() {
        let doc = IndexDocument::from_records([record(0xab, "a.md")]).unwrap();
        let value = serde_json::to_value(&doc).unwrap();
        let key = "ab".repeat(16);
        assert_eq!(value["version"], 1);
        assert_eq!(value["filenames"]["a.md"], key.as_str());
        assert_eq!(value["publications"][key.as_str()]["filename"], "a.md");

        let back: IndexDocument = serde_json::from_value(value).unwrap();
        assert_eq!(back, doc);
    }
}
