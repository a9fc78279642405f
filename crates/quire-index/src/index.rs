//! The durable metadata index.
//!
//! [`MetadataIndex`] holds an [`IndexDocument`] in memory and mirrors it to
//! a single JSON file. Every mutation builds the next document, writes it
//! to a staged temporary file beside the durable one, and renames it into
//! place before the in-memory copy is swapped. A failed write therefore
//! leaves both the file and the in-memory state as they were.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use quire_types::{PublicationId, PublicationRecord};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::document::IndexDocument;
use crate::error::{IndexError, IndexResult};

/// How [`MetadataIndex::load`] found the durable file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadStatus {
    /// The file was read and validated.
    Loaded { publications: usize },
    /// No file existed; an empty index was created and persisted.
    Initialized,
    /// The file exists but could not be read, parsed or validated. The
    /// returned index is empty and has NOT been persisted; the caller is
    /// expected to rebuild it.
    Corrupt { reason: String },
}

/// An index snapshot written to a temporary file but not yet renamed over
/// the durable file.
///
/// Dropping a `StagedIndex` without calling [`StagedIndex::commit`]
/// deletes the temporary file and leaves the durable index untouched.
#[derive(Debug)]
pub struct StagedIndex {
    file: NamedTempFile,
    target: PathBuf,
}

impl StagedIndex {
    /// Path of the staged temporary file.
    pub fn temp_path(&self) -> &Path {
        self.file.path()
    }

    /// Atomically replace the durable index with the staged snapshot.
    pub fn commit(self) -> IndexResult<()> {
        let target = self.target;
        self.file.persist(&target).map_err(|e| IndexError::Persist {
            path: target.clone(),
            source: e.error,
        })?;
        Ok(())
    }
}

/// Identifier → record and filename → identifier mappings, kept durable.
pub struct MetadataIndex {
    path: PathBuf,
    doc: IndexDocument,
}

impl std::fmt::Debug for MetadataIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataIndex")
            .field("path", &self.path)
            .field("publications", &self.doc.publications.len())
            .finish()
    }
}

impl MetadataIndex {
    /// An empty, unpersisted index that will be written to `path`.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            doc: IndexDocument::default(),
        }
    }

    /// Load the index from `path`.
    ///
    /// A missing file is a first run: an empty index is persisted and
    /// returned with [`LoadStatus::Initialized`]. Any other read, parse or
    /// integrity failure yields an empty index with
    /// [`LoadStatus::Corrupt`] instead of an error, so the caller can run
    /// recovery. Only failing to persist the first-run index is an error.
    pub fn load(path: impl Into<PathBuf>) -> IndexResult<(Self, LoadStatus)> {
        let path = path.into();

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let index = Self::empty(path);
                index.persist()?;
                info!(path = %index.path.display(), "initialized empty index");
                return Ok((index, LoadStatus::Initialized));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "index unreadable");
                return Ok((
                    Self::empty(path),
                    LoadStatus::Corrupt {
                        reason: e.to_string(),
                    },
                ));
            }
        };

        let parsed = serde_json::from_slice::<IndexDocument>(&bytes)
            .map_err(IndexError::from)
            .and_then(|doc| doc.validate().map(|()| doc));

        match parsed {
            Ok(doc) => {
                let publications = doc.publications.len();
                debug!(path = %path.display(), publications, "loaded index");
                Ok((Self { path, doc }, LoadStatus::Loaded { publications }))
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "index corrupt");
                Ok((
                    Self::empty(path),
                    LoadStatus::Corrupt {
                        reason: e.to_string(),
                    },
                ))
            }
        }
    }

    /// Path of the durable index file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of publications in the index.
    pub fn len(&self) -> usize {
        self.doc.publications.len()
    }

    /// Returns `true` if the index has no publications.
    pub fn is_empty(&self) -> bool {
        self.doc.publications.is_empty()
    }

    pub fn contains(&self, id: &PublicationId) -> bool {
        self.doc.publications.contains_key(id)
    }

    /// Look up a record by identifier.
    pub fn get(&self, id: &PublicationId) -> Option<&PublicationRecord> {
        self.doc.publications.get(id)
    }

    /// Identifier currently bound to a producer filename.
    pub fn id_for_filename(&self, filename: &str) -> Option<PublicationId> {
        self.doc.filenames.get(filename).copied()
    }

    /// Look up a record by producer filename.
    pub fn get_by_filename(&self, filename: &str) -> Option<&PublicationRecord> {
        self.id_for_filename(filename)
            .and_then(|id| self.doc.publications.get(&id))
    }

    /// All records, ordered by identifier.
    pub fn records(&self) -> impl Iterator<Item = &PublicationRecord> {
        self.doc.publications.values()
    }

    /// Check the in-memory document's referential integrity.
    pub fn validate(&self) -> IndexResult<()> {
        self.doc.validate()
    }

    // ---------------------------------------------------------------
    // Mutations (each one is durable before it returns Ok)
    // ---------------------------------------------------------------

    /// Insert or replace a record and point its filename at it.
    ///
    /// If the record previously had a different filename, that filename's
    /// entry is removed in the same write. Fails with
    /// [`IndexError::FilenameTaken`] if the filename belongs to another
    /// publication. Returns the previous version of the record.
    pub fn upsert(&mut self, record: PublicationRecord) -> IndexResult<Option<PublicationRecord>> {
        if let Some(owner) = self.id_for_filename(&record.filename) {
            if owner != record.id {
                return Err(IndexError::FilenameTaken {
                    filename: record.filename.clone(),
                    owner,
                });
            }
        }

        let mut next = self.doc.clone();
        let id = record.id;
        let filename = record.filename.clone();
        let previous = next.publications.insert(id, record);

        if let Some(prev) = &previous {
            if prev.filename != filename && next.filenames.get(&prev.filename) == Some(&id) {
                next.filenames.remove(&prev.filename);
                debug!(id = %id, old = %prev.filename, new = %filename, "filename changed");
            }
        }
        next.filenames.insert(filename, id);

        self.commit(next)?;
        Ok(previous)
    }

    /// Remove a record and the filename entry pointing at it.
    ///
    /// Returns `Ok(None)` without writing anything if the identifier is
    /// unknown.
    pub fn remove(&mut self, id: &PublicationId) -> IndexResult<Option<PublicationRecord>> {
        if !self.contains(id) {
            return Ok(None);
        }

        let mut next = self.doc.clone();
        let removed = next.publications.remove(id);
        next.filenames.retain(|_, owner| owner != id);

        self.commit(next)?;
        Ok(removed)
    }

    /// Replace the whole index with `records` (used by recovery).
    pub fn replace_all(
        &mut self,
        records: impl IntoIterator<Item = PublicationRecord>,
    ) -> IndexResult<()> {
        let next = IndexDocument::from_records(records)?;
        self.commit(next)
    }

    // ---------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------

    /// Write the full index to the durable location atomically.
    pub fn persist(&self) -> IndexResult<()> {
        self.stage()?.commit()
    }

    /// Serialize the index into a temporary file next to the durable one,
    /// flushed to disk but not yet renamed into place.
    pub fn stage(&self) -> IndexResult<StagedIndex> {
        Self::stage_document(&self.path, &self.doc)
    }

    fn stage_document(path: &Path, doc: &IndexDocument) -> IndexResult<StagedIndex> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|e| IndexError::io(dir, e))?;

        let bytes = serde_json::to_vec_pretty(doc)?;
        let mut file = NamedTempFile::new_in(dir).map_err(|e| IndexError::io(dir, e))?;
        file.write_all(&bytes)
            .and_then(|()| file.as_file().sync_all())
            .map_err(|e| IndexError::io(file.path(), e))?;

        Ok(StagedIndex {
            file,
            target: path.to_path_buf(),
        })
    }

    fn commit(&mut self, next: IndexDocument) -> IndexResult<()> {
        Self::stage_document(&self.path, &next)?.commit()?;
        self.doc = next;
        Ok(())
    }
}
