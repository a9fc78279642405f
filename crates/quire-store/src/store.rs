use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use quire_assets::{sanitize_name, AssetError, AssetStore, FsAssetStore, StoredImage};
use quire_index::{LoadStatus, MetadataIndex};
use quire_types::{ImageUpload, MediaType, PublicationId, PublicationRecord};
use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::integrity::{self, IntegrityReport};
use crate::publish::{PublishOutcome, PublishRequest, RejectionReason, SaveOutcome};
use crate::recovery::{self, RecoveryReport};

/// File name of the durable index inside the data directory.
pub const INDEX_FILE: &str = "index.json";

/// Directory holding publication trees inside the data directory.
pub const PUBLICATIONS_DIR: &str = "publications";

/// What happened to the index when the store was opened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OpenStatus {
    Loaded { publications: usize },
    Initialized,
    Recovered(RecoveryReport),
}

/// Durable record-keeping for publications.
///
/// Composes the [`MetadataIndex`] (the single source of truth for
/// existence) with an [`AssetStore`] (content and image bytes). All index
/// mutations run under one mutex, held for the whole file sequence of a
/// save or delete so that two writers never interleave.
pub struct PublicationStore {
    config: StoreConfig,
    index: Mutex<MetadataIndex>,
    assets: Box<dyn AssetStore>,
    status: OpenStatus,
}

impl std::fmt::Debug for PublicationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicationStore")
            .field("config", &self.config)
            .field("status", &self.status)
            .finish()
    }
}

impl PublicationStore {
    /// Open (or initialize) a store rooted at `data_dir`.
    ///
    /// Layout: `<data_dir>/index.json` and `<data_dir>/publications/`.
    pub fn open(data_dir: impl AsRef<Path>, config: StoreConfig) -> StoreResult<Self> {
        let data_dir = data_dir.as_ref();
        let assets = FsAssetStore::open(data_dir.join(PUBLICATIONS_DIR))?;
        Self::with_assets(data_dir.join(INDEX_FILE), Box::new(assets), config)
    }

    /// Open a store with an explicit index path and asset backend.
    ///
    /// An unreadable index is moved aside and rebuilt from the assets.
    pub fn with_assets(
        index_path: impl Into<PathBuf>,
        assets: Box<dyn AssetStore>,
        config: StoreConfig,
    ) -> StoreResult<Self> {
        let (mut index, load) = MetadataIndex::load(index_path)?;

        let status = match load {
            LoadStatus::Loaded { publications } => OpenStatus::Loaded { publications },
            LoadStatus::Initialized => OpenStatus::Initialized,
            LoadStatus::Corrupt { reason } => {
                warn!(reason = %reason, "index unreadable; starting recovery");
                OpenStatus::Recovered(recovery::recover(&mut index, assets.as_ref(), reason)?)
            }
        };

        info!(publications = index.len(), "publication store ready");
        Ok(Self {
            config,
            index: Mutex::new(index),
            assets,
            status,
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// How the index was obtained when the store was opened.
    pub fn open_status(&self) -> &OpenStatus {
        &self.status
    }

    fn index(&self) -> StoreResult<MutexGuard<'_, MetadataIndex>> {
        self.index.lock().map_err(|_| StoreError::LockPoisoned)
    }

    // ---- Lookups ----

    pub fn lookup_by_id(&self, id: &PublicationId) -> StoreResult<Option<PublicationRecord>> {
        Ok(self.index()?.get(id).cloned())
    }

    pub fn lookup_by_filename(&self, filename: &str) -> StoreResult<Option<PublicationRecord>> {
        Ok(self.index()?.get_by_filename(filename).cloned())
    }

    /// All publications, most recently updated first.
    pub fn list(&self) -> StoreResult<Vec<PublicationRecord>> {
        let mut records: Vec<_> = self.index()?.records().cloned().collect();
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(records)
    }

    /// Mint an identifier not used by any indexed or on-disk publication.
    pub fn allocate_id(&self) -> StoreResult<PublicationId> {
        let index = self.index()?;
        self.allocate_id_locked(&index)
    }

    fn allocate_id_locked(&self, index: &MetadataIndex) -> StoreResult<PublicationId> {
        loop {
            let id = PublicationId::generate();
            if !index.contains(&id) && !self.assets.has_content(&id)? {
                return Ok(id);
            }
            warn!(id = %id, "identifier collision; drawing again");
        }
    }

    // ---- Content access ----

    /// Markdown for an indexed publication.
    ///
    /// Returns `Ok(None)` when the identifier is not in the index, even if
    /// stray files exist for it.
    pub fn read_content(&self, id: &PublicationId) -> StoreResult<Option<String>> {
        if !self.index()?.contains(id) {
            return Ok(None);
        }
        Ok(self.assets.read_content(id)?)
    }

    /// An image retained by an indexed publication.
    ///
    /// The name is sanitized exactly as on write; names the record does not
    /// retain resolve to `Ok(None)`.
    pub fn read_image(&self, id: &PublicationId, name: &str) -> StoreResult<Option<StoredImage>> {
        let clean = match sanitize_name(name) {
            Ok(clean) => clean,
            Err(_) => return Ok(None),
        };
        let retained = self
            .index()?
            .get(id)
            .map(|r| r.has_image(&clean))
            .unwrap_or(false);
        if !retained {
            return Ok(None);
        }
        Ok(self.assets.read_image(id, &clean)?)
    }

    // ---- Mutations ----

    /// Publish by producer filename: replace the publication already bound
    /// to the filename, or create a new one under a fresh identifier.
    pub fn publish(&self, request: PublishRequest) -> StoreResult<PublishOutcome> {
        let mut index = self.index()?;
        let now = Utc::now();

        let existing = index.get_by_filename(&request.filename).cloned();
        let created = existing.is_none();
        let mut record = match existing {
            Some(record) => record,
            None => PublicationRecord::new(self.allocate_id_locked(&index)?, &request.filename, now),
        };

        record.title = request.title;
        record.origin_path = request.origin_path;
        record.password_hash = request.password.apply(record.password_hash.take());

        let id = record.id;
        let save = self.save_locked(&mut index, &request.content, record, request.images)?;
        info!(id = %id, created, images = save.accepted, "published");
        Ok(PublishOutcome { id, created, save })
    }

    /// Write content and images for `id` and record them in the index.
    ///
    /// Invalid images are skipped and reported in the outcome; they never
    /// fail the save. Images retained before but not in this save are
    /// deleted from disk, as are stray image files the index never knew.
    pub fn create_or_replace(
        &self,
        id: &PublicationId,
        content: &str,
        record: PublicationRecord,
        images: Vec<ImageUpload>,
    ) -> StoreResult<SaveOutcome> {
        if record.id != *id {
            return Err(StoreError::Validation(format!(
                "record id {} does not match {id}",
                record.id
            )));
        }
        let mut index = self.index()?;
        self.save_locked(&mut index, content, record, images)
    }

    fn save_locked(
        &self,
        index: &mut MetadataIndex,
        content: &str,
        mut record: PublicationRecord,
        images: Vec<ImageUpload>,
    ) -> StoreResult<SaveOutcome> {
        let id = record.id;

        if record.filename.trim().is_empty() {
            return Err(StoreError::Validation("filename must not be empty".into()));
        }
        if content.len() > self.config.max_content_bytes {
            return Err(StoreError::ContentTooLarge {
                size: content.len(),
                max: self.config.max_content_bytes,
            });
        }
        if let Some(owner) = index.id_for_filename(&record.filename) {
            if owner != id {
                return Err(StoreError::FilenameTaken {
                    filename: record.filename,
                    owner,
                });
            }
        }

        let previous = index.get(&id).cloned();

        self.assets.ensure_layout(&id)?;
        self.assets.write_content(&id, content)?;

        let mut outcome = SaveOutcome::default();
        for upload in images {
            self.store_image(&id, upload, &mut outcome)?;
        }

        // Anything on disk or previously retained that this save does not
        // keep is an orphan.
        let keep: BTreeSet<&str> = outcome.images.iter().map(String::as_str).collect();
        let mut stale: BTreeSet<String> = self.assets.list_images(&id)?.into_iter().collect();
        if let Some(prev) = &previous {
            stale.extend(prev.images.iter().cloned());
        }
        for name in stale.into_iter().filter(|n| !keep.contains(n.as_str())) {
            if self.assets.delete_image(&id, &name)? {
                outcome.removed.push(name);
            }
        }

        record.images = outcome.images.clone();
        record.updated_at = Utc::now();
        if let Some(prev) = &previous {
            record.created_at = prev.created_at;
        }
        index.upsert(record)?;

        debug!(
            id = %id,
            accepted = outcome.accepted,
            rejected = outcome.rejections.len(),
            removed = outcome.removed.len(),
            "saved publication"
        );
        Ok(outcome)
    }

    fn store_image(
        &self,
        id: &PublicationId,
        upload: ImageUpload,
        outcome: &mut SaveOutcome,
    ) -> StoreResult<()> {
        let ImageUpload {
            filename,
            media_type,
            data,
        } = upload;

        let declared = match MediaType::from_mime(&media_type) {
            Some(m) if self.config.allows(m) => m,
            _ => {
                warn!(id = %id, image = %filename, media_type = %media_type, "rejected image: media type");
                outcome.reject(filename, RejectionReason::DisallowedMediaType { declared: media_type });
                return Ok(());
            }
        };

        if data.len() > self.config.max_image_bytes {
            warn!(id = %id, image = %filename, size = data.len(), "rejected image: too large");
            outcome.reject(
                filename,
                RejectionReason::TooLarge {
                    size: data.len(),
                    max: self.config.max_image_bytes,
                },
            );
            return Ok(());
        }

        let clean = match sanitize_name(&filename) {
            Ok(clean) => clean,
            Err(_) => {
                warn!(id = %id, image = %filename, "rejected image: invalid name");
                outcome.reject(filename, RejectionReason::InvalidName);
                return Ok(());
            }
        };

        // Images are served with the type their stored name implies, so the
        // name must agree with what was declared and allowed.
        if MediaType::from_filename(&clean) != Some(declared) {
            warn!(id = %id, image = %filename, media_type = %media_type, "rejected image: extension mismatch");
            outcome.reject(filename, RejectionReason::ExtensionMismatch { declared: media_type });
            return Ok(());
        }

        let replaces_earlier = outcome.images.contains(&clean);
        if !replaces_earlier && outcome.images.len() >= self.config.max_images {
            warn!(id = %id, image = %filename, "rejected image: too many");
            outcome.reject(
                filename,
                RejectionReason::TooMany {
                    max: self.config.max_images,
                },
            );
            return Ok(());
        }

        match self.assets.write_image(id, &clean, &data) {
            Ok(_) => {}
            Err(AssetError::InvalidName { .. }) => {
                outcome.reject(filename, RejectionReason::InvalidName);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }

        if !replaces_earlier {
            outcome.images.push(clean);
        }
        outcome.accepted = outcome.images.len();
        Ok(())
    }

    /// Delete a publication and everything stored for it.
    ///
    /// Returns `false`, touching nothing, if the identifier is unknown.
    pub fn delete(&self, id: &PublicationId) -> StoreResult<bool> {
        let mut index = self.index()?;
        if !index.contains(id) {
            return Ok(false);
        }

        self.assets.delete_publication_tree(id)?;
        index.remove(id)?;
        info!(id = %id, "deleted publication");
        Ok(true)
    }

    /// Compare every record with the files on disk.
    pub fn check_integrity(&self) -> StoreResult<IntegrityReport> {
        let index = self.index()?;
        integrity::check(&index, self.assets.as_ref())
    }
}
