use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id::PublicationId;

/// Metadata describing one publication.
///
/// The record is the unit the metadata index stores. Content and image
/// bytes live on disk; the record only names them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationRecord {
    /// Public identifier; also the publication's directory name.
    pub id: PublicationId,
    /// Producer-supplied filename. Unique across live publications.
    pub filename: String,
    /// Display title, if the producer supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Opaque path the document originated from on the producer's side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_path: Option<String>,
    /// PHC-format password hash. `None` means the publication is public.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Sanitized image filenames retained for this publication, in
    /// submission order.
    #[serde(default)]
    pub images: Vec<String>,
}

impl PublicationRecord {
    /// A fresh record with no title, password, or images.
    pub fn new(id: PublicationId, filename: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            filename: filename.into(),
            title: None,
            origin_path: None,
            password_hash: None,
            created_at: now,
            updated_at: now,
            images: Vec::new(),
        }
    }

    /// The minimal record synthesized for a publication found on disk
    /// without index metadata: the filename falls back to the identifier.
    pub fn recovered(id: PublicationId, now: DateTime<Utc>) -> Self {
        Self::new(id, id.to_hex(), now)
    }

    /// Whether reading this publication requires a password.
    pub fn is_protected(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Whether `name` is one of the retained images.
    pub fn has_image(&self, name: &str) -> bool {
        self.images.iter().any(|i| i == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovered_record_uses_id_as_filename() {
        let id = PublicationId::from_bytes([7; 16]);
        let now = Utc::now();
        let rec = PublicationRecord::recovered(id, now);
        assert_eq!(rec.filename, id.to_hex());
        assert!(rec.title.is_none());
        assert!(!rec.is_protected());
        assert!(rec.images.is_empty());
        assert_eq!(rec.created_at, now);
    }

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let rec = PublicationRecord::new(PublicationId::from_bytes([1; 16]), "notes.md", Utc::now());
        let json = serde_json::to_value(&rec).unwrap();
        assert!(json.get("title").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["filename"], "notes.md");
    }

    #[test]
    fn missing_images_field_defaults_to_empty() {
        let id = PublicationId::from_bytes([2; 16]);
        let json = format!(
            r#"{{"id":"{id}","filename":"a.md","created_at":"2024-01-01T00:00:00Z","updated_at":"2024-01-01T00:00:00Z"}}"#
        );
        let rec: PublicationRecord = serde_json::from_str(&json).unwrap();
        assert!(rec.images.is_empty());
        assert!(!rec.has_image("x.png"));
    }
}
