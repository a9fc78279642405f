use std::fmt;

use quire_types::{ImageUpload, PublicationId};
use serde::Serialize;

/// What a publish does to the stored password hash.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PasswordChange {
    /// Leave the current hash (or its absence) alone.
    #[default]
    Keep,
    /// Replace it with this already-hashed secret.
    Set(String),
    /// Make the publication public.
    Clear,
}

impl PasswordChange {
    pub(crate) fn apply(&self, current: Option<String>) -> Option<String> {
        match self {
            Self::Keep => current,
            Self::Set(hash) => Some(hash.clone()),
            Self::Clear => None,
        }
    }
}

/// A producer's request to publish (or republish) a document.
#[derive(Clone, Debug)]
pub struct PublishRequest {
    pub filename: String,
    pub title: Option<String>,
    pub origin_path: Option<String>,
    pub content: String,
    pub password: PasswordChange,
    pub images: Vec<ImageUpload>,
}

impl PublishRequest {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            title: None,
            origin_path: None,
            content: content.into(),
            password: PasswordChange::Keep,
            images: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_origin_path(mut self, path: impl Into<String>) -> Self {
        self.origin_path = Some(path.into());
        self
    }

    pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.password = PasswordChange::Set(hash.into());
        self
    }

    pub fn clear_password(mut self) -> Self {
        self.password = PasswordChange::Clear;
        self
    }

    pub fn with_image(mut self, image: ImageUpload) -> Self {
        self.images.push(image);
        self
    }
}

/// Why an image was left out of a save.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    /// The declared media type is unknown or not on the allow-list.
    DisallowedMediaType { declared: String },
    /// The sanitized name's extension does not match the declared type.
    ExtensionMismatch { declared: String },
    /// The decoded payload exceeds the per-image limit.
    TooLarge { size: usize, max: usize },
    /// The publication already holds the maximum number of images.
    TooMany { max: usize },
    /// The name is empty after sanitization.
    InvalidName,
    /// The payload could not be decoded (reported by the transport layer).
    Undecodable,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DisallowedMediaType { declared } => {
                write!(f, "media type {declared:?} is not allowed")
            }
            Self::ExtensionMismatch { declared } => {
                write!(f, "file name does not carry an extension for {declared:?}")
            }
            Self::TooLarge { size, max } => write!(f, "{size} bytes exceeds the {max} byte limit"),
            Self::TooMany { max } => write!(f, "more than {max} images"),
            Self::InvalidName => f.write_str("invalid file name"),
            Self::Undecodable => f.write_str("payload could not be decoded"),
        }
    }
}

/// One image left out of a save.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImageRejection {
    /// The name as the producer submitted it.
    pub filename: String,
    pub reason: RejectionReason,
}

/// Result of a create-or-replace.
///
/// Rejected images never fail the save; they are listed here instead.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    /// Number of images now retained by the publication.
    pub accepted: usize,
    /// Sanitized names of the retained images, in submission order.
    pub images: Vec<String>,
    pub rejections: Vec<ImageRejection>,
    /// Image files removed because the new save no longer references them.
    pub removed: Vec<String>,
}

impl SaveOutcome {
    pub fn reject(&mut self, filename: impl Into<String>, reason: RejectionReason) {
        self.rejections.push(ImageRejection {
            filename: filename.into(),
            reason,
        });
    }
}

/// Result of [`crate::PublicationStore::publish`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    pub id: PublicationId,
    /// `true` if a new publication was created, `false` if one was replaced.
    pub created: bool,
    #[serde(flatten)]
    pub save: SaveOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let req = PublishRequest::new("notes.md", "# Notes")
            .with_title("Notes")
            .with_origin_path("/home/me/notes.md")
            .with_password_hash("$argon2id$...")
            .with_image(ImageUpload::new("a.png", "image/png", vec![1]));
        assert_eq!(req.title.as_deref(), Some("Notes"));
        assert_eq!(req.password, PasswordChange::Set("$argon2id$...".into()));
        assert_eq!(req.images.len(), 1);
        assert_eq!(req.clear_password().password, PasswordChange::Clear);
    }

    #[test]
    fn password_change_application() {
        let current = Some("old".to_string());
        assert_eq!(PasswordChange::Keep.apply(current.clone()), current);
        assert_eq!(PasswordChange::Clear.apply(current.clone()), None);
        assert_eq!(
            PasswordChange::Set("new".into()).apply(current),
            Some("new".into())
        );
    }

    #[test]
    fn rejection_serializes_with_kind_tag() {
        let r = ImageRejection {
            filename: "x.bmp".into(),
            reason: RejectionReason::DisallowedMediaType {
                declared: "image/bmp".into(),
            },
        };
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["reason"]["kind"], "disallowed_media_type");
        assert_eq!(v["reason"]["declared"], "image/bmp");
    }

    #[test]
    fn reason_display() {
        assert_eq!(
            RejectionReason::TooLarge { size: 11, max: 10 }.to_string(),
            "11 bytes exceeds the 10 byte limit"
        );
    }
}
