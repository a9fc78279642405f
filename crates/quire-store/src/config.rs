use quire_types::MediaType;
use serde::{Deserialize, Serialize};

/// Limits the store enforces on every save.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Largest accepted markdown body, in bytes.
    pub max_content_bytes: usize,
    /// Largest accepted decoded image, in bytes.
    pub max_image_bytes: usize,
    /// Most images retained per publication.
    pub max_images: usize,
    /// Media types accepted on upload.
    pub allowed_media_types: Vec<MediaType>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_content_bytes: 5 * 1024 * 1024,
            max_image_bytes: 10 * 1024 * 1024,
            max_images: 50,
            allowed_media_types: vec![
                MediaType::Png,
                MediaType::Jpeg,
                MediaType::Gif,
                MediaType::Webp,
            ],
        }
    }
}

impl StoreConfig {
    pub fn allows(&self, media_type: MediaType) -> bool {
        self.allowed_media_types.contains(&media_type)
    }
}
