/// Raw media storage
///
/// The upload path hands raw bytes to a `MediaResourceGateway`, which stores
/// them and returns the descriptor that gets attached to the video.
use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use uuid::Uuid;
use video_core::constants::{MEDIA_TYPE_PREFIX, VIDEO_FOLDER_PREFIX};
use video_core::{MediaKind, StoredResource};

use crate::error::Result;

pub mod s3;

pub use s3::S3MediaGateway;

/// Raw upload as received from a client
#[derive(Debug, Clone)]
pub struct RawResource {
    pub kind: MediaKind,
    pub content: Bytes,
    pub content_type: String,
    pub name: String,
}

impl RawResource {
    pub fn new(
        kind: MediaKind,
        content: impl Into<Bytes>,
        content_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            content: content.into(),
            content_type: content_type.into(),
            name: name.into(),
        }
    }

    /// Lowercase hex SHA-256 of the content
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.content);
        hex::encode(hasher.finalize())
    }
}

/// Stores raw media bytes.
///
/// Every call assigns a fresh resource id, which the encoder later echoes
/// back as the correlation key.
#[async_trait]
pub trait MediaResourceGateway: Send + Sync {
    /// Store a video or trailer; the returned location is the raw (unencoded) one
    async fn store_audio_video(&self, video_id: Uuid, resource: RawResource)
        -> Result<StoredResource>;

    async fn store_image(&self, video_id: Uuid, resource: RawResource) -> Result<StoredResource>;
}

/// Object key for one stored resource: `videoId-{id}/type-{KIND}-{resourceId}`
///
/// The resource id is part of the key so a new upload never overwrites bytes
/// a persisted slot still points at.
pub fn object_key(video_id: Uuid, kind: MediaKind, resource_id: &str) -> String {
    format!(
        "{}{}/{}{}-{}",
        VIDEO_FOLDER_PREFIX,
        video_id,
        MEDIA_TYPE_PREFIX,
        kind.as_str(),
        resource_id
    )
}

/// Allocate a fresh resource id and the object key it will be stored under
pub fn allocate_object(video_id: Uuid, kind: MediaKind) -> (String, String) {
    let resource_id = Uuid::new_v4().to_string();
    let key = object_key(video_id, kind, &resource_id);
    (resource_id, key)
}
