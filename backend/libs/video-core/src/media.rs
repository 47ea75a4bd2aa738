//! Media slot value types
//!
//! A video owns at most one media slot per [`MediaKind`]. Image slots are
//! stored once and never change; audio/video slots additionally track the
//! progress of the external encoder through [`EncodingStatus`].

use serde::{Deserialize, Serialize};

/// Named media slot on a video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaKind {
    Video,
    Trailer,
    Banner,
    Thumbnail,
    ThumbnailHalf,
}

impl MediaKind {
    pub const ALL: [MediaKind; 5] = [
        MediaKind::Video,
        MediaKind::Trailer,
        MediaKind::Banner,
        MediaKind::Thumbnail,
        MediaKind::ThumbnailHalf,
    ];

    /// Slots that go through the encoder, in correlation lookup order
    pub const AUDIO_VIDEO: [MediaKind; 2] = [MediaKind::Video, MediaKind::Trailer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "VIDEO",
            Self::Trailer => "TRAILER",
            Self::Banner => "BANNER",
            Self::Thumbnail => "THUMBNAIL",
            Self::ThumbnailHalf => "THUMBNAIL_HALF",
        }
    }

    /// Parses a kind code, accepting any ASCII case and `-` for `_`
    pub fn from_str(s: &str) -> Option<Self> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        match normalized.as_str() {
            "VIDEO" => Some(Self::Video),
            "TRAILER" => Some(Self::Trailer),
            "BANNER" => Some(Self::Banner),
            "THUMBNAIL" => Some(Self::Thumbnail),
            "THUMBNAIL_HALF" => Some(Self::ThumbnailHalf),
            _ => None,
        }
    }

    /// True for slots that are subject to encoding
    pub fn is_audio_video(&self) -> bool {
        matches!(self, Self::Video | Self::Trailer)
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoding progress of an audio/video slot
///
/// Variants are declared in transition order, so `Ord` reflects how far
/// the encoder got.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EncodingStatus {
    Pending,
    Processing,
    Completed,
}

impl EncodingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Processing => "PROCESSING",
            Self::Completed => "COMPLETED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "PROCESSING" => Some(Self::Processing),
            "COMPLETED" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for EncodingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor returned by the storage gateway after raw bytes were stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResource {
    /// Correlation key echoed back by the encoder
    pub resource_id: String,
    /// Hex encoded SHA-256 of the stored bytes
    pub checksum: String,
    pub name: String,
    pub location: String,
}

/// Image slot (banner, thumbnail, thumbnail half)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMedia {
    pub resource_id: String,
    pub checksum: String,
    pub name: String,
    pub location: String,
}

impl From<StoredResource> for ImageMedia {
    fn from(resource: StoredResource) -> Self {
        Self {
            resource_id: resource.resource_id,
            checksum: resource.checksum,
            name: resource.name,
            location: resource.location,
        }
    }
}

/// Audio/video slot (video, trailer)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioVideoMedia {
    pub resource_id: String,
    pub checksum: String,
    pub name: String,
    pub raw_location: String,
    pub encoded_location: Option<String>,
    pub status: EncodingStatus,
}

impl AudioVideoMedia {
    /// Fresh upload awaiting the encoder
    pub fn pending(resource: StoredResource) -> Self {
        Self {
            resource_id: resource.resource_id,
            checksum: resource.checksum,
            name: resource.name,
            raw_location: resource.location,
            encoded_location: None,
            status: EncodingStatus::Pending,
        }
    }

    pub fn is_encoded(&self) -> bool {
        self.status == EncodingStatus::Completed
    }
}

/// A media slot as stored on a video, either variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Media {
    Image(ImageMedia),
    AudioVideo(AudioVideoMedia),
}

impl Media {
    pub fn resource_id(&self) -> &str {
        match self {
            Media::Image(image) => &image.resource_id,
            Media::AudioVideo(av) => &av.resource_id,
        }
    }
}

/// Location of an encoded rendition as reported by the encoder
pub fn encoded_location(encoded_folder: &str, file_path: &str) -> String {
    format!("{}/{}", encoded_folder, file_path)
}
