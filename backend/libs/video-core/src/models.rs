//! Core video aggregate
//!
//! [`Video`] owns its media slots and is the only place slot state changes.
//! Encoding transitions are idempotent upserts: the encoder channel delivers
//! at least once and without ordering, so every operation tolerates replays
//! and reports whether anything actually changed.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MediaError, MediaResult};
use crate::media::{AudioVideoMedia, EncodingStatus, ImageMedia, Media, MediaKind, StoredResource};

/// Age rating of a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    #[serde(rename = "ER")]
    Er,
    #[serde(rename = "L")]
    L,
    #[serde(rename = "10")]
    Age10,
    #[serde(rename = "12")]
    Age12,
    #[serde(rename = "14")]
    Age14,
    #[serde(rename = "16")]
    Age16,
    #[serde(rename = "18")]
    Age18,
}

impl Rating {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Er => "ER",
            Self::L => "L",
            Self::Age10 => "10",
            Self::Age12 => "12",
            Self::Age14 => "14",
            Self::Age16 => "16",
            Self::Age18 => "18",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ER" => Some(Self::Er),
            "L" => Some(Self::L),
            "10" => Some(Self::Age10),
            "12" => Some(Self::Age12),
            "14" => Some(Self::Age14),
            "16" => Some(Self::Age16),
            "18" => Some(Self::Age18),
            _ => None,
        }
    }
}

/// Catalog metadata of a video, maintained by the CRUD surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoDetails {
    pub title: String,
    pub description: String,
    pub release_year: i32,
    /// Duration in minutes
    pub duration: f64,
    pub opened: bool,
    pub published: bool,
    pub rating: Rating,
    pub categories: BTreeSet<Uuid>,
    pub genres: BTreeSet<Uuid>,
    pub cast_members: BTreeSet<Uuid>,
}

/// Result of applying a slot operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Slot state changed and the video needs to be persisted
    Applied,
    /// Operation was a replay or arrived late; nothing changed
    Unchanged,
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied)
    }
}

/// Persisted shape of a video, used by repositories to rebuild the aggregate
#[derive(Debug, Clone)]
pub struct VideoRecord {
    pub id: Uuid,
    pub details: VideoDetails,
    pub medias: Vec<(MediaKind, Media)>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: i64,
}

/// Video aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    id: Uuid,
    details: VideoDetails,
    banner: Option<ImageMedia>,
    thumbnail: Option<ImageMedia>,
    thumbnail_half: Option<ImageMedia>,
    trailer: Option<AudioVideoMedia>,
    video: Option<AudioVideoMedia>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: i64,
}

impl Video {
    /// Create a new catalog entry without media
    pub fn new(details: VideoDetails) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            details,
            banner: None,
            thumbnail: None,
            thumbnail_half: None,
            trailer: None,
            video: None,
            created_at: now,
            updated_at: now,
            version: 0,
        }
    }

    /// Rebuild a video from its stored record without touching timestamps
    pub fn restore(record: VideoRecord) -> MediaResult<Self> {
        let mut video = Self {
            id: record.id,
            details: record.details,
            banner: None,
            thumbnail: None,
            thumbnail_half: None,
            trailer: None,
            video: None,
            created_at: record.created_at,
            updated_at: record.updated_at,
            version: record.version,
        };

        for (kind, media) in record.medias {
            match media {
                Media::Image(image) => {
                    let slot = video
                        .image_slot_mut(kind)
                        .ok_or(MediaError::KindMismatch(kind))?;
                    *slot = Some(image);
                }
                Media::AudioVideo(av) => {
                    let slot = video
                        .audio_video_slot_mut(kind)
                        .ok_or(MediaError::KindMismatch(kind))?;
                    *slot = Some(av);
                }
            }
        }

        Ok(video)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn details(&self) -> &VideoDetails {
        &self.details
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Version of the stored record this aggregate was loaded from (0 if never saved)
    pub fn version(&self) -> i64 {
        self.version
    }

    /// Return the aggregate as stored under `version`
    pub fn persisted(mut self, version: i64) -> Self {
        self.version = version;
        self
    }

    pub fn banner(&self) -> Option<&ImageMedia> {
        self.banner.as_ref()
    }

    pub fn thumbnail(&self) -> Option<&ImageMedia> {
        self.thumbnail.as_ref()
    }

    pub fn thumbnail_half(&self) -> Option<&ImageMedia> {
        self.thumbnail_half.as_ref()
    }

    pub fn trailer(&self) -> Option<&AudioVideoMedia> {
        self.trailer.as_ref()
    }

    pub fn video(&self) -> Option<&AudioVideoMedia> {
        self.video.as_ref()
    }

    pub fn image(&self, kind: MediaKind) -> Option<&ImageMedia> {
        match kind {
            MediaKind::Banner => self.banner.as_ref(),
            MediaKind::Thumbnail => self.thumbnail.as_ref(),
            MediaKind::ThumbnailHalf => self.thumbnail_half.as_ref(),
            MediaKind::Video | MediaKind::Trailer => None,
        }
    }

    pub fn audio_video(&self, kind: MediaKind) -> Option<&AudioVideoMedia> {
        match kind {
            MediaKind::Video => self.video.as_ref(),
            MediaKind::Trailer => self.trailer.as_ref(),
            MediaKind::Banner | MediaKind::Thumbnail | MediaKind::ThumbnailHalf => None,
        }
    }

    /// All attached slots in [`MediaKind::ALL`] order
    pub fn medias(&self) -> Vec<(MediaKind, Media)> {
        MediaKind::ALL
            .into_iter()
            .filter_map(|kind| {
                if kind.is_audio_video() {
                    self.audio_video(kind)
                        .map(|av| (kind, Media::AudioVideo(av.clone())))
                } else {
                    self.image(kind).map(|image| (kind, Media::Image(image.clone())))
                }
            })
            .collect()
    }

    /// Find the audio/video slot currently holding `resource_id`.
    ///
    /// With a `hint`, only that slot is considered.
    pub fn find_audio_video_kind(
        &self,
        resource_id: &str,
        hint: Option<MediaKind>,
    ) -> Option<MediaKind> {
        MediaKind::AUDIO_VIDEO
            .into_iter()
            .filter(|kind| hint.map_or(true, |h| h == *kind))
            .find(|kind| {
                self.audio_video(*kind)
                    .is_some_and(|media| media.resource_id == resource_id)
            })
    }

    /// Attach freshly stored media at `kind`, replacing whatever was there.
    ///
    /// Audio/video slots start over as pending with no encoded rendition.
    pub fn attach_media(&mut self, kind: MediaKind, resource: StoredResource) {
        if let Some(slot) = self.audio_video_slot_mut(kind) {
            *slot = Some(AudioVideoMedia::pending(resource));
        } else if let Some(slot) = self.image_slot_mut(kind) {
            *slot = Some(ImageMedia::from(resource));
        }
        self.touch();
    }

    /// Mark the slot as being encoded.
    ///
    /// A slot that already reached `Processing` or `Completed` is left alone,
    /// so a late processing notice never regresses a finished encode.
    pub fn begin_encoding(&mut self, kind: MediaKind) -> MediaResult<Transition> {
        let media = self.audio_video_media_mut(kind)?;
        let transition = match media.status {
            EncodingStatus::Pending => {
                media.status = EncodingStatus::Processing;
                Transition::Applied
            }
            EncodingStatus::Processing | EncodingStatus::Completed => Transition::Unchanged,
        };

        if transition.is_applied() {
            self.touch();
        }
        Ok(transition)
    }

    /// Mark the slot as encoded at `encoded_location`.
    ///
    /// Accepted from both `Pending` and `Processing`. Replaying the same
    /// location is a no-op; a different location overwrites the previous one.
    pub fn complete_encoding(
        &mut self,
        kind: MediaKind,
        encoded_location: impl Into<String>,
    ) -> MediaResult<Transition> {
        let encoded_location = encoded_location.into();
        let media = self.audio_video_media_mut(kind)?;

        if media.status == EncodingStatus::Completed
            && media.encoded_location.as_deref() == Some(encoded_location.as_str())
        {
            return Ok(Transition::Unchanged);
        }

        media.status = EncodingStatus::Completed;
        media.encoded_location = Some(encoded_location);
        self.touch();
        Ok(Transition::Applied)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn image_slot_mut(&mut self, kind: MediaKind) -> Option<&mut Option<ImageMedia>> {
        match kind {
            MediaKind::Banner => Some(&mut self.banner),
            MediaKind::Thumbnail => Some(&mut self.thumbnail),
            MediaKind::ThumbnailHalf => Some(&mut self.thumbnail_half),
            MediaKind::Video | MediaKind::Trailer => None,
        }
    }

    fn audio_video_slot_mut(&mut self, kind: MediaKind) -> Option<&mut Option<AudioVideoMedia>> {
        match kind {
            MediaKind::Video => Some(&mut self.video),
            MediaKind::Trailer => Some(&mut self.trailer),
            MediaKind::Banner | MediaKind::Thumbnail | MediaKind::ThumbnailHalf => None,
        }
    }

    fn audio_video_media_mut(&mut self, kind: MediaKind) -> MediaResult<&mut AudioVideoMedia> {
        self.audio_video_slot_mut(kind)
            .ok_or(MediaError::NotAudioVideo(kind))?
            .as_mut()
            .ok_or(MediaError::SlotAbsent(kind))
    }
}
