/// Media upload use case
///
/// Stores the raw bytes through the gateway, attaches the returned
/// descriptor to the video and persists it. Audio/video slots start out
/// pending until the encoder reports back.
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;
use video_core::Video;

use crate::db::VideoRepository;
use crate::error::{AppError, Result};
use crate::storage::{MediaResourceGateway, RawResource};

pub struct MediaUploadService {
    repository: Arc<dyn VideoRepository>,
    gateway: Arc<dyn MediaResourceGateway>,
}

impl MediaUploadService {
    pub fn new(
        repository: Arc<dyn VideoRepository>,
        gateway: Arc<dyn MediaResourceGateway>,
    ) -> Self {
        Self {
            repository,
            gateway,
        }
    }

    /// Upload media into the slot named by `resource.kind`, replacing any
    /// previous media of that slot.
    pub async fn upload(&self, video_id: Uuid, resource: RawResource) -> Result<Video> {
        if resource.content.is_empty() {
            return Err(AppError::BadRequest("media content is empty".to_string()));
        }

        let mut video = self
            .repository
            .find_by_id(video_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("video {video_id}")))?;

        let kind = resource.kind;
        let stored = if kind.is_audio_video() {
            self.gateway.store_audio_video(video_id, resource).await?
        } else {
            self.gateway.store_image(video_id, resource).await?
        };
        let resource_id = stored.resource_id.clone();

        video.attach_media(kind, stored);
        let video = self.repository.save(video).await?;

        info!(
            video_id = %video_id,
            kind = %kind,
            resource_id = %resource_id,
            version = video.version(),
            "Media attached to video"
        );

        Ok(video)
    }
}
