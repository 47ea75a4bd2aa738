/// Media upload handlers
use actix_web::http::header::CONTENT_TYPE;
use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use video_core::{EncodingStatus, Media, MediaKind, Video};

use crate::error::{AppError, Result};
use crate::services::MediaUploadService;
use crate::storage::RawResource;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub name: Option<String>,
}

/// Slot state after an upload
#[derive(Debug, Serialize, Deserialize)]
pub struct MediaUploadResponse {
    pub video_id: Uuid,
    pub kind: MediaKind,
    pub resource_id: String,
    pub checksum: String,
    pub name: String,
    pub location: String,
    /// Only set for audio/video slots
    pub encoding_status: Option<EncodingStatus>,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl MediaUploadResponse {
    fn from_video(video: &Video, kind: MediaKind) -> Result<Self> {
        let media = video
            .medias()
            .into_iter()
            .find_map(|(slot, media)| (slot == kind).then_some(media))
            .ok_or_else(|| AppError::Internal(format!("{kind} slot missing after upload")))?;

        let (resource_id, checksum, name, location, encoding_status) = match media {
            Media::Image(image) => (image.resource_id, image.checksum, image.name, image.location, None),
            Media::AudioVideo(av) => (
                av.resource_id,
                av.checksum,
                av.name,
                av.raw_location,
                Some(av.status),
            ),
        };

        Ok(Self {
            video_id: video.id(),
            kind,
            resource_id,
            checksum,
            name,
            location,
            encoding_status,
            version: video.version(),
            updated_at: video.updated_at(),
        })
    }
}

/// Upload raw media into a slot of a video
///
/// `PUT /api/v1/videos/{id}/medias/{kind}?name=...` with the file as body.
pub async fn upload_media(
    service: web::Data<MediaUploadService>,
    path: web::Path<(String, String)>,
    query: web::Query<UploadQuery>,
    req: HttpRequest,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let (video_id, kind) = path.into_inner();
    let video_id = Uuid::parse_str(&video_id)
        .map_err(|_| AppError::BadRequest("Invalid video ID".to_string()))?;
    let kind = MediaKind::from_str(&kind)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown media kind: {kind}")))?;

    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();
    let name = query
        .into_inner()
        .name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| kind.as_str().to_ascii_lowercase());

    let resource = RawResource::new(kind, body, content_type, name);
    let video = service.upload(video_id, resource).await?;

    Ok(HttpResponse::Ok().json(MediaUploadResponse::from_video(&video, kind)?))
}
