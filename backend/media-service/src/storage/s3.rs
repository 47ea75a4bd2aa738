/// S3-backed media storage
///
/// Every upload gets its own object under `videoId-{id}/type-{KIND}-{resourceId}`.
/// The object a slot currently references is never overwritten, even when the
/// save that follows a new upload fails.
use super::{allocate_object, MediaResourceGateway, RawResource};
use crate::config::S3Config;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::info;
use uuid::Uuid;
use video_core::StoredResource;

#[derive(Clone)]
pub struct S3MediaGateway {
    client: Client,
    bucket: String,
}

impl S3MediaGateway {
    pub fn new(client: Client, config: &S3Config) -> Self {
        Self {
            client,
            bucket: config.bucket.clone(),
        }
    }

    async fn put(&self, video_id: Uuid, resource: RawResource) -> Result<StoredResource> {
        let (resource_id, key) = allocate_object(video_id, resource.kind);
        let checksum = resource.checksum();
        let size = resource.content.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(resource.content))
            .content_type(&resource.content_type)
            .metadata("video_id", video_id.to_string())
            .metadata("resource_id", &resource_id)
            .metadata("checksum", &checksum)
            .send()
            .await
            .map_err(|e| AppError::StorageError(format!("Failed to upload {key}: {e}")))?;

        info!(
            video_id = %video_id,
            kind = %resource.kind,
            resource_id = %resource_id,
            size_bytes = size,
            "Stored media object"
        );

        Ok(StoredResource {
            resource_id,
            checksum,
            name: resource.name,
            location: key,
        })
    }
}

#[async_trait]
impl MediaResourceGateway for S3MediaGateway {
    async fn store_audio_video(
        &self,
        video_id: Uuid,
        resource: RawResource,
    ) -> Result<StoredResource> {
        if !resource.kind.is_audio_video() {
            return Err(AppError::BadRequest(format!(
                "{} is not an audio/video slot",
                resource.kind
            )));
        }
        self.put(video_id, resource).await
    }

    async fn store_image(&self, video_id: Uuid, resource: RawResource) -> Result<StoredResource> {
        if resource.kind.is_audio_video() {
            return Err(AppError::BadRequest(format!(
                "{} is not an image slot",
                resource.kind
            )));
        }
        self.put(video_id, resource).await
    }
}

/// Build an S3 client from the default credential chain
///
/// A custom endpoint (MinIO, localstack) switches to path-style addressing.
pub async fn get_s3_client(config: &S3Config) -> Client {
    use aws_sdk_s3::config::Region;

    let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .load()
        .await;

    let mut builder = aws_sdk_s3::config::Builder::from(&aws_config);
    if let Some(endpoint) = &config.endpoint {
        builder = builder.endpoint_url(endpoint).force_path_style(true);
    }

    Client::from_conf(builder.build())
}
