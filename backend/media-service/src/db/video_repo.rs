/// Video repository - PostgreSQL persistence for the video aggregate
///
/// A video is stored as one `videos` row plus one `video_media` row per
/// attached slot. Saves replace the whole aggregate inside a transaction and
/// are guarded by the `version` column.
use super::VideoRepository;
use crate::error::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::collections::BTreeSet;
use tracing::debug;
use uuid::Uuid;
use video_core::{
    AudioVideoMedia, EncodingStatus, ImageMedia, Media, MediaKind, Rating, Video, VideoDetails,
    VideoRecord,
};

const SELECT_VIDEO_WITH_MEDIA: &str = r#"
    SELECT v.id, v.title, v.description, v.release_year, v.duration, v.opened, v.published,
           v.rating, v.category_ids, v.genre_ids, v.cast_member_ids, v.version,
           v.created_at, v.updated_at,
           m.kind AS media_kind, m.resource_id AS media_resource_id,
           m.checksum AS media_checksum, m.name AS media_name,
           m.location AS media_location, m.encoded_location AS media_encoded_location,
           m.encoding_status AS media_encoding_status
    FROM videos v
    LEFT JOIN video_media m ON m.video_id = v.id
    WHERE v.id = $1
"#;

#[derive(Clone)]
pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn write_video_row(
        tx: &mut Transaction<'_, Postgres>,
        video: &Video,
        next_version: i64,
    ) -> Result<u64> {
        let details = video.details();
        let categories: Vec<Uuid> = details.categories.iter().copied().collect();
        let genres: Vec<Uuid> = details.genres.iter().copied().collect();
        let cast_members: Vec<Uuid> = details.cast_members.iter().copied().collect();

        // Version 0 means the aggregate was never stored.
        let result = if video.version() == 0 {
            sqlx::query(
                r#"
                INSERT INTO videos (id, title, description, release_year, duration, opened,
                                    published, rating, category_ids, genre_ids, cast_member_ids,
                                    version, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
                ON CONFLICT (id) DO NOTHING
                "#,
            )
            .bind(video.id())
            .bind(&details.title)
            .bind(&details.description)
            .bind(details.release_year)
            .bind(details.duration)
            .bind(details.opened)
            .bind(details.published)
            .bind(details.rating.as_str())
            .bind(&categories)
            .bind(&genres)
            .bind(&cast_members)
            .bind(next_version)
            .bind(video.created_at())
            .bind(video.updated_at())
            .execute(&mut **tx)
            .await?
        } else {
            sqlx::query(
                r#"
                UPDATE videos
                SET title = $2, description = $3, release_year = $4, duration = $5,
                    opened = $6, published = $7, rating = $8, category_ids = $9,
                    genre_ids = $10, cast_member_ids = $11, version = $12, updated_at = $13
                WHERE id = $1 AND version = $14
                "#,
            )
            .bind(video.id())
            .bind(&details.title)
            .bind(&details.description)
            .bind(details.release_year)
            .bind(details.duration)
            .bind(details.opened)
            .bind(details.published)
            .bind(details.rating.as_str())
            .bind(&categories)
            .bind(&genres)
            .bind(&cast_members)
            .bind(next_version)
            .bind(video.updated_at())
            .bind(video.version())
            .execute(&mut **tx)
            .await?
        };

        Ok(result.rows_affected())
    }

    async fn replace_media_rows(tx: &mut Transaction<'_, Postgres>, video: &Video) -> Result<()> {
        sqlx::query("DELETE FROM video_media WHERE video_id = $1")
            .bind(video.id())
            .execute(&mut **tx)
            .await?;

        for (kind, media) in video.medias() {
            let (resource_id, checksum, name, location, encoded_location, status) = match &media {
                Media::Image(image) => (
                    &image.resource_id,
                    &image.checksum,
                    &image.name,
                    &image.location,
                    None,
                    None,
                ),
                Media::AudioVideo(av) => (
                    &av.resource_id,
                    &av.checksum,
                    &av.name,
                    &av.raw_location,
                    av.encoded_location.as_deref(),
                    Some(av.status.as_str()),
                ),
            };

            sqlx::query(
                r#"
                INSERT INTO video_media (video_id, kind, resource_id, checksum, name, location,
                                         encoded_location, encoding_status)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(video.id())
            .bind(kind.as_str())
            .bind(resource_id)
            .bind(checksum)
            .bind(name)
            .bind(location)
            .bind(encoded_location)
            .bind(status)
            .execute(&mut **tx)
            .await?;
        }

        Ok(())
    }
}

#[async_trait]
impl VideoRepository for PgVideoRepository {
    async fn find_by_id(&self, video_id: Uuid) -> Result<Option<Video>> {
        // Single statement so the video row and its slots come from one snapshot.
        let rows = sqlx::query(SELECT_VIDEO_WITH_MEDIA)
            .bind(video_id)
            .fetch_all(&self.pool)
            .await?;

        let Some(first) = rows.first() else {
            return Ok(None);
        };

        let mut record = video_record_from_row(first)?;
        for row in &rows {
            if let Some(slot) = media_from_row(row)? {
                record.medias.push(slot);
            }
        }

        Ok(Some(Video::restore(record)?))
    }

    async fn save(&self, video: Video) -> Result<Video> {
        let next_version = video.version() + 1;
        let mut tx = self.pool.begin().await?;

        let affected = Self::write_video_row(&mut tx, &video, next_version).await?;
        if affected == 0 {
            // Dropping the transaction rolls it back.
            return Err(AppError::Conflict(format!(
                "video {} was modified concurrently (expected version {})",
                video.id(),
                video.version()
            )));
        }

        Self::replace_media_rows(&mut tx, &video).await?;
        tx.commit().await?;

        debug!(video_id = %video.id(), version = next_version, "video saved");
        Ok(video.persisted(next_version))
    }
}

fn video_record_from_row(row: &PgRow) -> Result<VideoRecord> {
    let rating: String = row.try_get("rating")?;
    let rating = Rating::from_str(&rating)
        .ok_or_else(|| AppError::DataIntegrity(format!("unknown rating code: {rating}")))?;

    let categories: Vec<Uuid> = row.try_get("category_ids")?;
    let genres: Vec<Uuid> = row.try_get("genre_ids")?;
    let cast_members: Vec<Uuid> = row.try_get("cast_member_ids")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(VideoRecord {
        id: row.try_get("id")?,
        details: VideoDetails {
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            release_year: row.try_get("release_year")?,
            duration: row.try_get("duration")?,
            opened: row.try_get("opened")?,
            published: row.try_get("published")?,
            rating,
            categories: categories.into_iter().collect::<BTreeSet<_>>(),
            genres: genres.into_iter().collect::<BTreeSet<_>>(),
            cast_members: cast_members.into_iter().collect::<BTreeSet<_>>(),
        },
        medias: Vec::new(),
        created_at,
        updated_at,
        version: row.try_get("version")?,
    })
}

fn media_from_row(row: &PgRow) -> Result<Option<(MediaKind, Media)>> {
    let Some(kind) = row.try_get::<Option<String>, _>("media_kind")? else {
        return Ok(None);
    };
    let kind = MediaKind::from_str(&kind)
        .ok_or_else(|| AppError::DataIntegrity(format!("unknown media kind: {kind}")))?;

    let resource_id: String = row.try_get("media_resource_id")?;
    let checksum: String = row.try_get("media_checksum")?;
    let name: String = row.try_get("media_name")?;
    let location: String = row.try_get("media_location")?;

    let media = if kind.is_audio_video() {
        let status: Option<String> = row.try_get("media_encoding_status")?;
        let status = status
            .as_deref()
            .and_then(EncodingStatus::from_str)
            .ok_or_else(|| {
                AppError::DataIntegrity(format!("invalid encoding status on {kind} slot"))
            })?;

        Media::AudioVideo(AudioVideoMedia {
            resource_id,
            checksum,
            name,
            raw_location: location,
            encoded_location: row.try_get("media_encoded_location")?,
            status,
        })
    } else {
        Media::Image(ImageMedia {
            resource_id,
            checksum,
            name,
            location,
        })
    };

    Ok(Some((kind, media)))
}
