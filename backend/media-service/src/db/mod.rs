/// Database access layer
///
/// This module provides:
/// - The `VideoRepository` contract the media use cases depend on
/// - A PostgreSQL implementation with optimistic version checks
use async_trait::async_trait;
use uuid::Uuid;
use video_core::Video;

use crate::error::Result;

pub mod video_repo;

pub use video_repo::PgVideoRepository;

/// Loads and persists video aggregates.
///
/// Implementations must persist the whole aggregate atomically. `save`
/// fails with `AppError::Conflict` when the stored version moved on since
/// the aggregate was loaded.
#[async_trait]
pub trait VideoRepository: Send + Sync {
    async fn find_by_id(&self, video_id: Uuid) -> Result<Option<Video>>;

    /// Persist the aggregate and return it with its new version
    async fn save(&self, video: Video) -> Result<Video>;
}

/// Embedded schema migrations, applied at startup when `RUN_MIGRATIONS` is set
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");
