//! Encoding status reconciliation
//!
//! Applies an encoder result to the audio/video slot that currently holds
//! the reported resource. The encoder channel redelivers and reorders, so
//! every path here is idempotent: replays, late notices and events for
//! replaced uploads are dropped without a write.

use std::sync::Arc;

use uuid::Uuid;
use video_core::{EncodingStatus, MediaKind, Transition};

use crate::db::VideoRepository;
use crate::error::Result;
use crate::metrics::EncodingObserver;

/// Status reported for a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingUpdate {
    Pending,
    Processing,
    Completed { encoded_location: String },
}

impl EncodingUpdate {
    pub fn status(&self) -> EncodingStatus {
        match self {
            EncodingUpdate::Pending => EncodingStatus::Pending,
            EncodingUpdate::Processing => EncodingStatus::Processing,
            EncodingUpdate::Completed { .. } => EncodingStatus::Completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileCommand {
    pub video_id: Uuid,
    pub resource_id: String,
    /// Restricts the correlation lookup to one slot when the sender knows it
    pub kind_hint: Option<MediaKind>,
    pub update: EncodingUpdate,
}

impl ReconcileCommand {
    pub fn completed(
        video_id: Uuid,
        resource_id: impl Into<String>,
        encoded_location: impl Into<String>,
    ) -> Self {
        Self {
            video_id,
            resource_id: resource_id.into(),
            kind_hint: None,
            update: EncodingUpdate::Completed {
                encoded_location: encoded_location.into(),
            },
        }
    }

    pub fn processing(video_id: Uuid, resource_id: impl Into<String>) -> Self {
        Self {
            video_id,
            resource_id: resource_id.into(),
            kind_hint: None,
            update: EncodingUpdate::Processing,
        }
    }

    pub fn with_kind_hint(mut self, kind: MediaKind) -> Self {
        self.kind_hint = Some(kind);
        self
    }
}

/// What a reconcile call did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Slot changed and the video was saved
    Applied,
    /// Slot already reflected the update; nothing was written
    Unchanged,
    VideoNotFound,
    /// No audio/video slot holds the resource (replaced or never attached)
    StaleResource,
}

pub struct MediaStatusReconciler {
    repository: Arc<dyn VideoRepository>,
    observer: Arc<dyn EncodingObserver>,
}

impl MediaStatusReconciler {
    pub fn new(repository: Arc<dyn VideoRepository>, observer: Arc<dyn EncodingObserver>) -> Self {
        Self {
            repository,
            observer,
        }
    }

    /// Load, transition and (only if something changed) save the video.
    ///
    /// Missing videos and stale resources are reported as outcomes, not
    /// errors; only infrastructure failures are returned as `Err`.
    pub async fn reconcile(&self, command: ReconcileCommand) -> Result<ReconcileOutcome> {
        let ReconcileCommand {
            video_id,
            resource_id,
            kind_hint,
            update,
        } = command;

        let Some(mut video) = self.repository.find_by_id(video_id).await? else {
            self.observer.video_not_found(video_id, &resource_id);
            return Ok(ReconcileOutcome::VideoNotFound);
        };

        let Some(kind) = video.find_audio_video_kind(&resource_id, kind_hint) else {
            self.observer.stale_resource(video_id, &resource_id);
            return Ok(ReconcileOutcome::StaleResource);
        };

        let status = update.status();
        let transition = match update {
            EncodingUpdate::Pending => Transition::Unchanged,
            EncodingUpdate::Processing => video.begin_encoding(kind)?,
            EncodingUpdate::Completed { encoded_location } => {
                video.complete_encoding(kind, encoded_location)?
            }
        };

        if transition.is_applied() {
            self.repository.save(video).await?;
        }
        self.observer.transition(video_id, kind, status, transition);

        Ok(match transition {
            Transition::Applied => ReconcileOutcome::Applied,
            Transition::Unchanged => ReconcileOutcome::Unchanged,
        })
    }
}
