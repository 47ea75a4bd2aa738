//! Error types for video aggregate operations

use thiserror::Error;

use crate::media::MediaKind;

/// Errors raised by media slot transitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// No media is attached at the slot. Callers applying encoder events
    /// treat this as a no-op: the slot was never uploaded or was replaced.
    #[error("No media attached at slot {0}")]
    SlotAbsent(MediaKind),

    /// Encoding transitions only exist for video and trailer slots
    #[error("Slot {0} is not an audio/video slot")]
    NotAudioVideo(MediaKind),

    /// Restored media variant does not fit the slot kind
    #[error("Media variant does not match slot {0}")]
    KindMismatch(MediaKind),
}

pub type MediaResult<T> = Result<T, MediaError>;
