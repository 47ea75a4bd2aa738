//! Media constants

/// Default upper bound for a single raw media upload (256 MiB)
///
/// Upload bodies are buffered in memory before they are stored.
pub const DEFAULT_MAX_MEDIA_SIZE: u64 = 256 * 1024 * 1024;

/// Prefix of the per-video folder raw media objects are stored under
pub const VIDEO_FOLDER_PREFIX: &str = "videoId-";

/// Prefix of the per-slot object name inside a video folder
pub const MEDIA_TYPE_PREFIX: &str = "type-";
