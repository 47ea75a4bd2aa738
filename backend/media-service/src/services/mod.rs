/// Service layer for video media
///
/// This module provides business logic for:
/// - Upload service: storing raw media and attaching it to a video
/// - Reconciler: applying encoder results to the slot they belong to
pub mod reconciler;
pub mod upload;

pub use reconciler::{EncodingUpdate, MediaStatusReconciler, ReconcileCommand, ReconcileOutcome};
pub use upload::MediaUploadService;
