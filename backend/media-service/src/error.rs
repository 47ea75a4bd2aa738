/// Error types for Media Service
///
/// Every failure of the upload and reconciliation paths is expressed as an
/// `AppError` so callers can decide deterministically: the HTTP layer maps it
/// to a status code, the encoder consumer decides between ack and redelivery.
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use std::fmt;
use video_core::MediaError;

/// Result type for media-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Debug)]
pub enum AppError {
    /// Database operation failed
    DatabaseError(String),

    /// A stored row does not decode into the domain model
    DataIntegrity(String),

    /// Object storage operation failed
    StorageError(String),

    /// Resource not found
    NotFound(String),

    /// Bad request
    BadRequest(String),

    /// Concurrent modification of the same video (stale version on save)
    Conflict(String),

    /// Internal server error
    Internal(String),
}

impl AppError {
    /// Whether retrying the same operation later can succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AppError::DatabaseError(_)
                | AppError::StorageError(_)
                | AppError::Conflict(_)
                | AppError::Internal(_)
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::DataIntegrity(msg) => write!(f, "Data integrity error: {}", msg),
            AppError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// JSON body returned for failed requests
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status: u16,
    pub error_type: String,
    pub code: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error: &str, message: &str, status: u16, error_type: &str, code: &str) -> Self {
        Self {
            error: error.to_string(),
            message: message.to_string(),
            status,
            error_type: error_type.to_string(),
            code: code.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) | AppError::DataIntegrity(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::StorageError(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let (error_type, code) = match self {
            AppError::DatabaseError(_) => ("server_error", "DATABASE_ERROR"),
            AppError::DataIntegrity(_) => ("server_error", "DATA_INTEGRITY_ERROR"),
            AppError::StorageError(_) => ("server_error", "STORAGE_ERROR"),
            AppError::NotFound(_) => ("not_found_error", "VIDEO_NOT_FOUND"),
            AppError::BadRequest(_) => ("validation_error", "INVALID_REQUEST"),
            AppError::Conflict(_) => ("conflict_error", "VERSION_CONFLICT"),
            AppError::Internal(_) => ("server_error", "INTERNAL_SERVER_ERROR"),
        };

        let message = self.to_string();
        let response = ErrorResponse::new(
            status.canonical_reason().unwrap_or("Error"),
            &message,
            status.as_u16(),
            error_type,
            code,
        );

        HttpResponse::build(status).json(response)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<MediaError> for AppError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::SlotAbsent(_) => AppError::NotFound(err.to_string()),
            MediaError::NotAudioVideo(_) => AppError::BadRequest(err.to_string()),
            MediaError::KindMismatch(_) => AppError::DataIntegrity(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use video_core::MediaKind;

    #[test]
    fn test_transient_classification() {
        assert!(AppError::DatabaseError("down".into()).is_transient());
        assert!(AppError::StorageError("timeout".into()).is_transient());
        assert!(AppError::Conflict("stale version".into()).is_transient());
        assert!(!AppError::NotFound("video".into()).is_transient());
        assert!(!AppError::BadRequest("empty".into()).is_transient());
        assert!(!AppError::DataIntegrity("unknown rating code: X".into()).is_transient());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::NotFound("video".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("v".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::BadRequest("b".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_media_error_conversion() {
        let err: AppError = MediaError::NotAudioVideo(MediaKind::Banner).into();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err: AppError = MediaError::KindMismatch(MediaKind::Video).into();
        assert!(matches!(err, AppError::DataIntegrity(_)));
        assert!(!err.is_transient());
    }
}
