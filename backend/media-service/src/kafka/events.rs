//! Encoder result messages
//!
//! The encoder publishes JSON objects discriminated by `status`:
//!
//! ```json
//! {"status":"COMPLETED","id":"<video id>","video":{"resource_id":"..","encoded_video_folder":"..","file_path":".."}}
//! {"status":"ERROR","id":"<video id>","message":"..","resource_id":".."}
//! ```
//!
//! Anything else decodes to [`EncoderEvent::Unrecognized`] so the consumer
//! can acknowledge it instead of redelivering it forever.

use serde::Deserialize;
use uuid::Uuid;
use video_core::encoded_location;

/// Decoded encoder message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderEvent {
    Completed {
        video_id: Uuid,
        resource_id: String,
        encoded_location: String,
    },
    Error {
        video_id: Option<Uuid>,
        resource_id: Option<String>,
        message: String,
    },
    Unrecognized {
        reason: String,
    },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
enum EncoderMessage {
    Completed {
        id: String,
        video: EncodedVideo,
    },
    Error {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        message: String,
        #[serde(default, alias = "resourceId")]
        resource_id: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct EncodedVideo {
    #[serde(alias = "resourceId")]
    resource_id: String,
    #[serde(alias = "encodedVideoFolder")]
    encoded_video_folder: String,
    #[serde(alias = "filePath")]
    file_path: String,
}

/// Decode a raw payload. Never fails; undecodable input becomes `Unrecognized`.
pub fn decode_encoder_event(payload: &[u8]) -> EncoderEvent {
    let message: EncoderMessage = match serde_json::from_slice(payload) {
        Ok(message) => message,
        Err(e) => {
            return EncoderEvent::Unrecognized {
                reason: format!("invalid encoder message: {e}"),
            }
        }
    };

    match message {
        EncoderMessage::Completed { id, video } => match Uuid::parse_str(&id) {
            Ok(video_id) => EncoderEvent::Completed {
                video_id,
                resource_id: video.resource_id,
                encoded_location: encoded_location(&video.encoded_video_folder, &video.file_path),
            },
            Err(_) => EncoderEvent::Unrecognized {
                reason: format!("invalid video id: {id}"),
            },
        },
        EncoderMessage::Error {
            id,
            message,
            resource_id,
        } => {
            let parsed = id.as_deref().map(Uuid::parse_str).transpose();
            let video_id = match parsed {
                Ok(video_id) => video_id,
                Err(_) => {
                    return EncoderEvent::Unrecognized {
                        reason: format!("invalid video id: {}", id.unwrap_or_default()),
                    }
                }
            };
            EncoderEvent::Error {
                video_id,
                resource_id,
                message,
            }
        }
    }
}
