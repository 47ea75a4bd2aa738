//! Video core models and types
//!
//! Shared domain types for the media service: media slots, their encoding
//! state machine, and the video aggregate that owns them.

pub mod constants;
pub mod error;
pub mod media;
pub mod models;

pub use error::{MediaError, MediaResult};
pub use media::*;
pub use models::*;
