//! Media Service
//!
//! Stores raw video media, attaches it to catalog videos and reconciles the
//! results reported by the external encoder.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod kafka;
pub mod metrics;
pub mod services;
pub mod storage;

// Public re-exports
pub use config::Config;
pub use error::{AppError, Result};
