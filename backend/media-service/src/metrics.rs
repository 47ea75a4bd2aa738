//! Encoding observability
//!
//! The reconciler and the encoder consumer report what happened to each
//! event through [`EncodingObserver`]. The production implementation logs
//! with `tracing` and counts in Prometheus.

use actix_web::{HttpResponse, Responder};
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;
use video_core::{EncodingStatus, MediaKind, Transition};

/// Sink for reconciliation and consumer events
pub trait EncodingObserver: Send + Sync {
    /// A transition was applied to (or skipped on) a slot
    fn transition(
        &self,
        video_id: Uuid,
        kind: MediaKind,
        status: EncodingStatus,
        transition: Transition,
    );

    /// The event referenced a video that does not exist
    fn video_not_found(&self, video_id: Uuid, resource_id: &str);

    /// No audio/video slot of the video holds the resource any more
    fn stale_resource(&self, video_id: Uuid, resource_id: &str);

    /// The encoder reported a failure
    fn encoder_error(&self, video_id: Option<Uuid>, resource_id: Option<&str>, message: &str);

    fn unrecognized_event(&self, reason: &str);

    /// Processing failed in a way redelivery cannot fix; the event is dropped
    fn unprocessable_event(&self, video_id: Uuid, resource_id: &str, reason: &str);

    /// Processing failed and the event will be redelivered after `backoff`
    fn retry_scheduled(&self, attempt: u32, backoff: Duration);
}

/// Prometheus + tracing observer
#[derive(Clone)]
pub struct EncodingMetrics {
    transitions: IntCounterVec,
    video_not_found: IntCounter,
    stale_events: IntCounter,
    encoder_errors: IntCounter,
    unrecognized_events: IntCounter,
    unprocessable_events: IntCounter,
    retries: IntCounter,
}

impl EncodingMetrics {
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let transitions = IntCounterVec::new(
            Opts::new(
                "media_encoding_transitions_total",
                "Encoding status updates by slot kind, target status and result",
            ),
            &["kind", "status", "result"],
        )?;
        let video_not_found = IntCounter::new(
            "media_encoding_video_not_found_total",
            "Encoding events referencing a missing video",
        )?;
        let stale_events = IntCounter::new(
            "media_encoding_stale_events_total",
            "Encoding events whose resource is no longer attached",
        )?;
        let encoder_errors = IntCounter::new(
            "media_encoder_errors_total",
            "Failures reported by the external encoder",
        )?;
        let unrecognized_events = IntCounter::new(
            "media_encoding_unrecognized_events_total",
            "Encoder messages that could not be decoded",
        )?;
        let unprocessable_events = IntCounter::new(
            "media_encoding_unprocessable_events_total",
            "Encoder events dropped because the stored video cannot be read",
        )?;
        let retries = IntCounter::new(
            "media_encoding_retries_total",
            "Encoder events scheduled for redelivery after a failed reconcile",
        )?;

        for metric in [
            Box::new(transitions.clone()) as Box<dyn prometheus::core::Collector>,
            Box::new(video_not_found.clone()),
            Box::new(stale_events.clone()),
            Box::new(encoder_errors.clone()),
            Box::new(unrecognized_events.clone()),
            Box::new(unprocessable_events.clone()),
            Box::new(retries.clone()),
        ] {
            if let Err(e) = registry.register(metric) {
                warn!("Failed to register encoding metric: {}", e);
            }
        }

        Ok(Self {
            transitions,
            video_not_found,
            stale_events,
            encoder_errors,
            unrecognized_events,
            unprocessable_events,
            retries,
        })
    }

    pub fn transitions_total(&self, kind: MediaKind, status: EncodingStatus, result: &str) -> u64 {
        self.transitions
            .with_label_values(&[kind.as_str(), status.as_str(), result])
            .get()
    }

    pub fn stale_events_total(&self) -> u64 {
        self.stale_events.get()
    }

    pub fn encoder_errors_total(&self) -> u64 {
        self.encoder_errors.get()
    }

    pub fn unprocessable_events_total(&self) -> u64 {
        self.unprocessable_events.get()
    }
}

impl EncodingObserver for EncodingMetrics {
    fn transition(
        &self,
        video_id: Uuid,
        kind: MediaKind,
        status: EncodingStatus,
        transition: Transition,
    ) {
        let result = match transition {
            Transition::Applied => "applied",
            Transition::Unchanged => "unchanged",
        };
        self.transitions
            .with_label_values(&[kind.as_str(), status.as_str(), result])
            .inc();

        if transition.is_applied() {
            info!(video_id = %video_id, kind = %kind, status = %status, "Media encoding status updated");
        } else {
            debug!(video_id = %video_id, kind = %kind, status = %status, "Encoding update already applied");
        }
    }

    fn video_not_found(&self, video_id: Uuid, resource_id: &str) {
        self.video_not_found.inc();
        warn!(video_id = %video_id, resource_id = %resource_id, "Video not found for encoding event, dropping");
    }

    fn stale_resource(&self, video_id: Uuid, resource_id: &str) {
        self.stale_events.inc();
        debug!(video_id = %video_id, resource_id = %resource_id, "No slot holds resource, dropping stale encoding event");
    }

    fn encoder_error(&self, video_id: Option<Uuid>, resource_id: Option<&str>, message: &str) {
        self.encoder_errors.inc();
        warn!(
            video_id = ?video_id,
            resource_id = ?resource_id,
            error = %message,
            "Encoder reported an error"
        );
    }

    fn unrecognized_event(&self, reason: &str) {
        self.unrecognized_events.inc();
        warn!(reason = %reason, "Unrecognized encoder message, skipping");
    }

    fn unprocessable_event(&self, video_id: Uuid, resource_id: &str, reason: &str) {
        self.unprocessable_events.inc();
        error!(
            video_id = %video_id,
            resource_id = %resource_id,
            error = %reason,
            "Encoder event cannot be processed, acknowledging without retry"
        );
    }

    fn retry_scheduled(&self, attempt: u32, backoff: Duration) {
        self.retries.inc();
        warn!(
            attempt,
            backoff_ms = backoff.as_millis() as u64,
            "Encoder event not acknowledged, will be redelivered"
        );
    }
}

/// Handler that serialises Prometheus metrics in text format.
pub async fn metrics_handler() -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => HttpResponse::Ok()
            .content_type(encoder.format_type())
            .body(buffer),
        Err(err) => HttpResponse::InternalServerError().body(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_track_observed_events() {
        let registry = Registry::new();
        let metrics = EncodingMetrics::new(&registry).unwrap();
        let id = Uuid::new_v4();

        metrics.transition(id, MediaKind::Video, EncodingStatus::Completed, Transition::Applied);
        metrics.transition(id, MediaKind::Video, EncodingStatus::Completed, Transition::Unchanged);
        metrics.stale_resource(id, "r-old");
        metrics.encoder_error(Some(id), None, "codec not supported");
        metrics.unprocessable_event(id, "r-1", "unknown rating code: X");

        assert_eq!(
            metrics.transitions_total(MediaKind::Video, EncodingStatus::Completed, "applied"),
            1
        );
        assert_eq!(
            metrics.transitions_total(MediaKind::Video, EncodingStatus::Completed, "unchanged"),
            1
        );
        assert_eq!(metrics.stale_events_total(), 1);
        assert_eq!(metrics.encoder_errors_total(), 1);
        assert_eq!(metrics.unprocessable_events_total(), 1);
        assert_eq!(registry.gather().len(), 7);
    }

    #[test]
    fn test_duplicate_registration_is_tolerated() {
        let registry = Registry::new();
        let first = EncodingMetrics::new(&registry);
        let second = EncodingMetrics::new(&registry);
        assert!(first.is_ok());
        assert!(second.is_ok());
    }
}
