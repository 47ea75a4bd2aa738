/// HTTP handlers for media endpoints
///
/// This module contains handlers for:
/// - Media: raw uploads into a video's media slots
/// - Health: liveness and readiness checks
pub mod health;
pub mod media;

use actix_web::web;

pub use health::{health, liveness, readiness};
pub use media::upload_media;

/// Register all routes of the service
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/metrics", web::get().to(crate::metrics::metrics_handler))
        .service(
            web::scope("/api/v1")
                .route("/health", web::get().to(health))
                .route("/health/live", web::get().to(liveness))
                .route("/health/ready", web::get().to(readiness))
                .route(
                    "/videos/{id}/medias/{kind}",
                    web::put().to(upload_media),
                ),
        );
}
