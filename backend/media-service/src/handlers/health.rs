/// Health checks
use actix_web::{web, HttpResponse};
use sqlx::PgPool;

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "ok", "service": "media-service"}))
}

pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().finish()
}

/// Ready once the database answers. Without a pool (tests) the service is
/// considered ready.
pub async fn readiness(pool: Option<web::Data<PgPool>>) -> HttpResponse {
    let Some(pool) = pool else {
        return HttpResponse::Ok().finish();
    };

    match sqlx::query("SELECT 1").execute(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().finish(),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            HttpResponse::ServiceUnavailable().finish()
        }
    }
}
