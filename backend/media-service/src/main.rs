/// Media Service - HTTP server and encoder result consumer
///
/// Accepts raw media uploads over HTTP and keeps video slots in sync with
/// the results the external encoder publishes on Kafka.
use actix_web::{middleware as actix_middleware, web, App, HttpServer};
use anyhow::{anyhow, Context};
use media_service::db::{PgVideoRepository, VideoRepository, MIGRATOR};
use media_service::handlers;
use media_service::kafka::{EncoderEventConsumer, EncoderEventHandler};
use media_service::metrics::{EncodingMetrics, EncodingObserver};
use media_service::services::{MediaStatusReconciler, MediaUploadService};
use media_service::storage::s3::get_s3_client;
use media_service::storage::{MediaResourceGateway, S3MediaGateway};
use media_service::Config;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,media_service=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = Config::from_env().map_err(|e| anyhow!("Failed to load configuration: {e}"))?;

    info!(
        host = %config.app.host,
        port = config.app.port,
        env = %config.app.env,
        "Media Service starting"
    );

    // Initialize database connection pool
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
        .context("Failed to connect to database")?;

    if config.database.run_migrations {
        MIGRATOR
            .run(&db_pool)
            .await
            .context("Failed to run database migrations")?;
        info!("Database migrations completed successfully");
    }

    let s3_client = get_s3_client(&config.s3).await;
    let gateway: Arc<dyn MediaResourceGateway> =
        Arc::new(S3MediaGateway::new(s3_client, &config.s3));
    let repository: Arc<dyn VideoRepository> = Arc::new(PgVideoRepository::new(db_pool.clone()));

    let observer: Arc<dyn EncodingObserver> = Arc::new(
        EncodingMetrics::new(prometheus::default_registry())
            .context("Failed to create encoding metrics")?,
    );

    // Encoder result consumer
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let reconciler = Arc::new(MediaStatusReconciler::new(
        repository.clone(),
        observer.clone(),
    ));
    let mut consumer = EncoderEventConsumer::new(
        &config.kafka,
        EncoderEventHandler::new(reconciler, observer.clone()),
        observer,
        shutdown_rx,
    )
    .context("Failed to create encoder event consumer")?;

    let consumer_task = actix_web::rt::spawn(async move {
        if let Err(e) = consumer.run().await {
            error!(error = %e, "Encoder event consumer terminated");
        }
    });

    // HTTP server
    let upload_service = web::Data::new(MediaUploadService::new(repository, gateway));
    let max_upload_bytes = config.app.max_upload_bytes;
    let http_pool = db_pool.clone();

    info!(
        "Media Service HTTP server listening on {}:{}",
        config.app.host, config.app.port
    );

    let server_result = HttpServer::new(move || {
        App::new()
            .app_data(upload_service.clone())
            .app_data(web::Data::new(http_pool.clone()))
            .app_data(web::PayloadConfig::new(max_upload_bytes))
            .wrap(actix_middleware::Logger::default())
            .configure(handlers::configure)
    })
    .bind((config.app.host.as_str(), config.app.port))?
    .run()
    .await;

    // Stop the consumer once the HTTP server is down
    let _ = shutdown_tx.send(true);
    if let Err(e) = consumer_task.await {
        error!(error = %e, "Encoder event consumer task failed");
    }
    db_pool.close().await;

    server_result.context("HTTP server error")?;
    info!("Media Service stopped");
    Ok(())
}
