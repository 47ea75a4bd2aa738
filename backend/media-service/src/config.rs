/// Configuration management for media-service
///
/// Loads configuration from environment variables with sensible defaults.
use serde::Deserialize;
use std::time::Duration;
use video_core::constants::DEFAULT_MAX_MEDIA_SIZE;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub kafka: KafkaConfig,
    pub s3: S3Config,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub env: String,
    pub max_upload_bytes: usize,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct KafkaConfig {
    pub brokers: String,
    pub encoder_events_topic: String,
    pub group_id: String,
    pub retry: RetryConfig,
}

/// Backoff applied before an unacknowledged encoder event is redelivered
#[derive(Clone, Debug, Deserialize)]
pub struct RetryConfig {
    pub backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            backoff_ms: 500,
            max_backoff_ms: 30_000,
        }
    }
}

impl RetryConfig {
    /// Exponential backoff for the given (zero based) redelivery attempt, capped
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt);
        let backoff = self.backoff_ms.saturating_mul(factor);
        Duration::from_millis(backoff.min(self.max_backoff_ms))
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let topic_prefix =
            std::env::var("KAFKA_TOPIC_PREFIX").unwrap_or_else(|_| "catalog".to_string());
        let retry_defaults = RetryConfig::default();

        Ok(Config {
            app: AppConfig {
                host: std::env::var("MEDIA_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("MEDIA_SERVICE_PORT")
                    .unwrap_or_else(|_| "8082".to_string())
                    .parse()?,
                env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                max_upload_bytes: upload_limit(env_parse(
                    "MEDIA_MAX_UPLOAD_BYTES",
                    DEFAULT_MAX_MEDIA_SIZE,
                )),
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/catalog".to_string()),
                max_connections: env_parse("DATABASE_MAX_CONNECTIONS", 10),
                run_migrations: env_parse("RUN_MIGRATIONS", false),
            },
            kafka: KafkaConfig {
                brokers: std::env::var("KAFKA_BROKERS")
                    .unwrap_or_else(|_| "localhost:9092".to_string()),
                encoder_events_topic: std::env::var("KAFKA_ENCODER_EVENTS_TOPIC")
                    .unwrap_or_else(|_| format!("{}.video.encoded", topic_prefix)),
                group_id: std::env::var("KAFKA_ENCODER_GROUP_ID")
                    .unwrap_or_else(|_| "media-encoding-reconciler".to_string()),
                retry: RetryConfig {
                    backoff_ms: env_parse("ENCODER_RETRY_BACKOFF_MS", retry_defaults.backoff_ms),
                    max_backoff_ms: env_parse(
                        "ENCODER_RETRY_MAX_BACKOFF_MS",
                        retry_defaults.max_backoff_ms,
                    ),
                },
            },
            s3: S3Config {
                bucket: std::env::var("S3_BUCKET").unwrap_or_else(|_| "catalog-videos".to_string()),
                region: std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                endpoint: std::env::var("S3_ENDPOINT").ok(),
            },
        })
    }
}

/// Clamp a configured byte limit to what the platform can address
fn upload_limit(bytes: u64) -> usize {
    usize::try_from(bytes).unwrap_or(usize::MAX)
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
