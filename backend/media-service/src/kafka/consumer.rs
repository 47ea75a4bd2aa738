//! Kafka consumer for encoder results
//!
//! Offsets are committed manually and only once an event was fully handled.
//! A transiently failed event is not committed: the consumer backs off, seeks
//! the partition back to it and processes it again, so redelivery is the only
//! retry mechanism. Failures no retry can fix are logged and committed.

use std::sync::Arc;
use std::time::Duration;

use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::{BorrowedMessage, Message};
use rdkafka::{ClientConfig, Offset};
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::events::{decode_encoder_event, EncoderEvent};
use crate::config::{KafkaConfig, RetryConfig};
use crate::metrics::EncodingObserver;
use crate::services::{MediaStatusReconciler, ReconcileCommand};

const SEEK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("Kafka error: {0}")]
    Kafka(#[from] rdkafka::error::KafkaError),
}

/// What to do with a consumed message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Commit the offset; the message will not be seen again
    Ack,
    /// Leave the offset uncommitted and redeliver the message
    Retry,
}

/// Transport independent handling of one encoder message
pub struct EncoderEventHandler {
    reconciler: Arc<MediaStatusReconciler>,
    observer: Arc<dyn EncodingObserver>,
}

impl EncoderEventHandler {
    pub fn new(reconciler: Arc<MediaStatusReconciler>, observer: Arc<dyn EncodingObserver>) -> Self {
        Self {
            reconciler,
            observer,
        }
    }

    pub async fn handle(&self, payload: &[u8]) -> Disposition {
        match decode_encoder_event(payload) {
            EncoderEvent::Completed {
                video_id,
                resource_id,
                encoded_location,
            } => {
                let command =
                    ReconcileCommand::completed(video_id, resource_id.clone(), encoded_location);
                match self.reconciler.reconcile(command).await {
                    Ok(outcome) => {
                        debug!(video_id = %video_id, outcome = ?outcome, "Encoder result reconciled");
                        Disposition::Ack
                    }
                    Err(e) if e.is_transient() => {
                        warn!(
                            video_id = %video_id,
                            resource_id = %resource_id,
                            error = %e,
                            "Failed to reconcile encoder result"
                        );
                        Disposition::Retry
                    }
                    Err(e) => {
                        self.observer
                            .unprocessable_event(video_id, &resource_id, &e.to_string());
                        Disposition::Ack
                    }
                }
            }
            EncoderEvent::Error {
                video_id,
                resource_id,
                message,
            } => {
                self.observer
                    .encoder_error(video_id, resource_id.as_deref(), &message);
                Disposition::Ack
            }
            EncoderEvent::Unrecognized { reason } => {
                self.observer.unrecognized_event(&reason);
                Disposition::Ack
            }
        }
    }
}

/// Redelivery bookkeeping for the message currently being retried
#[derive(Debug, Default)]
struct RedeliveryState {
    current: Option<(String, i32, i64)>,
    attempt: u32,
}

impl RedeliveryState {
    /// Zero based attempt number for this message
    fn next_attempt(&mut self, topic: &str, partition: i32, offset: i64) -> u32 {
        let key = (topic.to_string(), partition, offset);
        if self.current.as_ref() == Some(&key) {
            self.attempt = self.attempt.saturating_add(1);
        } else {
            self.current = Some(key);
            self.attempt = 0;
        }
        self.attempt
    }

    /// Forget the retried message once it is acknowledged
    ///
    /// Acks of other messages (another partition) leave the count alone.
    fn acked(&mut self, topic: &str, partition: i32, offset: i64) {
        let is_current = matches!(
            &self.current,
            Some((t, p, o)) if t == topic && *p == partition && *o == offset
        );
        if is_current {
            self.current = None;
            self.attempt = 0;
        }
    }
}

/// Kafka consumer driving the encoder event handler
pub struct EncoderEventConsumer {
    consumer: StreamConsumer,
    handler: EncoderEventHandler,
    observer: Arc<dyn EncodingObserver>,
    retry: RetryConfig,
    shutdown_rx: watch::Receiver<bool>,
}

impl EncoderEventConsumer {
    pub fn new(
        config: &KafkaConfig,
        handler: EncoderEventHandler,
        observer: Arc<dyn EncodingObserver>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> Result<Self, ConsumerError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("enable.partition.eof", "false")
            .set("session.timeout.ms", "45000")
            .set("max.poll.interval.ms", "300000")
            .create()?;

        consumer.subscribe(&[&config.encoder_events_topic])?;

        info!(
            brokers = %config.brokers,
            topic = %config.encoder_events_topic,
            group_id = %config.group_id,
            "Encoder event consumer initialized"
        );

        Ok(Self {
            consumer,
            handler,
            observer,
            retry: config.retry.clone(),
            shutdown_rx,
        })
    }

    /// Run until the shutdown signal fires.
    ///
    /// Returns an error only when a failed message cannot be rewound; carrying
    /// on at that point would commit past it.
    pub async fn run(&mut self) -> Result<(), ConsumerError> {
        use futures::StreamExt;

        let Self {
            consumer,
            handler,
            observer,
            retry,
            shutdown_rx,
        } = self;

        info!("Starting encoder event consumer loop");

        let mut redelivery = RedeliveryState::default();
        let mut message_stream = consumer.stream();

        loop {
            tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping consumer");
                        break;
                    }
                }

                message = message_stream.next() => {
                    let msg = match message {
                        Some(Ok(msg)) => msg,
                        Some(Err(e)) => {
                            error!(error = %e, "Kafka consumer error");
                            continue;
                        }
                        None => {
                            warn!("Message stream ended unexpectedly");
                            break;
                        }
                    };

                    let disposition = handler.handle(msg.payload().unwrap_or_default()).await;
                    match disposition {
                        Disposition::Ack => {
                            redelivery.acked(msg.topic(), msg.partition(), msg.offset());
                            if let Err(e) = consumer.commit_message(&msg, CommitMode::Async) {
                                warn!(error = %e, offset = msg.offset(), "Failed to commit offset");
                            }
                        }
                        Disposition::Retry => {
                            let attempt =
                                redelivery.next_attempt(msg.topic(), msg.partition(), msg.offset());
                            let backoff = retry.backoff(attempt);
                            observer.retry_scheduled(attempt, backoff);

                            tokio::select! {
                                _ = tokio::time::sleep(backoff) => {}
                                changed = shutdown_rx.changed() => {
                                    if changed.is_err() || *shutdown_rx.borrow() {
                                        info!("Shutdown signal received during backoff, stopping consumer");
                                        break;
                                    }
                                }
                            }

                            rewind(consumer, &msg)?;
                        }
                    }
                }
            }
        }

        info!("Encoder event consumer stopped");
        Ok(())
    }
}

fn rewind(consumer: &StreamConsumer, msg: &BorrowedMessage<'_>) -> Result<(), ConsumerError> {
    consumer.seek(
        msg.topic(),
        msg.partition(),
        Offset::Offset(msg.offset()),
        SEEK_TIMEOUT,
    )?;
    debug!(
        topic = msg.topic(),
        partition = msg.partition(),
        offset = msg.offset(),
        "Rewound partition for redelivery"
    );
    Ok(())
}
