/// Encoder result channel
///
/// - `events`: wire format of encoder results and its decoding
/// - `consumer`: Kafka consumer that drives the reconciler and decides ack/redelivery
pub mod consumer;
pub mod events;

pub use consumer::{ConsumerError, Disposition, EncoderEventConsumer, EncoderEventHandler};
pub use events::{decode_encoder_event, EncoderEvent};
