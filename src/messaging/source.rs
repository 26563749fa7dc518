use async_trait::async_trait;
use rdkafka::error::KafkaError;

/// One raw record pulled from the transport, detached from the client's
/// buffers.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub payload: Vec<u8>,
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("kafka error: {0}")]
    Kafka(#[from] KafkaError),

    #[error("message source closed")]
    Closed,
}

/// Pull-based message stream.
///
/// `recv` waits until a message is available. It is cancel-safe: dropping
/// the future before it resolves loses no message, so callers may race it
/// against a shutdown signal.
#[async_trait]
pub trait MessageSource: Send {
    async fn recv(&mut self) -> Result<InboundMessage, TransportError>;
}
