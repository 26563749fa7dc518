use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    consumer::{Consumer, StreamConsumer},
    Message,
};

use super::source::{InboundMessage, MessageSource, TransportError};
use crate::config::KafkaConfig;

/// Kafka-backed [`MessageSource`].
///
/// Offsets are auto-committed by the group, which gives at-least-once
/// delivery; idempotency is handled downstream by the order service.
pub struct KafkaSource {
    consumer: StreamConsumer,
}

impl KafkaSource {
    pub fn new(config: &KafkaConfig) -> Result<Self, TransportError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", config.brokers.join(","))
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "10000")
            .create()?;

        consumer.subscribe(&[config.topic.as_str()])?;

        tracing::info!(
            brokers = %config.brokers.join(","),
            topic = %config.topic,
            group_id = %config.group_id,
            "Subscribed to Kafka topic"
        );

        Ok(Self { consumer })
    }
}

#[async_trait]
impl MessageSource for KafkaSource {
    async fn recv(&mut self) -> Result<InboundMessage, TransportError> {
        let message = self.consumer.recv().await?;

        Ok(InboundMessage {
            payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
            topic: message.topic().to_string(),
            partition: message.partition(),
            offset: message.offset(),
        })
    }
}
