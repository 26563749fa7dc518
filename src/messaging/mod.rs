// ============================================================================
// Messaging Module
// ============================================================================
//
// Inbound transport: the MessageSource abstraction and its Kafka
// implementation.
//
// ============================================================================

mod kafka;
mod source;

pub use kafka::KafkaSource;
pub use source::{InboundMessage, MessageSource, TransportError};
