// ============================================================================
// Consumer Module
// ============================================================================
//
// The consumption loop that turns inbound messages into stored orders.
//
// ============================================================================

mod order_consumer;

pub use order_consumer::OrderConsumer;
