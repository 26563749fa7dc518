use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;

use crate::domain::order::Order;
use crate::messaging::{InboundMessage, MessageSource};
use crate::metrics::Metrics;
use crate::service::{CreateOutcome, OrderService};
use crate::utils::{Backoff, BackoffConfig};

// ============================================================================
// Order Consumer - Drives ingestion from the message stream
// ============================================================================
//
// For each inbound message:
// 1. Decode the payload as an Order      (failure: drop, never retried)
// 2. Validate the Order                  (failure: drop, never retried)
// 3. Hand it to OrderService::create_order (failure: logged; redelivery is
//    the transport's job)
//
// Transport read errors are logged and retried after an exponential
// backoff. The only way out of the loop is the shutdown signal, which is
// honoured while waiting for a message or backing off, never in the middle
// of processing one.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Running,
    Stopped,
}

/// How a single inbound message was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    Created,
    Duplicate,
    DecodeError,
    Invalid,
    StoreError,
}

impl MessageOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageOutcome::Created => "created",
            MessageOutcome::Duplicate => "duplicate",
            MessageOutcome::DecodeError => "decode_error",
            MessageOutcome::Invalid => "invalid",
            MessageOutcome::StoreError => "store_error",
        }
    }
}

const TRANSPORT_ERROR: &str = "transport_error";

/// Resolves once shutdown is requested or the signal's sender is gone.
async fn stop_requested(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

/// Decode → validate → store for one message. Kept apart from the source
/// so the loop only ever needs `Send` from it.
struct MessageHandler {
    service: Arc<OrderService>,
    metrics: Arc<Metrics>,
}

pub struct OrderConsumer<S> {
    source: S,
    handler: MessageHandler,
    metrics: Arc<Metrics>,
    backoff: Backoff,
    state: ConsumerState,
}

impl<S: MessageSource> OrderConsumer<S> {
    pub fn new(source: S, service: Arc<OrderService>, metrics: Arc<Metrics>) -> Self {
        Self {
            source,
            handler: MessageHandler { service, metrics: metrics.clone() },
            metrics,
            backoff: Backoff::new(BackoffConfig::default()),
            state: ConsumerState::Stopped,
        }
    }

    pub fn with_backoff(mut self, config: BackoffConfig) -> Self {
        self.backoff = Backoff::new(config);
        self
    }

    pub fn state(&self) -> ConsumerState {
        self.state
    }

    /// Consume until `shutdown` turns true (or its sender is dropped).
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        self.state = ConsumerState::Running;
        tracing::info!("Order consumer started");

        loop {
            let received = tokio::select! {
                biased;
                _ = stop_requested(&mut shutdown) => break,
                received = self.source.recv() => received,
            };

            match received {
                Ok(message) => {
                    self.backoff.reset();
                    self.handler.handle(message).await;
                }
                Err(e) => {
                    let delay = self.backoff.next_delay();
                    self.metrics.record_outcome(TRANSPORT_ERROR);
                    tracing::error!(
                        error = %e,
                        consecutive_failures = self.backoff.failures(),
                        retry_in_ms = delay.as_millis() as u64,
                        "Message read failed"
                    );

                    tokio::select! {
                        biased;
                        _ = stop_requested(&mut shutdown) => break,
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        self.state = ConsumerState::Stopped;
        tracing::info!("Order consumer stopped");
    }
}

impl MessageHandler {
    async fn handle(&self, message: InboundMessage) -> MessageOutcome {
        let started = Instant::now();
        let outcome = self.process(&message).await;

        self.metrics.observe_processing(started.elapsed().as_secs_f64());
        self.metrics.record_outcome(outcome.as_str());

        outcome
    }

    async fn process(&self, message: &InboundMessage) -> MessageOutcome {
        let mut order = match Order::decode(&message.payload) {
            Ok(order) => order,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    topic = %message.topic,
                    partition = message.partition,
                    offset = message.offset,
                    "Dropping undecodable message"
                );
                return MessageOutcome::DecodeError;
            }
        };

        if let Err(e) = order.validate() {
            tracing::warn!(
                error = %e,
                order_uid = %order.order_uid,
                topic = %message.topic,
                partition = message.partition,
                offset = message.offset,
                "Dropping invalid order"
            );
            return MessageOutcome::Invalid;
        }

        order.normalize_date_created();

        let order_uid = order.order_uid.clone();
        match self.service.create_order(order).await {
            Ok(CreateOutcome::Created) => MessageOutcome::Created,
            Ok(CreateOutcome::AlreadyExists) => MessageOutcome::Duplicate,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    order_uid = %order_uid,
                    topic = %message.topic,
                    partition = message.partition,
                    offset = message.offset,
                    "Failed to process message"
                );
                MessageOutcome::StoreError
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
