// Private module declaration
mod server;

use prometheus::{Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Message consumption outcomes (created, duplicate, dropped, failed)
// - End-to-end processing latency per message
// - Cache hit/miss ratio and occupancy
// - Cache warm-up at startup
//
// The registry is owned here and passed explicitly to the components that
// record into it. Scraped via /metrics on the metrics server.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Consumption Metrics
    pub orders_consumed: IntCounterVec,
    pub processing_duration: Histogram,

    // Cache Metrics
    pub cache_requests: IntCounterVec,
    pub cache_entries: IntGauge,
    pub warmup_orders_loaded: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Consumption Metrics
        let orders_consumed = IntCounterVec::new(
            Opts::new("orders_consumed_total", "Inbound order messages by processing outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(orders_consumed.clone()))?;

        let processing_duration = Histogram::with_opts(
            HistogramOpts::new(
                "order_processing_duration_seconds",
                "Time to decode, validate and store one inbound order",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;
        registry.register(Box::new(processing_duration.clone()))?;

        // Cache Metrics
        let cache_requests = IntCounterVec::new(
            Opts::new("cache_requests_total", "Order lookups by cache result"),
            &["result"],
        )?;
        registry.register(Box::new(cache_requests.clone()))?;

        let cache_entries = IntGauge::new("cache_entries", "Orders currently held in the cache")?;
        registry.register(Box::new(cache_entries.clone()))?;

        let warmup_orders_loaded = IntGauge::new(
            "warmup_orders_loaded",
            "Orders loaded into the cache at startup",
        )?;
        registry.register(Box::new(warmup_orders_loaded.clone()))?;

        Ok(Self {
            registry,
            orders_consumed,
            processing_duration,
            cache_requests,
            cache_entries,
            warmup_orders_loaded,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Helper to record how one inbound message was handled
    pub fn record_outcome(&self, outcome: &str) {
        self.orders_consumed.with_label_values(&[outcome]).inc();
    }

    pub fn observe_processing(&self, duration_secs: f64) {
        self.processing_duration.observe(duration_secs);
    }

    /// Helper to record a read-path cache lookup
    pub fn record_cache_lookup(&self, hit: bool) {
        let result = if hit { "hit" } else { "miss" };
        self.cache_requests.with_label_values(&[result]).inc();
    }

    pub fn set_cache_entries(&self, entries: usize) {
        self.cache_entries.set(entries as i64);
    }

    pub fn set_warmup_loaded(&self, loaded: usize) {
        self.warmup_orders_loaded.set(loaded as i64);
    }
}
