// ============================================================================
// Service Layer
// ============================================================================
//
// Ingestion (idempotent create + cache fill) and the cache-aside read path.
//
// ============================================================================

mod order_service;

pub use order_service::{CreateOutcome, OrderService, ServiceError};
