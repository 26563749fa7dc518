// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// The order aggregate and the rules a record must satisfy before it may be
// persisted. This layer knows nothing about Kafka, PostgreSQL or HTTP.
//
// ============================================================================

pub mod order;
