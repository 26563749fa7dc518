// ============================================================================
// Order Domain
// ============================================================================
//
// This module contains ALL Order-specific code:
// - Value objects (Delivery, Payment, Item)
// - Aggregate (Order, payload decoding and validation rules)
// - Errors (ValidationError, DecodeError)
//
// Persistence and caching live elsewhere; nothing here performs I/O.
//
// ============================================================================

pub mod value_objects;
pub mod errors;
pub mod aggregate;

// Re-export for convenience
pub use value_objects::*;
pub use errors::*;
pub use aggregate::*;
