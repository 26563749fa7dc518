// ============================================================================
// Cache Module
// ============================================================================
//
// In-process, bounded LRU cache of orders. Single-node only: nothing here
// coordinates with other replicas.
//
// ============================================================================

mod bounded;
mod lru;

pub use bounded::{BoundedCache, OrderCache};
