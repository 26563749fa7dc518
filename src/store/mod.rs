// ============================================================================
// Durable Store
// ============================================================================
//
// Repository abstraction over the relational order store.
//
// Contract:
// - create_order is all-or-nothing across the order and its sub-entities
// - a second write of an existing order_uid fails with Duplicate
// - get_order distinguishes NotFound from every other failure
// - get_last_orders returns newest first by date_created, ties by order_uid
//
// ============================================================================

mod order_store;
#[cfg(test)]
pub(crate) mod memory;

pub use order_store::PostgresOrderRepository;

use async_trait::async_trait;

use crate::domain::order::Order;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("order not found: {0}")]
    NotFound(String),

    #[error("order already exists: {0}")]
    Duplicate(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn create_order(&self, order: &Order) -> Result<(), RepositoryError>;

    async fn get_order(&self, order_uid: &str) -> Result<Order, RepositoryError>;

    async fn exists(&self, order_uid: &str) -> Result<bool, RepositoryError>;

    async fn get_last_orders(&self, limit: usize) -> Result<Vec<Order>, RepositoryError>;
}
