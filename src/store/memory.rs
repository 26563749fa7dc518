//! In-memory [`OrderRepository`] used by unit tests.
//!
//! Counts every call and can be told to fail individual operations, which is
//! how the service and consumer tests observe store traffic.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::{OrderRepository, RepositoryError};
use crate::domain::order::Order;

#[derive(Default)]
pub(crate) struct MemoryOrderRepository {
    orders: Mutex<HashMap<String, Order>>,
    pub create_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub exists_calls: AtomicUsize,
    pub fail_create: AtomicBool,
    pub fail_get: AtomicBool,
    pub fail_exists: AtomicBool,
    /// Make `exists` answer false for stored keys, as if a concurrent
    /// writer committed between the check and the insert.
    pub stale_exists: AtomicBool,
}

impl MemoryOrderRepository {
    pub fn with_orders(orders: impl IntoIterator<Item = Order>) -> Self {
        let repo = Self::default();
        {
            let mut stored = repo.orders.lock();
            for order in orders {
                stored.insert(order.order_uid.clone(), order);
            }
        }
        repo
    }

    pub fn len(&self) -> usize {
        self.orders.lock().len()
    }

    pub fn contains(&self, order_uid: &str) -> bool {
        self.orders.lock().contains_key(order_uid)
    }

    fn unavailable() -> RepositoryError {
        RepositoryError::Database(sqlx::Error::PoolTimedOut)
    }
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn create_order(&self, order: &Order) -> Result<(), RepositoryError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }

        let mut orders = self.orders.lock();
        if orders.contains_key(&order.order_uid) {
            return Err(RepositoryError::Duplicate(order.order_uid.clone()));
        }
        orders.insert(order.order_uid.clone(), order.clone());
        Ok(())
    }

    async fn get_order(&self, order_uid: &str) -> Result<Order, RepositoryError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }

        self.orders
            .lock()
            .get(order_uid)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound(order_uid.to_string()))
    }

    async fn exists(&self, order_uid: &str) -> Result<bool, RepositoryError> {
        self.exists_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_exists.load(Ordering::SeqCst) {
            return Err(Self::unavailable());
        }
        if self.stale_exists.load(Ordering::SeqCst) {
            return Ok(false);
        }

        Ok(self.orders.lock().contains_key(order_uid))
    }

    async fn get_last_orders(&self, limit: usize) -> Result<Vec<Order>, RepositoryError> {
        let mut orders: Vec<Order> = self.orders.lock().values().cloned().collect();
        orders.sort_by(|a, b| {
            let a_ts = a.created_at().expect("stored orders are validated");
            let b_ts = b.created_at().expect("stored orders are validated");
            b_ts.cmp(&a_ts).then_with(|| a.order_uid.cmp(&b.order_uid))
        });
        orders.truncate(limit);
        Ok(orders)
    }
}
