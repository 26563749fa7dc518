use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

use super::lru::LruCache;
use crate::domain::order::Order;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CacheError {
    #[error("cache capacity must be positive")]
    ZeroCapacity,
}

/// Key→order lookup shared between ingestion and the read path.
pub trait OrderCache: Send + Sync {
    fn get(&self, order_uid: &str) -> Option<Arc<Order>>;

    fn put(&self, order_uid: String, order: Arc<Order>);

    fn delete(&self, order_uid: &str);

    fn capacity(&self) -> usize;

    fn len(&self) -> usize;
}

/// Fixed-capacity LRU cache with one lock per instance.
///
/// Every operation holds the lock for a single O(1) step and performs no
/// I/O, so callers never wait on anything but another cache operation.
pub struct BoundedCache<V> {
    inner: Mutex<LruCache<String, V>>,
    capacity: usize,
}

impl<V: Clone> BoundedCache<V> {
    pub fn new(capacity: usize) -> Result<Self, CacheError> {
        let capacity = NonZeroUsize::new(capacity).ok_or(CacheError::ZeroCapacity)?;
        Ok(Self {
            inner: Mutex::new(LruCache::new(capacity)),
            capacity: capacity.get(),
        })
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.lock().get(key).cloned()
    }

    pub fn put(&self, key: String, value: V) {
        if let Some((evicted, _)) = self.inner.lock().put(key, value) {
            tracing::trace!(key = %evicted, "Evicted least recently used entry");
        }
    }

    pub fn delete(&self, key: &str) {
        self.inner.lock().remove(key);
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }
}

impl OrderCache for BoundedCache<Arc<Order>> {
    fn get(&self, order_uid: &str) -> Option<Arc<Order>> {
        BoundedCache::get(self, order_uid)
    }

    fn put(&self, order_uid: String, order: Arc<Order>) {
        BoundedCache::put(self, order_uid, order)
    }

    fn delete(&self, order_uid: &str) {
        BoundedCache::delete(self, order_uid)
    }

    fn capacity(&self) -> usize {
        BoundedCache::capacity(self)
    }

    fn len(&self) -> usize {
        BoundedCache::len(self)
    }
}
