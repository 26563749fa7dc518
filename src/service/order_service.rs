use std::sync::Arc;

use crate::cache::OrderCache;
use crate::domain::order::Order;
use crate::metrics::Metrics;
use crate::store::{OrderRepository, RepositoryError};

// ============================================================================
// Order Service
// ============================================================================
//
// Keeps the cache and the durable store consistent:
//
//   create_order:  exists? ──yes──► no-op success
//                     │no
//                     ▼
//                  store write ──duplicate──► no-op success
//                     │ok
//                     ▼
//                  cache fill
//
//   get_order:     cache ──hit──► return
//                     │miss
//                     ▼
//                  store read ──► cache fill ──► return
//
// The cache is filled only from data the store has acknowledged, so a
// cached order is always a persisted one.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("order not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(uid) => ServiceError::NotFound(uid),
            other => ServiceError::Repository(other),
        }
    }
}

/// Successful result of [`OrderService::create_order`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// The key was already stored, either before this delivery or by a
    /// concurrent writer that won the insert.
    AlreadyExists,
}

pub struct OrderService {
    repo: Arc<dyn OrderRepository>,
    cache: Arc<dyn OrderCache>,
    metrics: Arc<Metrics>,
}

impl OrderService {
    pub fn new(
        repo: Arc<dyn OrderRepository>,
        cache: Arc<dyn OrderCache>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self { repo, cache, metrics }
    }

    /// Persist a validated order exactly once and warm the cache with it.
    pub async fn create_order(&self, order: Order) -> Result<CreateOutcome, ServiceError> {
        if self.repo.exists(&order.order_uid).await? {
            tracing::info!(order_uid = %order.order_uid, "Order already exists, skipping");
            return Ok(CreateOutcome::AlreadyExists);
        }

        match self.repo.create_order(&order).await {
            Ok(()) => {}
            Err(RepositoryError::Duplicate(uid)) => {
                tracing::info!(order_uid = %uid, "Order inserted concurrently, skipping");
                return Ok(CreateOutcome::AlreadyExists);
            }
            Err(e) => return Err(ServiceError::Repository(e)),
        }

        tracing::info!(
            order_uid = %order.order_uid,
            item_count = order.items.len(),
            "✅ Order stored"
        );

        self.fill_cache(Arc::new(order));
        Ok(CreateOutcome::Created)
    }

    /// Cache-aside lookup.
    pub async fn get_order(&self, order_uid: &str) -> Result<Arc<Order>, ServiceError> {
        if let Some(order) = self.cache.get(order_uid) {
            self.metrics.record_cache_lookup(true);
            tracing::debug!(order_uid = %order_uid, "Order found in cache");
            return Ok(order);
        }
        self.metrics.record_cache_lookup(false);

        let order = Arc::new(self.repo.get_order(order_uid).await?);
        self.fill_cache(order.clone());

        Ok(order)
    }

    /// Load the most recently created orders, up to the cache capacity.
    pub async fn warm_up_cache(&self) -> Result<usize, ServiceError> {
        let orders = self.repo.get_last_orders(self.cache.capacity()).await?;
        let count = orders.len();

        // Oldest first, so the newest order ends up most recently used.
        for order in orders.into_iter().rev() {
            self.cache.put(order.order_uid.clone(), Arc::new(order));
        }

        self.metrics.set_cache_entries(self.cache.len());
        self.metrics.set_warmup_loaded(count);
        tracing::info!(count = count, capacity = self.cache.capacity(), "Cache warmed up");

        Ok(count)
    }

    fn fill_cache(&self, order: Arc<Order>) {
        self.cache.put(order.order_uid.clone(), order);
        self.metrics.set_cache_entries(self.cache.len());
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::BoundedCache;
    use crate::domain::order::fixtures::{order, order_at};
    use crate::store::memory::MemoryOrderRepository;
    use std::sync::atomic::Ordering;

    fn service_with(
        repo: Arc<MemoryOrderRepository>,
        capacity: usize,
    ) -> (OrderService, Arc<BoundedCache<Arc<Order>>>, Arc<Metrics>) {
        let cache = Arc::new(BoundedCache::new(capacity).unwrap());
        let metrics = Arc::new(Metrics::new().unwrap());
        let service = OrderService::new(repo, cache.clone(), metrics.clone());
        (service, cache, metrics)
    }

    #[tokio::test]
    async fn test_create_order_persists_and_fills_cache() {
        let repo = Arc::new(MemoryOrderRepository::default());
        let (service, cache, metrics) = service_with(repo.clone(), 10);

        let outcome = service.create_order(order("uid-1")).await.unwrap();

        assert_eq!(outcome, CreateOutcome::Created);
        assert!(repo.contains("uid-1"));
        assert_eq!(cache.get("uid-1").unwrap().order_uid, "uid-1");
        assert_eq!(metrics.cache_entries.get(), 1);
    }

    #[tokio::test]
    async fn test_create_order_is_idempotent() {
        let repo = Arc::new(MemoryOrderRepository::default());
        let (service, _cache, _metrics) = service_with(repo.clone(), 10);

        let first = service.create_order(order("uid-1")).await;
        let second = service.create_order(order("uid-1")).await;

        assert_eq!(first.unwrap(), CreateOutcome::Created);
        assert_eq!(second.unwrap(), CreateOutcome::AlreadyExists);
        assert_eq!(repo.len(), 1);
        assert_eq!(repo.create_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_race_lost_on_insert_is_success() {
        let repo = Arc::new(MemoryOrderRepository::with_orders([order("uid-1")]));
        repo.stale_exists.store(true, Ordering::SeqCst);
        let (service, _cache, _metrics) = service_with(repo.clone(), 10);

        let outcome = service.create_order(order("uid-1")).await.unwrap();

        assert_eq!(outcome, CreateOutcome::AlreadyExists);
        assert_eq!(repo.create_calls.load(Ordering::SeqCst), 1);
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_exists_failure_is_fail_closed() {
        let repo = Arc::new(MemoryOrderRepository::default());
        repo.fail_exists.store(true, Ordering::SeqCst);
        let (service, cache, _metrics) = service_with(repo.clone(), 10);

        let result = service.create_order(order("uid-1")).await;

        assert!(matches!(result, Err(ServiceError::Repository(RepositoryError::Database(_)))));
        assert_eq!(repo.create_calls.load(Ordering::SeqCst), 0);
        assert!(cache.get("uid-1").is_none());
    }

    #[tokio::test]
    async fn test_write_failure_leaves_cache_untouched() {
        let repo = Arc::new(MemoryOrderRepository::default());
        repo.fail_create.store(true, Ordering::SeqCst);
        let (service, cache, _metrics) = service_with(repo.clone(), 10);

        let result = service.create_order(order("uid-1")).await;

        assert!(matches!(result, Err(ServiceError::Repository(_))));
        assert!(!repo.contains("uid-1"));
        assert!(cache.get("uid-1").is_none());
    }

    #[tokio::test]
    async fn test_get_order_second_read_hits_cache() {
        let repo = Arc::new(MemoryOrderRepository::with_orders([order("uid-1")]));
        let (service, _cache, metrics) = service_with(repo.clone(), 10);

        let first = service.get_order("uid-1").await.unwrap();
        let second = service.get_order("uid-1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(repo.get_calls.load(Ordering::SeqCst), 1);
        assert_eq!(metrics.cache_requests.with_label_values(&["miss"]).get(), 1);
        assert_eq!(metrics.cache_requests.with_label_values(&["hit"]).get(), 1);
    }

    #[tokio::test]
    async fn test_get_order_after_create_skips_store() {
        let repo = Arc::new(MemoryOrderRepository::default());
        let (service, _cache, _metrics) = service_with(repo.clone(), 10);

        service.create_order(order("uid-1")).await.unwrap();
        service.get_order("uid-1").await.unwrap();

        assert_eq!(repo.get_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_get_order_not_found_is_distinct() {
        let repo = Arc::new(MemoryOrderRepository::default());
        let (service, cache, _metrics) = service_with(repo.clone(), 10);

        let result = service.get_order("missing").await;

        assert!(matches!(result, Err(ServiceError::NotFound(uid)) if uid == "missing"));
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_get_order_store_failure_surfaces() {
        let repo = Arc::new(MemoryOrderRepository::with_orders([order("uid-1")]));
        repo.fail_get.store(true, Ordering::SeqCst);
        let (service, cache, _metrics) = service_with(repo.clone(), 10);

        let result = service.get_order("uid-1").await;

        assert!(matches!(result, Err(ServiceError::Repository(RepositoryError::Database(_)))));
        assert_eq!(cache.len(), 0);
    }

    #[tokio::test]
    async fn test_warm_up_loads_most_recent_orders() {
        let repo = Arc::new(MemoryOrderRepository::with_orders([
            order_at("o1", "2024-01-01T10:00:00Z"),
            order_at("o2", "2024-01-02T10:00:00Z"),
            order_at("o3", "2024-01-03T10:00:00Z"),
            order_at("o4", "2024-01-04T10:00:00Z"),
            order_at("o5", "2024-01-05T10:00:00Z"),
        ]));
        let (service, cache, metrics) = service_with(repo.clone(), 3);

        let loaded = service.warm_up_cache().await.unwrap();

        assert_eq!(loaded, 3);
        assert_eq!(cache.len(), 3);
        for uid in ["o3", "o4", "o5"] {
            assert!(cache.get(uid).is_some(), "{} should be cached", uid);
        }
        for uid in ["o1", "o2"] {
            assert!(cache.get(uid).is_none(), "{} should not be cached", uid);
        }
        assert_eq!(metrics.warmup_orders_loaded.get(), 3);
    }

    #[tokio::test]
    async fn test_warm_up_leaves_newest_most_recently_used() {
        let repo = Arc::new(MemoryOrderRepository::with_orders([
            order_at("o1", "2024-01-01T10:00:00Z"),
            order_at("o2", "2024-01-02T10:00:00Z"),
            order_at("o3", "2024-01-03T10:00:00Z"),
        ]));
        let (service, cache, _metrics) = service_with(repo, 3);
        service.warm_up_cache().await.unwrap();

        // The next fill evicts the least recently used entry: the oldest order.
        cache.put("o4".to_string(), Arc::new(order_at("o4", "2024-01-04T10:00:00Z")));

        assert!(cache.get("o1").is_none());
        for uid in ["o2", "o3", "o4"] {
            assert!(cache.get(uid).is_some(), "{} should be cached", uid);
        }
    }

    #[tokio::test]
    async fn test_warm_up_on_empty_store() {
        let repo = Arc::new(MemoryOrderRepository::default());
        let (service, cache, _metrics) = service_with(repo, 3);

        assert_eq!(service.warm_up_cache().await.unwrap(), 0);
        assert_eq!(cache.len(), 0);
    }
}
