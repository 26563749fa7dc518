use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;

use super::{OrderRepository, RepositoryError};
use crate::config::DatabaseConfig;
use crate::domain::order::{format_timestamp, Delivery, Item, Order, Payment};

// ============================================================================
// PostgreSQL Order Repository
// ============================================================================
//
// Tables (see schema/orders.sql):
// - orders    one row per order, order_uid primary key
// - delivery  one row per order
// - payment   one row per order
// - items     N rows per order, insertion order kept by a serial id
//
// An order and its sub-entities are written in a single transaction. If any
// insert fails the transaction is dropped uncommitted and rolls back.
//
// ============================================================================

const INSERT_ORDER: &str = "INSERT INTO orders (
        order_uid, track_number, entry, locale,
        internal_signature, customer_id, delivery_service,
        shardkey, sm_id, date_created, oof_shard
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10::timestamptz, $11)";

const INSERT_DELIVERY: &str = "INSERT INTO delivery (
        order_uid, name, phone, zip, city, address, region, email
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";

const INSERT_PAYMENT: &str = "INSERT INTO payment (
        order_uid, transaction, request_id, currency, provider, amount,
        payment_dt, bank, delivery_cost, goods_total, custom_fee
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)";

const INSERT_ITEM: &str = "INSERT INTO items (
        order_uid, chrt_id, track_number, price, rid, name,
        sale, size, total_price, nm_id, brand, status
    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)";

/// Top-level `orders` row; sub-entities are loaded separately.
#[derive(sqlx::FromRow)]
struct OrderRow {
    order_uid: String,
    track_number: String,
    entry: String,
    locale: String,
    internal_signature: String,
    customer_id: String,
    delivery_service: String,
    shardkey: String,
    sm_id: i64,
    date_created: DateTime<Utc>,
    oof_shard: String,
}

impl OrderRow {
    fn into_order(self, delivery: Delivery, payment: Payment, items: Vec<Item>) -> Order {
        Order {
            order_uid: self.order_uid,
            track_number: self.track_number,
            entry: self.entry,
            delivery,
            payment,
            items,
            locale: self.locale,
            internal_signature: self.internal_signature,
            customer_id: self.customer_id,
            delivery_service: self.delivery_service,
            shardkey: self.shardkey,
            sm_id: self.sm_id,
            date_created: format_timestamp(self.date_created),
            oof_shard: self.oof_shard,
        }
    }
}

pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool and verify the database answers before returning.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, RepositoryError> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .max_lifetime(Duration::from_secs(300))
            .connect_with(options)
            .await?;

        sqlx::query("SELECT 1").execute(&pool).await?;

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = %config.name,
            max_connections = config.max_connections,
            "Database connected"
        );

        Ok(Self::new(pool))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Map a uniqueness violation on `orders` to [`RepositoryError::Duplicate`].
fn classify_insert_error(err: sqlx::Error, order_uid: &str) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Duplicate(order_uid.to_string())
        }
        _ => RepositoryError::Database(err),
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn create_order(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(INSERT_ORDER)
            .bind(&order.order_uid)
            .bind(&order.track_number)
            .bind(&order.entry)
            .bind(&order.locale)
            .bind(&order.internal_signature)
            .bind(&order.customer_id)
            .bind(&order.delivery_service)
            .bind(&order.shardkey)
            .bind(order.sm_id)
            .bind(&order.date_created)
            .bind(&order.oof_shard)
            .execute(&mut *tx)
            .await
            .map_err(|e| classify_insert_error(e, &order.order_uid))?;

        let d = &order.delivery;
        sqlx::query(INSERT_DELIVERY)
            .bind(&order.order_uid)
            .bind(&d.name)
            .bind(&d.phone)
            .bind(&d.zip)
            .bind(&d.city)
            .bind(&d.address)
            .bind(&d.region)
            .bind(&d.email)
            .execute(&mut *tx)
            .await?;

        let p = &order.payment;
        sqlx::query(INSERT_PAYMENT)
            .bind(&order.order_uid)
            .bind(&p.transaction)
            .bind(&p.request_id)
            .bind(&p.currency)
            .bind(&p.provider)
            .bind(p.amount)
            .bind(p.payment_dt)
            .bind(&p.bank)
            .bind(p.delivery_cost)
            .bind(p.goods_total)
            .bind(p.custom_fee)
            .execute(&mut *tx)
            .await?;

        for item in &order.items {
            sqlx::query(INSERT_ITEM)
                .bind(&order.order_uid)
                .bind(item.chrt_id)
                .bind(&item.track_number)
                .bind(item.price)
                .bind(&item.rid)
                .bind(&item.name)
                .bind(item.sale)
                .bind(&item.size)
                .bind(item.total_price)
                .bind(item.nm_id)
                .bind(&item.brand)
                .bind(item.status)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        tracing::debug!(
            order_uid = %order.order_uid,
            item_count = order.items.len(),
            "Persisted order with delivery, payment and items"
        );

        Ok(())
    }

    async fn get_order(&self, order_uid: &str) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            "SELECT order_uid, track_number, entry, locale,
                    internal_signature, customer_id, delivery_service,
                    shardkey, sm_id, date_created, oof_shard
             FROM orders
             WHERE order_uid = $1",
        )
        .bind(order_uid)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound(order_uid.to_string()))?;

        let delivery = sqlx::query_as::<_, Delivery>(
            "SELECT name, phone, zip, city, address, region, email
             FROM delivery
             WHERE order_uid = $1",
        )
        .bind(order_uid)
        .fetch_one(&self.pool)
        .await?;

        let payment = sqlx::query_as::<_, Payment>(
            "SELECT transaction, request_id, currency, provider, amount,
                    payment_dt, bank, delivery_cost, goods_total, custom_fee
             FROM payment
             WHERE order_uid = $1",
        )
        .bind(order_uid)
        .fetch_one(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, Item>(
            "SELECT chrt_id, track_number, price, rid, name,
                    sale, size, total_price, nm_id, brand, status
             FROM items
             WHERE order_uid = $1
             ORDER BY id",
        )
        .bind(order_uid)
        .fetch_all(&self.pool)
        .await?;

        Ok(row.into_order(delivery, payment, items))
    }

    async fn exists(&self, order_uid: &str) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM orders WHERE order_uid = $1)",
        )
        .bind(order_uid)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn get_last_orders(&self, limit: usize) -> Result<Vec<Order>, RepositoryError> {
        let uids = sqlx::query_scalar::<_, String>(
            "SELECT order_uid
             FROM orders
             ORDER BY date_created DESC, order_uid
             LIMIT $1",
        )
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;

        let mut orders = Vec::with_capacity(uids.len());
        for uid in uids {
            orders.push(self.get_order(&uid).await?);
        }

        Ok(orders)
    }
}
