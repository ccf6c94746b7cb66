//! `PostgreSQL` repositories.
//!
//! Documents are stored whole in a JSONB `doc` column; the scalar columns
//! next to it (`slug`, `payment_ref`, statuses) exist for filtering and for
//! the uniqueness and compare-and-set guarantees the traits promise.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value as JsonValue, json};
use sqlx::PgPool;

use darkroom_core::{
    Cart, CartId, CartWrite, FulfilmentStatus, Order, OrderId, PaymentIntentId, PaymentStatus,
    PricingOverride, Product, ProductId, WebhookEventId, WebhookEventRecord,
};

use super::{
    CartRepository, Clock, OrderFilter, OrderRepository, ProductFilter, ProductRepository,
    RepositoryError, SettingsRepository, WebhookEventRepository,
};

const PRICING_SETTINGS_KEY: &str = "store";

// =============================================================================
// Helpers
// =============================================================================

fn decode<T: DeserializeOwned>(doc: JsonValue) -> Result<T, RepositoryError> {
    serde_json::from_value(doc)
        .map_err(|e| RepositoryError::DataCorruption(format!("invalid document: {e}")))
}

fn encode<T: Serialize>(doc: &T) -> Result<JsonValue, RepositoryError> {
    serde_json::to_value(doc)
        .map_err(|e| RepositoryError::DataCorruption(format!("unencodable document: {e}")))
}

/// Map a unique-constraint violation to [`RepositoryError::Conflict`].
fn conflict_on_unique(err: sqlx::Error, what: impl FnOnce() -> String) -> RepositoryError {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict(what())
        }
        other => RepositoryError::Database(other),
    }
}

// =============================================================================
// Products
// =============================================================================

pub struct PgProductRepository {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PgProductRepository {
    #[must_use]
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let doc = sqlx::query_scalar::<_, JsonValue>("SELECT doc FROM products WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        doc.map(decode).transpose()
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let doc = sqlx::query_scalar::<_, JsonValue>("SELECT doc FROM products WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        doc.map(decode).transpose()
    }

    async fn query(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let limit = filter
            .limit
            .map(|l| i64::try_from(l).unwrap_or(i64::MAX));

        let docs = sqlx::query_scalar::<_, JsonValue>(
            r"
            SELECT doc FROM products
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR doc->>'orientation' = $2)
              AND ($3::text IS NULL OR doc->'collections' @> jsonb_build_array($3::text))
              AND ($4::text IS NULL OR doc->'tags' @> jsonb_build_array($4::text))
            ORDER BY id
            LIMIT $5
            ",
        )
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.orientation.map(|o| o.as_str()))
        .bind(filter.collection.as_deref())
        .bind(filter.tag.as_deref())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        docs.into_iter().map(decode).collect()
    }

    async fn upsert(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO products (id, slug, status, doc, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id) DO UPDATE
            SET slug = EXCLUDED.slug,
                status = EXCLUDED.status,
                doc = EXCLUDED.doc,
                updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(product.id.as_str())
        .bind(&product.slug)
        .bind(product.status.as_str())
        .bind(encode(product)?)
        .bind(self.clock.now())
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, || format!("slug '{}' already in use", product.slug)))?;

        Ok(())
    }
}

// =============================================================================
// Settings
// =============================================================================

pub struct PgSettingsRepository {
    pool: PgPool,
}

impl PgSettingsRepository {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for PgSettingsRepository {
    async fn get_pricing(&self) -> Result<Option<PricingOverride>, RepositoryError> {
        let doc = sqlx::query_scalar::<_, JsonValue>("SELECT doc FROM settings WHERE key = $1")
            .bind(PRICING_SETTINGS_KEY)
            .fetch_optional(&self.pool)
            .await?;

        doc.map(decode).transpose()
    }

    async fn put_pricing(&self, pricing: &PricingOverride) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO settings (key, doc) VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET doc = EXCLUDED.doc, updated_at = NOW()
            ",
        )
        .bind(PRICING_SETTINGS_KEY)
        .bind(encode(pricing)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Carts
// =============================================================================

pub struct PgCartRepository {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PgCartRepository {
    #[must_use]
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

#[async_trait]
impl CartRepository for PgCartRepository {
    async fn get(&self, id: &CartId) -> Result<Option<Cart>, RepositoryError> {
        let doc = sqlx::query_scalar::<_, JsonValue>("SELECT doc FROM carts WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        doc.map(decode).transpose()
    }

    async fn save(&self, cart: CartWrite) -> Result<Cart, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let prior = sqlx::query_scalar::<_, JsonValue>(
            "SELECT doc FROM carts WHERE id = $1 FOR UPDATE",
        )
        .bind(cart.id.as_str())
        .fetch_optional(&mut *tx)
        .await?
        .map(decode::<Cart>)
        .transpose()?;

        let merged = cart.merge_into(prior.as_ref(), self.clock.now());

        sqlx::query(
            r"
            INSERT INTO carts (id, doc, updated_at) VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc, updated_at = EXCLUDED.updated_at
            ",
        )
        .bind(merged.id.as_str())
        .bind(encode(&merged)?)
        .bind(merged.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(merged)
    }
}

// =============================================================================
// Orders
// =============================================================================

pub struct PgOrderRepository {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PgOrderRepository {
    #[must_use]
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }

    /// Compare-and-set one status column, patching the same field in `doc`.
    async fn set_status(
        &self,
        id: &OrderId,
        column: &'static str,
        field: &'static str,
        expected: &'static str,
        next: &'static str,
    ) -> Result<bool, RepositoryError> {
        let now: DateTime<Utc> = self.clock.now();
        let patch = json!({ field: next, "updatedAt": now });

        // `column` is one of two compile-time names, never user input.
        let sql = format!(
            "UPDATE orders SET {column} = $2, updated_at = $3, doc = doc || $4 \
             WHERE id = $1 AND {column} = $5"
        );

        let result = sqlx::query(&sql)
            .bind(id.as_str())
            .bind(next)
            .bind(now)
            .bind(patch)
            .bind(expected)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO orders
                (id, payment_ref, payment_status, fulfilment_status, doc, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(order.id.as_str())
        .bind(order.payment_ref.as_str())
        .bind(order.payment_status.as_str())
        .bind(order.fulfilment_status.as_str())
        .bind(encode(order)?)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            conflict_on_unique(e, || {
                format!(
                    "order {} or payment reference {} already exists",
                    order.id, order.payment_ref
                )
            })
        })?;

        Ok(())
    }

    async fn get(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let doc = sqlx::query_scalar::<_, JsonValue>("SELECT doc FROM orders WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        doc.map(decode).transpose()
    }

    async fn find_by_payment_ref(
        &self,
        payment_ref: &PaymentIntentId,
    ) -> Result<Option<Order>, RepositoryError> {
        let doc =
            sqlx::query_scalar::<_, JsonValue>("SELECT doc FROM orders WHERE payment_ref = $1")
                .bind(payment_ref.as_str())
                .fetch_optional(&self.pool)
                .await?;

        doc.map(decode).transpose()
    }

    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let docs = sqlx::query_scalar::<_, JsonValue>(
            r"
            SELECT doc FROM orders
            WHERE ($1::text IS NULL OR payment_status = $1)
              AND ($2::text IS NULL OR fulfilment_status = $2)
            ORDER BY created_at DESC, id
            ",
        )
        .bind(filter.payment_status.map(PaymentStatus::as_str))
        .bind(filter.fulfilment_status.map(FulfilmentStatus::as_str))
        .fetch_all(&self.pool)
        .await?;

        docs.into_iter().map(decode).collect()
    }

    async fn update_payment_status(
        &self,
        id: &OrderId,
        expected: PaymentStatus,
        next: PaymentStatus,
    ) -> Result<bool, RepositoryError> {
        self.set_status(
            id,
            "payment_status",
            "paymentStatus",
            expected.as_str(),
            next.as_str(),
        )
        .await
    }

    async fn update_fulfilment_status(
        &self,
        id: &OrderId,
        expected: FulfilmentStatus,
        next: FulfilmentStatus,
    ) -> Result<bool, RepositoryError> {
        self.set_status(
            id,
            "fulfilment_status",
            "fulfilmentStatus",
            expected.as_str(),
            next.as_str(),
        )
        .await
    }
}

// =============================================================================
// Webhook events
// =============================================================================

pub struct PgWebhookEventRepository {
    pool: PgPool,
    clock: Arc<dyn Clock>,
}

impl PgWebhookEventRepository {
    #[must_use]
    pub fn new(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self { pool, clock }
    }
}

#[async_trait]
impl WebhookEventRepository for PgWebhookEventRepository {
    async fn get(&self, id: &WebhookEventId) -> Result<Option<WebhookEventRecord>, RepositoryError> {
        let row = sqlx::query_as::<_, (String, String, DateTime<Utc>)>(
            "SELECT id, event_type, received_at FROM webhook_events WHERE id = $1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, event_type, received_at)| WebhookEventRecord {
            id: WebhookEventId::new(id),
            event_type,
            received_at,
        }))
    }

    async fn record_if_absent(
        &self,
        id: &WebhookEventId,
        event_type: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO webhook_events (id, event_type, received_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO NOTHING
            ",
        )
        .bind(id.as_str())
        .bind(event_type)
        .bind(self.clock.now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
