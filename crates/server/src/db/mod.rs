//! Document storage for the store.
//!
//! Each logical collection sits behind its own repository trait:
//!
//! - `products` - [`ProductRepository`]
//! - `settings.store` - [`SettingsRepository`] (the pricing override)
//! - `carts` - [`CartRepository`]
//! - `orders` - [`OrderRepository`]
//! - `webhookEvents` - [`WebhookEventRepository`]
//!
//! Two implementations exist: [`memory`] (tests, and development without a
//! database) and [`postgres`] (JSONB documents with indexed scalar columns).
//! Server-assigned timestamps come from an injected [`Clock`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p darkroom-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use darkroom_core::{
    Cart, CartId, CartWrite, FulfilmentStatus, Order, OrderId, Orientation, PaymentIntentId,
    PaymentStatus, PricingOverride, Product, ProductId, ProductStatus, WebhookEventId,
    WebhookEventRecord,
};

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Constraint violation (e.g., duplicate payment reference).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Source of server-assigned timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Store-level product filters.
///
/// All set fields must match. `collection` and `tag` are array-contains
/// tests against the product's `collections`/`tags`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub status: Option<ProductStatus>,
    pub orientation: Option<Orientation>,
    pub collection: Option<String>,
    pub tag: Option<String>,
    pub limit: Option<usize>,
}

impl ProductFilter {
    /// Whether a product passes every set filter (ignores `limit`).
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        self.status.is_none_or(|s| product.status == s)
            && self.orientation.is_none_or(|o| product.orientation == o)
            && self
                .collection
                .as_ref()
                .is_none_or(|c| product.collections.contains(c))
            && self.tag.as_ref().is_none_or(|t| product.tags.contains(t))
    }
}

/// Order listing filters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub payment_status: Option<PaymentStatus>,
    pub fulfilment_status: Option<FulfilmentStatus>,
}

impl OrderFilter {
    #[must_use]
    pub fn matches(&self, order: &Order) -> bool {
        self.payment_status.is_none_or(|s| order.payment_status == s)
            && self
                .fulfilment_status
                .is_none_or(|s| order.fulfilment_status == s)
    }
}

/// The `products` collection.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Fetch a product by id, whatever its status.
    async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Fetch a product by slug, whatever its status.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError>;

    /// List products matching `filter`, in store order (by id).
    async fn query(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError>;

    /// Create or replace a product document.
    async fn upsert(&self, product: &Product) -> Result<(), RepositoryError>;
}

/// The `settings.store` document.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    async fn get_pricing(&self) -> Result<Option<PricingOverride>, RepositoryError>;

    /// Replace the stored pricing override.
    async fn put_pricing(&self, pricing: &PricingOverride) -> Result<(), RepositoryError>;
}

/// The `carts` collection.
#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn get(&self, id: &CartId) -> Result<Option<Cart>, RepositoryError>;

    /// Merge-upsert a cart and return the stored document.
    ///
    /// See [`CartWrite::merge_into`] for which fields survive.
    async fn save(&self, cart: CartWrite) -> Result<Cart, RepositoryError>;
}

/// The `orders` collection.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Insert a new order.
    ///
    /// Fails with [`RepositoryError::Conflict`] when the id or the payment
    /// reference is already taken; nothing is written in that case.
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError>;

    async fn get(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError>;

    async fn find_by_payment_ref(
        &self,
        payment_ref: &PaymentIntentId,
    ) -> Result<Option<Order>, RepositoryError>;

    /// List orders, newest first.
    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError>;

    /// Set the payment status if it is currently `expected`.
    ///
    /// Returns whether the order was updated. Other fields are preserved
    /// apart from `updated_at`.
    async fn update_payment_status(
        &self,
        id: &OrderId,
        expected: PaymentStatus,
        next: PaymentStatus,
    ) -> Result<bool, RepositoryError>;

    /// Set the fulfilment status if it is currently `expected`.
    async fn update_fulfilment_status(
        &self,
        id: &OrderId,
        expected: FulfilmentStatus,
        next: FulfilmentStatus,
    ) -> Result<bool, RepositoryError>;
}

/// The `webhookEvents` collection.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    async fn get(&self, id: &WebhookEventId) -> Result<Option<WebhookEventRecord>, RepositoryError>;

    /// Atomically record an event unless it already exists.
    ///
    /// Returns `true` if this call created the record.
    async fn record_if_absent(
        &self,
        id: &WebhookEventId,
        event_type: &str,
    ) -> Result<bool, RepositoryError>;
}

/// One handle per collection, sharing a clock.
#[derive(Clone)]
pub struct Repositories {
    pub products: Arc<dyn ProductRepository>,
    pub settings: Arc<dyn SettingsRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub webhook_events: Arc<dyn WebhookEventRepository>,
}

impl Repositories {
    /// In-process repositories. Nothing survives a restart.
    #[must_use]
    pub fn in_memory(clock: Arc<dyn Clock>) -> Self {
        Self {
            products: Arc::new(memory::MemoryProductRepository::default()),
            settings: Arc::new(memory::MemorySettingsRepository::default()),
            carts: Arc::new(memory::MemoryCartRepository::new(Arc::clone(&clock))),
            orders: Arc::new(memory::MemoryOrderRepository::new(Arc::clone(&clock))),
            webhook_events: Arc::new(memory::MemoryWebhookEventRepository::new(clock)),
        }
    }

    /// `PostgreSQL`-backed repositories over a shared pool.
    #[must_use]
    pub fn postgres(pool: &PgPool, clock: &Arc<dyn Clock>) -> Self {
        Self {
            products: Arc::new(postgres::PgProductRepository::new(pool.clone(), Arc::clone(clock))),
            settings: Arc::new(postgres::PgSettingsRepository::new(pool.clone())),
            carts: Arc::new(postgres::PgCartRepository::new(pool.clone(), Arc::clone(clock))),
            orders: Arc::new(postgres::PgOrderRepository::new(pool.clone(), Arc::clone(clock))),
            webhook_events: Arc::new(postgres::PgWebhookEventRepository::new(
                pool.clone(),
                Arc::clone(clock),
            )),
        }
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
