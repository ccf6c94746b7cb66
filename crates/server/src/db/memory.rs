//! In-memory repositories.
//!
//! Used by the test suites and when the server runs without a database.
//! Each collection is a map behind a `tokio::sync::RwLock`; conditional
//! writes hold the write lock for the whole check-and-set.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use darkroom_core::{
    Cart, CartId, CartWrite, FulfilmentStatus, Order, OrderId, PaymentIntentId, PaymentStatus,
    PricingOverride, Product, ProductId, WebhookEventId, WebhookEventRecord,
};

use super::{
    CartRepository, Clock, OrderFilter, OrderRepository, ProductFilter, ProductRepository,
    RepositoryError, SettingsRepository, WebhookEventRepository,
};

/// Products keyed by id; iteration order is store order.
#[derive(Default)]
pub struct MemoryProductRepository {
    products: RwLock<BTreeMap<ProductId, Product>>,
}

#[async_trait]
impl ProductRepository for MemoryProductRepository {
    async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.products.read().await.get(id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        Ok(self
            .products
            .read()
            .await
            .values()
            .find(|p| p.slug == slug)
            .cloned())
    }

    async fn query(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        let matching = products.values().filter(|p| filter.matches(p)).cloned();

        Ok(match filter.limit {
            Some(limit) => matching.take(limit).collect(),
            None => matching.collect(),
        })
    }

    async fn upsert(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut products = self.products.write().await;

        if products
            .values()
            .any(|p| p.slug == product.slug && p.id != product.id)
        {
            return Err(RepositoryError::Conflict(format!(
                "slug '{}' already in use",
                product.slug
            )));
        }

        products.insert(product.id.clone(), product.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySettingsRepository {
    pricing: RwLock<Option<PricingOverride>>,
}

#[async_trait]
impl SettingsRepository for MemorySettingsRepository {
    async fn get_pricing(&self) -> Result<Option<PricingOverride>, RepositoryError> {
        Ok(*self.pricing.read().await)
    }

    async fn put_pricing(&self, pricing: &PricingOverride) -> Result<(), RepositoryError> {
        *self.pricing.write().await = Some(*pricing);
        Ok(())
    }
}

pub struct MemoryCartRepository {
    carts: RwLock<HashMap<CartId, Cart>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCartRepository {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            carts: RwLock::default(),
            clock,
        }
    }
}

#[async_trait]
impl CartRepository for MemoryCartRepository {
    async fn get(&self, id: &CartId) -> Result<Option<Cart>, RepositoryError> {
        Ok(self.carts.read().await.get(id).cloned())
    }

    async fn save(&self, cart: CartWrite) -> Result<Cart, RepositoryError> {
        let mut carts = self.carts.write().await;
        let prior = carts.get(&cart.id);
        let merged = cart.merge_into(prior, self.clock.now());
        carts.insert(merged.id.clone(), merged.clone());
        Ok(merged)
    }
}

pub struct MemoryOrderRepository {
    orders: RwLock<HashMap<OrderId, Order>>,
    clock: Arc<dyn Clock>,
}

impl MemoryOrderRepository {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            orders: RwLock::default(),
            clock,
        }
    }
}

#[async_trait]
impl OrderRepository for MemoryOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut orders = self.orders.write().await;

        if orders.contains_key(&order.id) {
            return Err(RepositoryError::Conflict(format!(
                "order {} already exists",
                order.id
            )));
        }
        if orders.values().any(|o| o.payment_ref == order.payment_ref) {
            return Err(RepositoryError::Conflict(format!(
                "payment reference {} already has an order",
                order.payment_ref
            )));
        }

        orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn get(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.orders.read().await.get(id).cloned())
    }

    async fn find_by_payment_ref(
        &self,
        payment_ref: &PaymentIntentId,
    ) -> Result<Option<Order>, RepositoryError> {
        Ok(self
            .orders
            .read()
            .await
            .values()
            .find(|o| &o.payment_ref == payment_ref)
            .cloned())
    }

    async fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, RepositoryError> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(orders)
    }

    async fn update_payment_status(
        &self,
        id: &OrderId,
        expected: PaymentStatus,
        next: PaymentStatus,
    ) -> Result<bool, RepositoryError> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(id) {
            Some(order) if order.payment_status == expected => {
                order.payment_status = next;
                order.updated_at = self.clock.now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_fulfilment_status(
        &self,
        id: &OrderId,
        expected: FulfilmentStatus,
        next: FulfilmentStatus,
    ) -> Result<bool, RepositoryError> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(id) {
            Some(order) if order.fulfilment_status == expected => {
                order.fulfilment_status = next;
                order.updated_at = self.clock.now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

pub struct MemoryWebhookEventRepository {
    events: RwLock<HashMap<WebhookEventId, WebhookEventRecord>>,
    clock: Arc<dyn Clock>,
}

impl MemoryWebhookEventRepository {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            events: RwLock::default(),
            clock,
        }
    }
}

#[async_trait]
impl WebhookEventRepository for MemoryWebhookEventRepository {
    async fn get(&self, id: &WebhookEventId) -> Result<Option<WebhookEventRecord>, RepositoryError> {
        Ok(self.events.read().await.get(id).cloned())
    }

    async fn record_if_absent(
        &self,
        id: &WebhookEventId,
        event_type: &str,
    ) -> Result<bool, RepositoryError> {
        let mut events = self.events.write().await;
        if events.contains_key(id) {
            return Ok(false);
        }

        events.insert(
            id.clone(),
            WebhookEventRecord {
                id: id.clone(),
                event_type: event_type.to_owned(),
                received_at: self.clock.now(),
            },
        );
        Ok(true)
    }
}
