//! Cart pricing engine and cart persistence.
//!
//! Pricing is all-or-nothing: the first line that fails (missing product,
//! unavailable variant, zero quantity) fails the whole request and nothing
//! is persisted.

use darkroom_core::{
    Cart, CartId, CartLineInput, CartWrite, Email, Money, PricedLine, PricingConfig,
    ShippingMethod, UserId,
};
use tracing::{debug, instrument};

use super::ServiceError;
use super::catalog::{CatalogService, find_variant};
use super::pricing::PricingService;
use crate::db::Repositories;

/// Result of pricing a list of cart lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricedItems {
    /// The pricing configuration the lines were priced with.
    pub pricing: PricingConfig,
    pub subtotal: Money,
    /// Priced lines, in input order.
    pub items: Vec<PricedLine>,
}

/// A cart write as requested by the client.
#[derive(Debug, Clone)]
pub struct SaveCartRequest {
    /// Existing cart to overwrite; a new id is generated when absent or blank.
    pub cart_id: Option<CartId>,
    pub user_id: Option<UserId>,
    pub email: Option<Email>,
    pub items: Vec<CartLineInput>,
    pub shipping_method: ShippingMethod,
}

/// Prices and persists carts.
pub struct CartService<'a> {
    repos: &'a Repositories,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(repos: &'a Repositories) -> Self {
        Self { repos }
    }

    /// Price `items` against the current catalog and pricing.
    ///
    /// `unit_price = base_price + add-on deltas`, `line_total = unit_price *
    /// quantity`, `subtotal = sum(line_total)`, all in minor units.
    ///
    /// # Errors
    ///
    /// - `ServiceError::NotFound` if a product is missing or unpublished
    /// - `ServiceError::InvalidVariant` if a variant is missing or inactive
    /// - `ServiceError::InvalidArgument` for a zero quantity or on overflow
    #[instrument(skip(self, items), fields(lines = items.len()))]
    pub async fn price_items(&self, items: &[CartLineInput]) -> Result<PricedItems, ServiceError> {
        let pricing = PricingService::new(self.repos.settings.as_ref())
            .resolve()
            .await;
        let catalog = CatalogService::new(self.repos.products.as_ref());

        let mut subtotal = Money::ZERO;
        let mut priced = Vec::with_capacity(items.len());

        for line in items {
            if line.quantity == 0 {
                return Err(ServiceError::InvalidArgument(format!(
                    "quantity for {} must be at least 1",
                    line.product_id
                )));
            }

            let product = catalog.get_product(&line.product_id).await?;
            let variant = find_variant(&product, &line.variant_id)?;

            let unit_price = pricing
                .add_ons
                .delta_for(line.add_ons.as_ref())
                .and_then(|delta| variant.base_price.checked_add(delta))
                .ok_or_else(overflow)?;
            let line_total = unit_price.checked_mul(line.quantity).ok_or_else(overflow)?;
            subtotal = subtotal.checked_add(line_total).ok_or_else(overflow)?;

            priced.push(PricedLine {
                product_id: line.product_id.clone(),
                variant_id: line.variant_id.clone(),
                quantity: line.quantity,
                add_ons: line.add_ons,
                unit_price,
                line_total,
                title: product.title.clone(),
                variant_label: variant.label.clone(),
                hero_image: product.hero_image.clone(),
            });
        }

        Ok(PricedItems {
            pricing,
            subtotal,
            items: priced,
        })
    }

    /// Price a cart and merge-upsert it.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidArgument` for an empty cart, any error
    /// from [`Self::price_items`], and `ServiceError::Repository` if the
    /// write fails.
    #[instrument(skip(self, request), fields(cart_id = tracing::field::Empty))]
    pub async fn save_cart(&self, request: SaveCartRequest) -> Result<Cart, ServiceError> {
        if request.items.is_empty() {
            return Err(ServiceError::InvalidArgument("cart is empty".to_string()));
        }

        let PricedItems {
            pricing,
            subtotal,
            items,
        } = self.price_items(&request.items).await?;

        let shipping = pricing.shipping.rate_for(request.shipping_method);
        let total = subtotal.checked_add(shipping).ok_or_else(overflow)?;

        // A blank id counts as absent; it would otherwise become one cart
        // document shared by every client that sends it.
        let id = request
            .cart_id
            .filter(|id| !id.as_str().trim().is_empty())
            .unwrap_or_else(CartId::generate);
        tracing::Span::current().record("cart_id", id.as_str());

        let cart = self
            .repos
            .carts
            .save(CartWrite {
                id,
                user_id: request.user_id,
                email: request.email,
                currency: pricing.currency,
                items,
                subtotal,
                shipping,
                total,
                shipping_method: request.shipping_method,
            })
            .await?;

        debug!(total = %cart.total, "Cart saved");
        Ok(cart)
    }
}

fn overflow() -> ServiceError {
    ServiceError::InvalidArgument("cart total is too large".to_string())
}
