//! Checkout: turn a priced cart into a payment intent and a pending order.
//!
//! The intent is created before the order is written, so an order never
//! exists without a payment reference. The reverse can happen: if the order
//! write fails after the gateway call, the intent is orphaned and logged.

use darkroom_core::{
    CartId, Email, Order, OrderContact, OrderId, OrderNumber, ShippingAddress, ShippingMethod,
};
use rand::Rng;
use serde::Serialize;
use tracing::{error, info, instrument};

use super::ServiceError;
use crate::db::{Clock, Repositories};
use crate::payments::{CreateIntentRequest, PaymentGateway};

/// Checkout details submitted by the customer.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub cart_id: CartId,
    pub email: Option<Email>,
    pub shipping_address: Option<ShippingAddress>,
    /// Must match the cart's method when given; shipping was priced with it.
    pub shipping_method: Option<ShippingMethod>,
}

/// What the client needs to complete payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub client_secret: String,
    pub order_id: OrderId,
    pub order_number: OrderNumber,
}

/// Creates orders from carts.
pub struct CheckoutService<'a> {
    repos: &'a Repositories,
    gateway: &'a dyn PaymentGateway,
    clock: &'a dyn Clock,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(
        repos: &'a Repositories,
        gateway: &'a dyn PaymentGateway,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            repos,
            gateway,
            clock,
        }
    }

    /// Create a payment intent for a cart and persist a pending order.
    ///
    /// # Errors
    ///
    /// - `ServiceError::InvalidArgument` for an incomplete address or a
    ///   shipping method that differs from the priced cart
    /// - `ServiceError::NotFound` if the cart does not exist (the gateway is
    ///   not called)
    /// - `ServiceError::PaymentGateway` if the intent cannot be created (no
    ///   order is written)
    /// - `ServiceError::Repository` if the order cannot be stored
    #[instrument(skip(self, request), fields(cart_id = %request.cart_id))]
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutReceipt, ServiceError> {
        if let Some(address) = &request.shipping_address {
            let missing = address.missing_fields();
            if !missing.is_empty() {
                return Err(ServiceError::InvalidArgument(format!(
                    "shipping address is missing: {}",
                    missing.join(", ")
                )));
            }
        }

        let cart = self
            .repos
            .carts
            .get(&request.cart_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("cart {}", request.cart_id)))?;

        if let Some(method) = request.shipping_method
            && method != cart.shipping_method
        {
            return Err(ServiceError::InvalidArgument(format!(
                "cart was priced for {} shipping, not {}",
                cart.shipping_method.as_str(),
                method.as_str()
            )));
        }

        let order_id = OrderId::generate();
        let order_number = generate_order_number();
        let contact = OrderContact {
            email: request.email,
            shipping_address: request.shipping_address,
        };

        let intent = self
            .gateway
            .create_payment_intent(CreateIntentRequest {
                amount: cart.total,
                currency: cart.currency,
                cart_id: cart.id.clone(),
                order_id: order_id.clone(),
                receipt_email: contact.email.clone().or_else(|| cart.email.clone()),
            })
            .await?;

        let order = Order::from_cart(
            order_id,
            order_number,
            &cart,
            contact,
            intent.id.clone(),
            self.clock.now(),
        );

        if let Err(e) = self.repos.orders.insert(&order).await {
            error!(
                error = %e,
                payment_intent = %intent.id,
                order_id = %order.id,
                "Order write failed after payment intent was created"
            );
            return Err(e.into());
        }

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            payment_intent = %intent.id,
            total = %order.total,
            "Order created"
        );

        Ok(CheckoutReceipt {
            client_secret: intent.client_secret,
            order_id: order.id,
            order_number: order.order_number,
        })
    }
}

/// `ORD-` plus six random digits.
///
/// Not checked for uniqueness; collisions are possible and only affect the
/// customer-facing label, never order identity.
fn generate_order_number() -> OrderNumber {
    let suffix = rand::rng().random_range(OrderNumber::MIN_SUFFIX..=OrderNumber::MAX_SUFFIX);
    OrderNumber::from_suffix(suffix)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use darkroom_core::{
        CartLineInput, FulfilmentStatus, PaymentIntentId, PaymentStatus, ProductId, VariantId,
    };

    use super::*;
    use crate::db::FixedClock;
    use crate::payments::{PaymentError, PaymentIntent};
    use crate::services::cart::{CartService, SaveCartRequest};
    use crate::services::seed::seed_catalog;

    #[derive(Default)]
    struct CountingGateway {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl PaymentGateway for CountingGateway {
        async fn create_payment_intent(
            &self,
            request: CreateIntentRequest,
        ) -> Result<PaymentIntent, PaymentError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PaymentError::Api {
                    status: 402,
                    message: "card_declined".to_string(),
                });
            }
            Ok(PaymentIntent {
                id: PaymentIntentId::new(format!("pi_{n}")),
                client_secret: format!("pi_{n}_secret"),
                amount: request.amount.minor_units(),
                currency: request.currency.gateway_code().to_string(),
                status: "requires_payment_method".to_string(),
            })
        }
    }

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2026, 10, 17, 8, 0, 0).unwrap())
    }

    async fn repos_with_cart() -> (Repositories, CartId) {
        let clock: Arc<dyn Clock> = Arc::new(clock());
        let repos = Repositories::in_memory(Arc::clone(&clock));
        seed_catalog(&repos, clock.as_ref()).await.unwrap();

        let cart = CartService::new(&repos)
            .save_cart(SaveCartRequest {
                cart_id: Some(CartId::new("cart-1")),
                user_id: None,
                email: None,
                items: vec![CartLineInput {
                    product_id: ProductId::new("city-lights"),
                    variant_id: VariantId::new("12x16"),
                    quantity: 1,
                    add_ons: None,
                }],
                shipping_method: ShippingMethod::Standard,
            })
            .await
            .unwrap();
        (repos, cart.id)
    }

    fn request(cart_id: CartId) -> CheckoutRequest {
        CheckoutRequest {
            cart_id,
            email: Some(Email::parse("jas@example.com").unwrap()),
            shipping_address: None,
            shipping_method: None,
        }
    }

    #[tokio::test]
    async fn test_checkout_creates_pending_order() {
        let (repos, cart_id) = repos_with_cart().await;
        let gateway = CountingGateway::default();
        let clock = clock();

        let receipt = CheckoutService::new(&repos, &gateway, &clock)
            .checkout(request(cart_id.clone()))
            .await
            .unwrap();

        assert_eq!(receipt.client_secret, "pi_0_secret");
        assert!(receipt.order_number.as_str().starts_with("ORD-"));
        assert_eq!(receipt.order_number.as_str().len(), 10);

        let order = repos.orders.get(&receipt.order_id).await.unwrap().unwrap();
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.fulfilment_status, FulfilmentStatus::Created);
        assert_eq!(order.payment_ref.as_str(), "pi_0");
        assert_eq!(order.cart_id, cart_id);
        assert_eq!(order.total.minor_units(), 8900 + 599);
    }

    #[tokio::test]
    async fn test_missing_cart_does_not_call_gateway() {
        let (repos, _) = repos_with_cart().await;
        let gateway = CountingGateway::default();
        let clock = clock();

        let result = CheckoutService::new(&repos, &gateway, &clock)
            .checkout(request(CartId::new("nope")))
            .await;

        assert!(matches!(result, Err(ServiceError::NotFound(_))));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        assert!(repos.orders.list(&Default::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_gateway_failure_writes_no_order() {
        let (repos, cart_id) = repos_with_cart().await;
        let gateway = CountingGateway {
            calls: AtomicUsize::new(0),
            fail: true,
        };
        let clock = clock();

        let result = CheckoutService::new(&repos, &gateway, &clock)
            .checkout(request(cart_id))
            .await;

        assert!(matches!(result, Err(ServiceError::PaymentGateway(_))));
        assert!(repos.orders.list(&Default::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_shipping_method_must_match_cart() {
        let (repos, cart_id) = repos_with_cart().await;
        let gateway = CountingGateway::default();
        let clock = clock();

        let mut req = request(cart_id);
        req.shipping_method = Some(ShippingMethod::Express);
        let result = CheckoutService::new(&repos, &gateway, &clock).checkout(req).await;

        assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_incomplete_address_is_rejected() {
        let (repos, cart_id) = repos_with_cart().await;
        let gateway = CountingGateway::default();
        let clock = clock();

        let mut req = request(cart_id);
        req.shipping_address = Some(ShippingAddress {
            full_name: "Jas Patel".to_string(),
            address_line1: String::new(),
            address_line2: None,
            city: "Leeds".to_string(),
            postcode: "LS1 1AA".to_string(),
            country: "GB".to_string(),
            phone: None,
        });
        let result = CheckoutService::new(&repos, &gateway, &clock).checkout(req).await;

        assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));
    }

    #[test]
    fn test_order_number_range() {
        for _ in 0..100 {
            let number = generate_order_number();
            let digits: u32 = number.as_str()["ORD-".len()..].parse().unwrap();
            assert!((OrderNumber::MIN_SUFFIX..=OrderNumber::MAX_SUFFIX).contains(&digits));
        }
    }
}
