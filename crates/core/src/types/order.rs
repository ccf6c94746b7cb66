//! Orders: the frozen snapshot of a cart at checkout.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::cart::{Cart, PricedLine};
use super::email::Email;
use super::id::{CartId, OrderId, PaymentIntentId, UserId};
use super::money::{CurrencyCode, Money};
use super::status::{FulfilmentStatus, PaymentStatus, ShippingMethod};

/// Customer-facing order number, `ORD-` followed by six digits.
///
/// Numbers are drawn at random and are not guaranteed unique; the order id
/// is the real identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Smallest allowed suffix.
    pub const MIN_SUFFIX: u32 = 100_000;
    /// Largest allowed suffix.
    pub const MAX_SUFFIX: u32 = 999_999;

    /// Build an order number from a six-digit suffix, clamped into range.
    #[must_use]
    pub fn from_suffix(suffix: u32) -> Self {
        let suffix = suffix.clamp(Self::MIN_SUFFIX, Self::MAX_SUFFIX);
        Self(format!("ORD-{suffix}"))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Delivery address captured at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub postcode: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

impl ShippingAddress {
    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("fullName", &self.full_name),
            ("addressLine1", &self.address_line1),
            ("city", &self.city),
            ("postcode", &self.postcode),
            ("country", &self.country),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// An order document (`orders` collection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub cart_id: CartId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<ShippingAddress>,
    pub shipping_method: ShippingMethod,
    pub items: Vec<PricedLine>,
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
    pub currency: CurrencyCode,
    pub payment_status: PaymentStatus,
    pub fulfilment_status: FulfilmentStatus,
    pub payment_ref: PaymentIntentId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Checkout details that are not part of the cart.
#[derive(Debug, Clone, Default)]
pub struct OrderContact {
    pub email: Option<Email>,
    pub shipping_address: Option<ShippingAddress>,
}

impl Order {
    /// Snapshot a cart into a new `pending`/`created` order.
    ///
    /// Line items and totals are cloned, so later writes to the cart never
    /// reach the order. A contact email given at checkout takes precedence
    /// over the one stored on the cart.
    #[must_use]
    pub fn from_cart(
        id: OrderId,
        order_number: OrderNumber,
        cart: &Cart,
        contact: OrderContact,
        payment_ref: PaymentIntentId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            order_number,
            cart_id: cart.id.clone(),
            user_id: cart.user_id.clone(),
            email: contact.email.or_else(|| cart.email.clone()),
            shipping_address: contact.shipping_address,
            shipping_method: cart.shipping_method,
            items: cart.items.clone(),
            subtotal: cart.subtotal,
            shipping: cart.shipping,
            total: cart.total,
            currency: cart.currency,
            payment_status: PaymentStatus::Pending,
            fulfilment_status: FulfilmentStatus::Created,
            payment_ref,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_order_number_format() {
        assert_eq!(OrderNumber::from_suffix(123_456).as_str(), "ORD-123456");
        assert_eq!(OrderNumber::from_suffix(7).as_str(), "ORD-100000");
        assert_eq!(OrderNumber::from_suffix(u32::MAX).as_str(), "ORD-999999");
    }

    #[test]
    fn test_missing_address_fields() {
        let address = ShippingAddress {
            full_name: "Jas Patel".to_owned(),
            address_line1: "  ".to_owned(),
            address_line2: None,
            city: "Leeds".to_owned(),
            postcode: String::new(),
            country: "GB".to_owned(),
            phone: None,
        };
        assert_eq!(address.missing_fields(), vec!["addressLine1", "postcode"]);
    }

    #[test]
    fn test_from_cart_snapshots_cart() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let cart = Cart {
            id: CartId::new("cart-1"),
            user_id: None,
            email: Some(Email::parse("cart@example.com").unwrap()),
            currency: CurrencyCode::GBP,
            items: Vec::new(),
            subtotal: Money::from_minor(23_600),
            shipping: Money::from_minor(599),
            total: Money::from_minor(24_199),
            shipping_method: ShippingMethod::Standard,
            updated_at: now,
        };

        let order = Order::from_cart(
            OrderId::new("o1"),
            OrderNumber::from_suffix(654_321),
            &cart,
            OrderContact::default(),
            PaymentIntentId::new("pi_1"),
            now,
        );

        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.fulfilment_status, FulfilmentStatus::Created);
        assert_eq!(order.total, Money::from_minor(24_199));
        assert_eq!(order.email.unwrap().as_str(), "cart@example.com");
        assert_eq!(order.payment_ref.as_str(), "pi_1");
    }
}
