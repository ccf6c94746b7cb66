//! Cart line items and the persisted cart document.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::{CartId, ProductId, UserId, VariantId};
use super::money::{CurrencyCode, Money};
use super::status::{FrameChoice, ShippingMethod};

/// Add-on selections for a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOnSelection {
    #[serde(default)]
    pub frame: FrameChoice,
    #[serde(default)]
    pub gift_wrap: bool,
    #[serde(default)]
    pub signed: bool,
}

/// A requested cart line, as submitted by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_ons: Option<AddOnSelection>,
}

/// A priced snapshot of a cart line.
///
/// Display fields are copied from the catalog at pricing time and are not
/// refreshed afterwards: this is the record of what the customer was shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedLine {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_ons: Option<AddOnSelection>,
    pub unit_price: Money,
    pub line_total: Money,
    pub title: String,
    pub variant_label: String,
    pub hero_image: String,
}

/// The persisted cart document (`carts` collection).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    pub currency: CurrencyCode,
    pub items: Vec<PricedLine>,
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
    pub shipping_method: ShippingMethod,
    pub updated_at: DateTime<Utc>,
}

/// A cart write: every field of [`Cart`] except the server timestamp.
///
/// `None` for `user_id`/`email` means "not part of this write", so a
/// previously stored value survives the upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartWrite {
    pub id: CartId,
    pub user_id: Option<UserId>,
    pub email: Option<Email>,
    pub currency: CurrencyCode,
    pub items: Vec<PricedLine>,
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
    pub shipping_method: ShippingMethod,
}

impl CartWrite {
    /// Merge this write over a previously stored document.
    ///
    /// Fields absent from the write are kept from `prior`; everything else
    /// is replaced and `updated_at` is set to `now`.
    #[must_use]
    pub fn merge_into(self, prior: Option<&Cart>, now: DateTime<Utc>) -> Cart {
        let user_id = self
            .user_id
            .or_else(|| prior.and_then(|c| c.user_id.clone()));
        let email = self.email.or_else(|| prior.and_then(|c| c.email.clone()));

        Cart {
            id: self.id,
            user_id,
            email,
            currency: self.currency,
            items: self.items,
            subtotal: self.subtotal,
            shipping: self.shipping,
            total: self.total,
            shipping_method: self.shipping_method,
            updated_at: now,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn write(id: &str) -> CartWrite {
        CartWrite {
            id: CartId::new(id),
            user_id: None,
            email: None,
            currency: CurrencyCode::GBP,
            items: Vec::new(),
            subtotal: Money::from_minor(100),
            shipping: Money::from_minor(599),
            total: Money::from_minor(699),
            shipping_method: ShippingMethod::Standard,
        }
    }

    #[test]
    fn test_merge_keeps_prior_contact_fields() {
        let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();

        let mut first = write("c1");
        first.email = Some(Email::parse("jas@example.com").unwrap());
        first.user_id = Some(UserId::new("u1"));
        let stored = first.merge_into(None, t0);

        let mut second = write("c1");
        second.subtotal = Money::from_minor(200);
        let merged = second.merge_into(Some(&stored), t1);

        assert_eq!(merged.email, stored.email);
        assert_eq!(merged.user_id, Some(UserId::new("u1")));
        assert_eq!(merged.subtotal, Money::from_minor(200));
        assert_eq!(merged.updated_at, t1);
    }

    #[test]
    fn test_merge_overwrites_supplied_contact_fields() {
        let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        let mut first = write("c1");
        first.email = Some(Email::parse("old@example.com").unwrap());
        let stored = first.merge_into(None, t0);

        let mut second = write("c1");
        second.email = Some(Email::parse("new@example.com").unwrap());
        let merged = second.merge_into(Some(&stored), t0);

        assert_eq!(merged.email.unwrap().as_str(), "new@example.com");
    }

    #[test]
    fn test_line_input_wire_format() {
        let line: CartLineInput = serde_json::from_str(
            r#"{"productId":"city-lights","variantId":"12x16","quantity":2,"addOns":{"frame":"black"}}"#,
        )
        .unwrap();
        assert_eq!(line.quantity, 2);
        let add_ons = line.add_ons.unwrap();
        assert_eq!(add_ons.frame, FrameChoice::Black);
        assert!(!add_ons.gift_wrap);
        assert!(!add_ons.signed);
    }
}
