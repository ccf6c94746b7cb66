//! Store pricing configuration: currency, shipping rates and add-on prices.
//!
//! The effective configuration is the hard-coded [`PricingConfig::default`]
//! with an optional persisted [`PricingOverride`] laid over it. The merge is
//! per field, at every nesting level: an override that only sets
//! `shipping.express` leaves `shipping.standard` at its default. Override
//! values always win over defaults.

use serde::{Deserialize, Serialize};

use super::cart::AddOnSelection;
use super::money::{CurrencyCode, Money};
use super::status::{FrameChoice, ShippingMethod};

/// Shipping cost per method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingRates {
    pub standard: Money,
    pub express: Money,
}

impl ShippingRates {
    /// Cost of the given shipping method.
    #[must_use]
    pub const fn rate_for(&self, method: ShippingMethod) -> Money {
        match method {
            ShippingMethod::Standard => self.standard,
            ShippingMethod::Express => self.express,
        }
    }
}

/// Frame prices per colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramePrices {
    pub black: Money,
    pub white: Money,
}

impl FramePrices {
    /// Price delta for a frame choice (zero for no frame).
    #[must_use]
    pub const fn price_for(&self, choice: FrameChoice) -> Money {
        match choice {
            FrameChoice::None => Money::ZERO,
            FrameChoice::Black => self.black,
            FrameChoice::White => self.white,
        }
    }
}

/// Add-on price table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOnPrices {
    pub frame: FramePrices,
    pub gift_wrap: Money,
    pub signed: Money,
}

impl AddOnPrices {
    /// Total add-on delta for one unit of a line.
    ///
    /// Frame, gift wrap and signature deltas are added together; an absent
    /// selection contributes nothing. Returns `None` on overflow.
    #[must_use]
    pub fn delta_for(&self, selection: Option<&AddOnSelection>) -> Option<Money> {
        let Some(selection) = selection else {
            return Some(Money::ZERO);
        };

        let frame = self.frame.price_for(selection.frame);
        let gift_wrap = if selection.gift_wrap {
            self.gift_wrap
        } else {
            Money::ZERO
        };
        let signed = if selection.signed {
            self.signed
        } else {
            Money::ZERO
        };

        Money::checked_sum([frame, gift_wrap, signed])
    }
}

/// Effective pricing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingConfig {
    pub currency: CurrencyCode,
    pub shipping: ShippingRates,
    pub add_ons: AddOnPrices,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            currency: CurrencyCode::GBP,
            shipping: ShippingRates {
                standard: Money::from_minor(599),
                express: Money::from_minor(999),
            },
            add_ons: AddOnPrices {
                frame: FramePrices {
                    black: Money::from_minor(2900),
                    white: Money::from_minor(3100),
                },
                gift_wrap: Money::from_minor(500),
                signed: Money::from_minor(1500),
            },
        }
    }
}

impl PricingConfig {
    /// Apply an override on top of this configuration, field by field.
    #[must_use]
    pub fn with_override(self, over: &PricingOverride) -> Self {
        let mut config = self;

        if let Some(currency) = over.currency {
            config.currency = currency;
        }
        if let Some(shipping) = &over.shipping {
            config.shipping = shipping.apply_to(config.shipping);
        }
        if let Some(add_ons) = &over.add_ons {
            config.add_ons = add_ons.apply_to(config.add_ons);
        }

        config
    }
}

/// Partial shipping rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ShippingRatesOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub express: Option<Money>,
}

impl ShippingRatesOverride {
    const fn apply_to(&self, mut rates: ShippingRates) -> ShippingRates {
        if let Some(v) = self.standard {
            rates.standard = v;
        }
        if let Some(v) = self.express {
            rates.express = v;
        }
        rates
    }

    const fn merged_with(self, newer: Self) -> Self {
        Self {
            standard: or(newer.standard, self.standard),
            express: or(newer.express, self.express),
        }
    }
}

/// Partial frame prices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FramePricesOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub black: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub white: Option<Money>,
}

impl FramePricesOverride {
    const fn apply_to(&self, mut prices: FramePrices) -> FramePrices {
        if let Some(v) = self.black {
            prices.black = v;
        }
        if let Some(v) = self.white {
            prices.white = v;
        }
        prices
    }

    const fn merged_with(self, newer: Self) -> Self {
        Self {
            black: or(newer.black, self.black),
            white: or(newer.white, self.white),
        }
    }
}

/// Partial add-on price table.
///
/// Also used for a product's own add-on table in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOnPricesOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<FramePricesOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gift_wrap: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed: Option<Money>,
}

impl AddOnPricesOverride {
    fn apply_to(&self, mut prices: AddOnPrices) -> AddOnPrices {
        if let Some(frame) = &self.frame {
            prices.frame = frame.apply_to(prices.frame);
        }
        if let Some(v) = self.gift_wrap {
            prices.gift_wrap = v;
        }
        if let Some(v) = self.signed {
            prices.signed = v;
        }
        prices
    }

    fn merged_with(self, newer: Self) -> Self {
        Self {
            frame: merge_nested(self.frame, newer.frame, FramePricesOverride::merged_with),
            gift_wrap: or(newer.gift_wrap, self.gift_wrap),
            signed: or(newer.signed, self.signed),
        }
    }
}

impl From<AddOnPrices> for AddOnPricesOverride {
    fn from(prices: AddOnPrices) -> Self {
        Self {
            frame: Some(FramePricesOverride {
                black: Some(prices.frame.black),
                white: Some(prices.frame.white),
            }),
            gift_wrap: Some(prices.gift_wrap),
            signed: Some(prices.signed),
        }
    }
}

/// The persisted pricing override document (`settings.store`).
///
/// Every field is optional; missing fields fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<CurrencyCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping: Option<ShippingRatesOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_ons: Option<AddOnPricesOverride>,
}

impl PricingOverride {
    /// Merge a newer partial write over this stored override.
    ///
    /// Fields present in `newer` replace stored ones; fields it omits are
    /// preserved. This is the document-merge write used by seeding.
    #[must_use]
    pub fn merged_with(self, newer: Self) -> Self {
        Self {
            currency: or(newer.currency, self.currency),
            shipping: merge_nested(self.shipping, newer.shipping, ShippingRatesOverride::merged_with),
            add_ons: merge_nested(self.add_ons, newer.add_ons, AddOnPricesOverride::merged_with),
        }
    }
}

impl From<PricingConfig> for PricingOverride {
    fn from(config: PricingConfig) -> Self {
        Self {
            currency: Some(config.currency),
            shipping: Some(ShippingRatesOverride {
                standard: Some(config.shipping.standard),
                express: Some(config.shipping.express),
            }),
            add_ons: Some(config.add_ons.into()),
        }
    }
}

const fn or<T: Copy>(preferred: Option<T>, fallback: Option<T>) -> Option<T> {
    match preferred {
        Some(v) => Some(v),
        None => fallback,
    }
}

fn merge_nested<T>(stored: Option<T>, newer: Option<T>, merge: fn(T, T) -> T) -> Option<T> {
    match (stored, newer) {
        (Some(stored), Some(newer)) => Some(merge(stored, newer)),
        (stored, None) => stored,
        (None, newer) => newer,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PricingConfig::default();
        assert_eq!(config.currency, CurrencyCode::GBP);
        assert_eq!(config.shipping.standard, Money::from_minor(599));
        assert_eq!(config.shipping.express, Money::from_minor(999));
        assert_eq!(config.add_ons.frame.black, Money::from_minor(2900));
        assert_eq!(config.add_ons.frame.white, Money::from_minor(3100));
        assert_eq!(config.add_ons.gift_wrap, Money::from_minor(500));
        assert_eq!(config.add_ons.signed, Money::from_minor(1500));
    }

    #[test]
    fn test_override_wins_per_field_not_per_object() {
        let over: PricingOverride =
            serde_json::from_str(r#"{"shipping":{"express":1299},"addOns":{"frame":{"white":3500}}}"#)
                .unwrap();

        let config = PricingConfig::default().with_override(&over);
        assert_eq!(config.shipping.express, Money::from_minor(1299));
        // siblings keep their defaults
        assert_eq!(config.shipping.standard, Money::from_minor(599));
        assert_eq!(config.add_ons.frame.white, Money::from_minor(3500));
        assert_eq!(config.add_ons.frame.black, Money::from_minor(2900));
        assert_eq!(config.add_ons.gift_wrap, Money::from_minor(500));
        assert_eq!(config.currency, CurrencyCode::GBP);
    }

    #[test]
    fn test_empty_override_is_identity() {
        let config = PricingConfig::default().with_override(&PricingOverride::default());
        assert_eq!(config, PricingConfig::default());
    }

    #[test]
    fn test_full_override_round_trips_config() {
        let mut custom = PricingConfig::default();
        custom.currency = CurrencyCode::EUR;
        custom.add_ons.signed = Money::from_minor(2000);

        let over = PricingOverride::from(custom);
        assert_eq!(PricingConfig::default().with_override(&over), custom);
    }

    #[test]
    fn test_merge_preserves_unspecified_fields() {
        let stored = PricingOverride {
            currency: Some(CurrencyCode::USD),
            shipping: Some(ShippingRatesOverride {
                standard: Some(Money::from_minor(700)),
                express: None,
            }),
            add_ons: None,
        };
        let newer = PricingOverride {
            currency: None,
            shipping: Some(ShippingRatesOverride {
                standard: None,
                express: Some(Money::from_minor(1500)),
            }),
            add_ons: None,
        };

        let merged = stored.merged_with(newer);
        assert_eq!(merged.currency, Some(CurrencyCode::USD));
        let shipping = merged.shipping.unwrap();
        assert_eq!(shipping.standard, Some(Money::from_minor(700)));
        assert_eq!(shipping.express, Some(Money::from_minor(1500)));
    }

    #[test]
    fn test_add_on_delta() {
        let prices = PricingConfig::default().add_ons;

        assert_eq!(prices.delta_for(None), Some(Money::ZERO));

        let black_frame = AddOnSelection {
            frame: FrameChoice::Black,
            gift_wrap: false,
            signed: false,
        };
        assert_eq!(prices.delta_for(Some(&black_frame)), Some(Money::from_minor(2900)));

        let everything = AddOnSelection {
            frame: FrameChoice::White,
            gift_wrap: true,
            signed: true,
        };
        assert_eq!(
            prices.delta_for(Some(&everything)),
            Some(Money::from_minor(3100 + 500 + 1500))
        );

        let no_frame = AddOnSelection {
            frame: FrameChoice::None,
            gift_wrap: true,
            signed: false,
        };
        assert_eq!(prices.delta_for(Some(&no_frame)), Some(Money::from_minor(500)));
    }

    #[test]
    fn test_rate_for_method() {
        let rates = PricingConfig::default().shipping;
        assert_eq!(rates.rate_for(ShippingMethod::Standard), Money::from_minor(599));
        assert_eq!(rates.rate_for(ShippingMethod::Express), Money::from_minor(999));
    }
}
