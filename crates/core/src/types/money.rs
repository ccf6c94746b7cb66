//! Integer money in minor currency units.
//!
//! Every price, total and add-on delta in the store is an `i64` count of the
//! smallest denomination of the store currency (pence for GBP). There is no
//! floating point anywhere in the pricing path, so arithmetic is exact; the
//! only failure mode is overflow, which the checked operations surface.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// An amount of money in minor currency units (e.g. pence).
///
/// The currency is carried alongside the amount on the owning document
/// (cart, order, pricing config) rather than on every value.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero minor units.
    pub const ZERO: Self = Self(0);

    /// Create an amount from a count of minor units.
    #[must_use]
    pub const fn from_minor(minor_units: i64) -> Self {
        Self(minor_units)
    }

    /// The amount as a count of minor units.
    #[must_use]
    pub const fn minor_units(self) -> i64 {
        self.0
    }

    /// Add two amounts, returning `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Multiply by a quantity, returning `None` on overflow.
    #[must_use]
    pub const fn checked_mul(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as i64) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Sum an iterator of amounts, returning `None` on overflow.
    pub fn checked_sum<I: IntoIterator<Item = Self>>(amounts: I) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, |acc, amount| acc.checked_add(amount))
    }

    /// Whether the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Format for display in the given currency (e.g. "£118.00").
    #[must_use]
    pub fn display(self, currency: CurrencyCode) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{sign}{}{}.{:02}", currency.symbol(), abs / 100, abs % 100)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ISO 4217 currency codes the store can price in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    GBP,
    USD,
    EUR,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// The upper-case ISO code ("GBP").
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::GBP => "GBP",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
        }
    }

    /// The lower-case code expected by the payment gateway ("gbp").
    #[must_use]
    pub const fn gateway_code(self) -> &'static str {
        match self {
            Self::GBP => "gbp",
            Self::USD => "usd",
            Self::EUR => "eur",
            Self::CAD => "cad",
            Self::AUD => "aud",
        }
    }

    /// Currency symbol for display.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::GBP => "£",
            Self::EUR => "€",
            Self::USD | Self::CAD | Self::AUD => "$",
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GBP" => Ok(Self::GBP),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            _ => Err(format!("unsupported currency: {s}")),
        }
    }
}
