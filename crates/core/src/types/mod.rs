//! Core types for Darkroom.
//!
//! This module provides type-safe wrappers for domain concepts and the
//! documents persisted by the server.

pub mod cart;
pub mod catalog;
pub mod email;
pub mod id;
pub mod money;
pub mod order;
pub mod pricing;
pub mod status;
pub mod webhook;

pub use cart::{AddOnSelection, Cart, CartLineInput, CartWrite, PricedLine};
pub use catalog::{DimensionUnit, Product, ProductMetadata, Variant};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{CurrencyCode, Money};
pub use order::{Order, OrderContact, OrderNumber, ShippingAddress};
pub use pricing::{
    AddOnPrices, AddOnPricesOverride, FramePrices, FramePricesOverride, PricingConfig,
    PricingOverride, ShippingRates, ShippingRatesOverride,
};
pub use status::*;
pub use webhook::WebhookEventRecord;
