//! Darkroom Core - Shared domain types for the print store.
//!
//! This crate provides the types used across all Darkroom components:
//! - `server` - HTTP backend (catalog, cart pricing, checkout, payment webhooks)
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Pricing arithmetic lives here because it is pure:
//! every monetary value is an integer count of minor currency units.
//!
//! # Modules
//!
//! - [`types`] - Ids, money, statuses, and the catalog/cart/order documents

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
