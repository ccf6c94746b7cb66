//! Darkroom print store backend.
//!
//! Catalog lookup, cart pricing, checkout with Stripe payment intents, and
//! payment webhook reconciliation, served over axum. The binary in
//! `main.rs` wires configuration into [`routes::app`]; everything else lives
//! here so it can be driven directly from tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod payments;
pub mod routes;
pub mod services;
pub mod state;
