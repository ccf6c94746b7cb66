//! Business logic services.
//!
//! Services borrow the repositories (and gateway/clock where needed) from
//! application state for the duration of one request:
//!
//! - [`pricing`] - effective pricing configuration
//! - [`catalog`] - published product lookup and listing
//! - [`cart`] - cart pricing engine and persistence
//! - [`checkout`] - payment intent + order creation
//! - [`webhooks`] - payment event reconciliation
//! - [`orders`] - order lookup and fulfilment administration
//! - [`seed`] - demo catalog

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;
pub mod pricing;
pub mod seed;
pub mod webhooks;

pub use cart::{CartService, PricedItems, SaveCartRequest};
pub use catalog::{CatalogService, ProductQuery, SortOrder};
pub use checkout::{CheckoutReceipt, CheckoutRequest, CheckoutService};
pub use orders::OrderService;
pub use pricing::PricingService;
pub use seed::seed_catalog;
pub use webhooks::{WebhookOutcome, WebhookService};

use darkroom_core::{ProductId, StatusTransitionError, VariantId};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::payments::{PaymentError, SignatureError};

/// Domain errors surfaced by services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Entity absent or not externally visible.
    #[error("{0} not found")]
    NotFound(String),

    /// Variant missing from the product or not active.
    #[error("variant {variant_id} is not available for product {product_id}")]
    InvalidVariant {
        product_id: ProductId,
        variant_id: VariantId,
    },

    /// Request failed validation.
    #[error("{0}")]
    InvalidArgument(String),

    /// Webhook signature verification failed.
    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] SignatureError),

    /// The payment gateway failed or rejected the request.
    #[error("payment gateway error: {0}")]
    PaymentGateway(#[from] PaymentError),

    /// The change conflicts with the current state.
    #[error("{0}")]
    Conflict(String),

    /// Storage failure.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<StatusTransitionError> for ServiceError {
    fn from(err: StatusTransitionError) -> Self {
        Self::Conflict(err.to_string())
    }
}
