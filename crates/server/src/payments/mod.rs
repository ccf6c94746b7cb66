//! Payment gateway integration.
//!
//! # Architecture
//!
//! - [`PaymentGateway`] is the seam checkout talks to; [`StripeClient`] is
//!   the production implementation (form-encoded REST calls via `reqwest`)
//! - [`WebhookVerifier`] checks `Stripe-Signature` headers against the exact
//!   raw request bytes before any event is parsed
//!
//! The gateway's internals (charging, 3DS, receipts) are opaque: the store
//! only creates payment intents and listens for their outcome.

pub mod signature;
pub mod stripe;

pub use signature::{SIGNATURE_HEADER, SignatureError, WebhookVerifier, sign_payload};
pub use stripe::StripeClient;

use async_trait::async_trait;
use darkroom_core::{CartId, CurrencyCode, Email, Money, OrderId, PaymentIntentId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when talking to the payment gateway.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The gateway rejected the request.
    #[error("gateway returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The request could not be built (e.g. a negative amount).
    #[error("invalid payment request: {0}")]
    InvalidRequest(String),
}

/// Parameters for a new payment intent.
#[derive(Debug, Clone)]
pub struct CreateIntentRequest {
    /// Charge amount in minor units.
    pub amount: Money,
    pub currency: CurrencyCode,
    /// Cart the intent pays for, recorded as gateway metadata.
    pub cart_id: CartId,
    /// Order that will reference the intent; used as the idempotency key.
    pub order_id: OrderId,
    pub receipt_email: Option<Email>,
}

/// A created payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: PaymentIntentId,
    /// Secret the browser uses to confirm the payment.
    pub client_secret: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

/// A payment service that can open payment intents.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a payment intent with automatic payment method selection.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError` if the request fails or the gateway rejects it.
    async fn create_payment_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<PaymentIntent, PaymentError>;
}
