//! Stripe REST client.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::{CreateIntentRequest, PaymentError, PaymentGateway, PaymentIntent};
use crate::config::StripeConfig;

const PAYMENT_INTENTS_PATH: &str = "/v1/payment_intents";

/// Client for the Stripe API.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    api_base: Url,
    secret_key: SecretString,
}

/// Error envelope returned by Stripe on non-2xx responses.
#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Http` if the HTTP client cannot be created.
    pub fn new(config: &StripeConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            secret_key: config.secret_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, PaymentError> {
        self.api_base
            .join(path)
            .map_err(|e| PaymentError::InvalidRequest(format!("bad API base URL: {e}")))
    }
}

/// Form fields for `POST /v1/payment_intents`.
fn intent_form(request: &CreateIntentRequest) -> Result<Vec<(&'static str, String)>, PaymentError> {
    let amount = request.amount.minor_units();
    if amount <= 0 {
        return Err(PaymentError::InvalidRequest(format!(
            "amount must be positive (got {amount})"
        )));
    }

    let mut form = vec![
        ("amount", amount.to_string()),
        ("currency", request.currency.gateway_code().to_owned()),
        ("metadata[cartId]", request.cart_id.to_string()),
        ("metadata[orderId]", request.order_id.to_string()),
        ("automatic_payment_methods[enabled]", "true".to_owned()),
    ];
    if let Some(email) = &request.receipt_email {
        form.push(("receipt_email", email.to_string()));
    }

    Ok(form)
}

#[async_trait]
impl PaymentGateway for StripeClient {
    #[instrument(skip(self, request), fields(cart_id = %request.cart_id, order_id = %request.order_id))]
    async fn create_payment_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        let form = intent_form(&request)?;
        let url = self.endpoint(PAYMENT_INTENTS_PATH)?;

        let response = self
            .client
            .post(url)
            .bearer_auth(self.secret_key.expose_secret())
            .header("Idempotency-Key", format!("order-{}", request.order_id))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<StripeErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error.message)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_owned());
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let intent: PaymentIntent = response.json().await?;
        debug!(payment_intent = %intent.id, "Payment intent created");

        Ok(intent)
    }
}
