//! Test harness for end-to-end HTTP tests.
//!
//! [`TestApp`] builds the full router over in-memory repositories, a fixed
//! clock and a [`RecordingGateway`], and drives it with
//! `tower::ServiceExt::oneshot`. No network or database is involved.
//!
//! ```rust,ignore
//! let app = TestApp::new().await;
//! let res = app.get("/products/city-lights").await;
//! assert_eq!(res.status, StatusCode::OK);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use chrono::{DateTime, TimeZone, Utc};
use secrecy::SecretString;
use serde_json::Value;
use tokio::sync::Mutex;
use tower::ServiceExt;

use darkroom_core::PaymentIntentId;
use darkroom_server::db::{Clock, FixedClock, Repositories};
use darkroom_server::payments::{
    CreateIntentRequest, PaymentError, PaymentGateway, PaymentIntent, SIGNATURE_HEADER,
    WebhookVerifier, sign_payload,
};
use darkroom_server::routes;
use darkroom_server::services::seed_catalog;
use darkroom_server::state::AppState;

pub const WEBHOOK_SECRET: &str = "whsec_it_7Hq2Lx9vR4mK8sT1";
pub const ADMIN_TOKEN: &str = "adm_K8f2Qx7LmP4vT9wZ3nB6yR1sD5hJ0cGe";

/// The fixed "now" every test app runs at.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

// =============================================================================
// Fake payment gateway
// =============================================================================

/// Payment gateway that records requests and returns predictable intents.
///
/// Intent ids are `pi_test_<n>` with client secret `pi_test_<n>_secret`,
/// numbered from 1 in call order.
#[derive(Default)]
pub struct RecordingGateway {
    requests: Mutex<Vec<CreateIntentRequest>>,
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl RecordingGateway {
    /// Make every following call fail like a declined API request.
    pub fn fail_requests(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Requests received so far, in order.
    pub async fn requests(&self) -> Vec<CreateIntentRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn create_payment_intent(
        &self,
        request: CreateIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requests.lock().await.push(request.clone());

        if self.fail.load(Ordering::SeqCst) {
            return Err(PaymentError::Api {
                status: 402,
                message: "Your card was declined.".to_string(),
            });
        }

        Ok(PaymentIntent {
            id: PaymentIntentId::new(format!("pi_test_{n}")),
            client_secret: format!("pi_test_{n}_secret"),
            amount: request.amount.minor_units(),
            currency: request.currency.gateway_code().to_string(),
            status: "requires_payment_method".to_string(),
        })
    }
}

// =============================================================================
// Test application
// =============================================================================

/// How to build a [`TestApp`].
#[derive(Debug, Clone, Copy)]
pub struct TestOptions {
    /// Load the demo catalog before the first request.
    pub seed: bool,
    pub admin_token: Option<&'static str>,
    pub webhook_secret: Option<&'static str>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            seed: true,
            admin_token: None,
            webhook_secret: Some(WEBHOOK_SECRET),
        }
    }
}

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    /// JSON body, or `Value::Null` if the body was empty or not JSON.
    pub body: Value,
}

impl TestResponse {
    /// The `code` field of an error body.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        self.body.get("code").and_then(Value::as_str)
    }
}

/// The router plus handles to everything behind it.
pub struct TestApp {
    router: Router,
    pub repos: Repositories,
    pub gateway: Arc<RecordingGateway>,
}

impl TestApp {
    /// Seeded app, webhook secret set, admin routes open.
    pub async fn new() -> Self {
        Self::with_options(TestOptions::default()).await
    }

    /// Build an app with explicit options.
    ///
    /// # Panics
    ///
    /// Panics if seeding the in-memory store fails.
    pub async fn with_options(options: TestOptions) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(FixedClock(now()));
        let repos = Repositories::in_memory(Arc::clone(&clock));
        if options.seed {
            seed_catalog(&repos, clock.as_ref())
                .await
                .expect("seeding the in-memory store");
        }

        let gateway = Arc::new(RecordingGateway::default());
        let verifier = WebhookVerifier::new(
            options.webhook_secret.map(SecretString::from),
            Duration::from_secs(300),
        );
        let state = AppState::from_parts(
            repos.clone(),
            Arc::clone(&gateway) as Arc<dyn PaymentGateway>,
            verifier,
            clock,
            options.admin_token.map(SecretString::from),
        );

        Self {
            router: routes::app(state),
            repos,
            gateway,
        }
    }

    /// Send a request through the router.
    ///
    /// # Panics
    ///
    /// Panics if the router fails or the body cannot be read.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("reading response body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(request(Method::GET, uri, None, None)).await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> TestResponse {
        self.send(request(Method::POST, uri, Some(body), None)).await
    }

    /// Request with an `Authorization: Bearer` header.
    pub async fn admin(
        &self,
        method: Method,
        uri: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> TestResponse {
        self.send(request(method, uri, body, token)).await
    }

    /// Deliver a webhook body with an explicit signature header.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built.
    pub async fn webhook(&self, payload: &str, signature: Option<&str>) -> TestResponse {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/webhook")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(signature) = signature {
            builder = builder.header(SIGNATURE_HEADER, signature);
        }
        let request = builder
            .body(Body::from(payload.to_owned()))
            .expect("building webhook request");
        self.send(request).await
    }

    /// Deliver a webhook body signed with [`WEBHOOK_SECRET`] at [`now`].
    pub async fn signed_webhook(&self, payload: &str) -> TestResponse {
        let signature = sign_payload(WEBHOOK_SECRET, payload.as_bytes(), now().timestamp());
        self.webhook(payload, Some(&signature)).await
    }

    /// Price and save a one-line cart; returns the cart id.
    ///
    /// # Panics
    ///
    /// Panics if the cart is rejected.
    pub async fn create_cart(&self, product: &str, variant: &str, quantity: u32) -> String {
        let res = self
            .post_json(
                "/cart",
                &serde_json::json!({
                    "items": [{ "productId": product, "variantId": variant, "quantity": quantity }]
                }),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "cart rejected: {}", res.body);
        res.body["cartId"]
            .as_str()
            .expect("cartId in response")
            .to_owned()
    }
}

fn request(method: Method, uri: &str, body: Option<&Value>, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("building request")
}

/// A Stripe-shaped payment intent event.
#[must_use]
pub fn payment_event(event_id: &str, event_type: &str, intent_id: &str) -> String {
    serde_json::json!({
        "id": event_id,
        "object": "event",
        "type": event_type,
        "created": now().timestamp(),
        "data": {
            "object": {
                "id": intent_id,
                "object": "payment_intent",
                "status": "succeeded"
            }
        }
    })
    .to_string()
}
