//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                          - Liveness check
//!
//! # Catalog
//! GET  /products                        - Published products (filter/search/sort)
//! GET  /products/{slug}                 - Single published product
//!
//! # Cart and checkout
//! POST /cart                            - Price and persist a cart
//! POST /checkout                        - Payment intent + pending order
//! GET  /orders/{id}                     - Order confirmation
//!
//! # Payment gateway
//! POST /webhook                         - Signed payment events (raw body)
//!
//! # Admin (bearer token when configured)
//! POST /admin/seed                      - Load the demo catalog
//! GET  /admin/orders                    - List orders, newest first
//! POST /admin/orders/{id}/fulfilment    - Advance fulfilment status
//! PUT  /admin/settings/pricing          - Replace the pricing override
//! ```

pub mod admin;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;
pub mod webhooks;

use std::time::Duration;

use axum::{
    Json, Router,
    http::{Request, Response},
    middleware::from_fn,
    routing::{get, post, put},
};
use serde::Serialize;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub ok: bool,
}

/// Liveness health check. Does not check dependencies.
pub async fn health() -> Json<Health> {
    Json(Health { ok: true })
}

/// Store-facing routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{slug}", get(products::show))
        .route("/cart", post(cart::save))
        .route("/checkout", post(checkout::create))
        .route("/orders/{id}", get(orders::show))
        .route("/webhook", post(webhooks::receive))
}

/// Admin routes, mounted under `/admin`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/seed", post(admin::seed))
        .route("/orders", get(admin::orders))
        .route("/orders/{id}/fulfilment", post(admin::update_fulfilment))
        .route("/settings/pricing", put(admin::update_pricing))
}

/// The complete application: routes, tracing, request ids and Sentry.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(routes())
        .nest("/admin", admin_routes())
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
