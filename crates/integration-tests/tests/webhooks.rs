//! Payment webhook reconciliation over HTTP.
//!
//! Each test checks out a cart first so there is an order holding
//! `pi_test_1`, then delivers signed events against it.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use darkroom_core::{FulfilmentStatus, Order, OrderId, PaymentStatus, WebhookEventId};
use darkroom_integration_tests::{
    TestApp, TestOptions, WEBHOOK_SECRET, now, payment_event,
};
use darkroom_server::payments::sign_payload;
use serde_json::json;

const SUCCEEDED: &str = "payment_intent.succeeded";
const FAILED: &str = "payment_intent.payment_failed";

async fn app_with_order() -> (TestApp, OrderId) {
    let app = TestApp::new().await;
    let cart_id = app.create_cart("city-lights", "12x16", 2).await;
    let res = app
        .post_json("/checkout", &json!({ "cartId": cart_id }))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let order_id = OrderId::new(res.body["orderId"].as_str().unwrap());
    (app, order_id)
}

async fn order(app: &TestApp, id: &OrderId) -> Order {
    app.repos.orders.get(id).await.unwrap().unwrap()
}

async fn recorded(app: &TestApp, event_id: &str) -> bool {
    app.repos
        .webhook_events
        .get(&WebhookEventId::new(event_id))
        .await
        .unwrap()
        .is_some()
}

// =============================================================================
// Signature handling
// =============================================================================

#[tokio::test]
async fn test_missing_signature_is_400() {
    let (app, order_id) = app_with_order().await;
    let res = app
        .webhook(&payment_event("evt_1", SUCCEEDED, "pi_test_1"), None)
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error_code(), Some("invalid_signature"));
    assert_eq!(order(&app, &order_id).await.payment_status, PaymentStatus::Pending);
    assert!(!recorded(&app, "evt_1").await);
}

#[tokio::test]
async fn test_wrong_secret_is_400() {
    let (app, order_id) = app_with_order().await;
    let payload = payment_event("evt_1", SUCCEEDED, "pi_test_1");
    let signature = sign_payload("whsec_not_the_right_one", payload.as_bytes(), now().timestamp());

    let res = app.webhook(&payload, Some(&signature)).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(order(&app, &order_id).await.payment_status, PaymentStatus::Pending);
    assert!(!recorded(&app, "evt_1").await);
}

#[tokio::test]
async fn test_reserialized_body_does_not_verify() {
    let (app, _) = app_with_order().await;
    let payload = payment_event("evt_1", SUCCEEDED, "pi_test_1");
    let signature = sign_payload(WEBHOOK_SECRET, payload.as_bytes(), now().timestamp());

    let pretty =
        serde_json::to_string_pretty(&serde_json::from_str::<serde_json::Value>(&payload).unwrap())
            .unwrap();
    let res = app.webhook(&pretty, Some(&signature)).await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stale_signature_is_400() {
    let (app, _) = app_with_order().await;
    let payload = payment_event("evt_1", SUCCEEDED, "pi_test_1");
    let signature = sign_payload(WEBHOOK_SECRET, payload.as_bytes(), now().timestamp() - 3600);

    let res = app.webhook(&payload, Some(&signature)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_no_configured_secret_rejects_everything() {
    let app = TestApp::with_options(TestOptions {
        webhook_secret: None,
        ..TestOptions::default()
    })
    .await;

    let res = app
        .signed_webhook(&payment_event("evt_1", SUCCEEDED, "pi_test_1"))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Reconciliation
// =============================================================================

#[tokio::test]
async fn test_payment_succeeded_marks_order_paid() {
    let (app, order_id) = app_with_order().await;
    let before = order(&app, &order_id).await;

    let res = app
        .signed_webhook(&payment_event("evt_1", SUCCEEDED, "pi_test_1"))
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["received"], true);

    let after = order(&app, &order_id).await;
    assert_eq!(after.payment_status, PaymentStatus::Paid);
    assert_eq!(after.fulfilment_status, FulfilmentStatus::Created);
    assert_eq!(after.items, before.items);
    assert_eq!(after.total, before.total);
    assert!(recorded(&app, "evt_1").await);
}

#[tokio::test]
async fn test_duplicate_delivery_is_acknowledged_once() {
    let (app, order_id) = app_with_order().await;
    let payload = payment_event("evt_1", SUCCEEDED, "pi_test_1");

    let first = app.signed_webhook(&payload).await;
    let paid = order(&app, &order_id).await;

    let second = app.signed_webhook(&payload).await;

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(second.body["received"], true);
    assert_eq!(order(&app, &order_id).await, paid);
}

#[tokio::test]
async fn test_event_for_unknown_intent_is_acknowledged() {
    let (app, order_id) = app_with_order().await;

    let res = app
        .signed_webhook(&payment_event("evt_9", SUCCEEDED, "pi_someone_else"))
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(order(&app, &order_id).await.payment_status, PaymentStatus::Pending);
    assert!(recorded(&app, "evt_9").await);
}

#[tokio::test]
async fn test_unhandled_event_type_is_acknowledged() {
    let (app, order_id) = app_with_order().await;

    let res = app
        .signed_webhook(&payment_event("evt_2", "customer.created", "pi_test_1"))
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(order(&app, &order_id).await.payment_status, PaymentStatus::Pending);
}

#[tokio::test]
async fn test_failed_payment_then_retry() {
    let (app, order_id) = app_with_order().await;

    app.signed_webhook(&payment_event("evt_f", FAILED, "pi_test_1"))
        .await;
    assert_eq!(order(&app, &order_id).await.payment_status, PaymentStatus::Failed);

    app.signed_webhook(&payment_event("evt_s", SUCCEEDED, "pi_test_1"))
        .await;
    assert_eq!(order(&app, &order_id).await.payment_status, PaymentStatus::Paid);

    let res = app
        .signed_webhook(&payment_event("evt_late", FAILED, "pi_test_1"))
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(order(&app, &order_id).await.payment_status, PaymentStatus::Paid);
}
