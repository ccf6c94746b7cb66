//! Cart pricing and checkout over HTTP.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use darkroom_core::{CartId, CurrencyCode, Money, OrderId, ProductId};
use darkroom_integration_tests::TestApp;
use darkroom_server::db::OrderFilter;
use serde_json::json;

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_black_frame_cart() {
    let app = TestApp::new().await;
    let res = app
        .post_json(
            "/cart",
            &json!({
                "items": [{
                    "productId": "city-lights",
                    "variantId": "12x16",
                    "quantity": 2,
                    "addOns": { "frame": "black" }
                }]
            }),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert!(res.body["cartId"].as_str().is_some_and(|id| !id.is_empty()));
    assert_eq!(res.body["items"][0]["unitPrice"], 11_800);
    assert_eq!(res.body["items"][0]["lineTotal"], 23_600);
    assert_eq!(res.body["subtotal"], 23_600);
    assert_eq!(res.body["shipping"], 599);
    assert_eq!(res.body["total"], 24_199);
    assert_eq!(res.body["currency"], "GBP");
}

#[tokio::test]
async fn test_express_shipping_option() {
    let app = TestApp::new().await;
    let res = app
        .post_json(
            "/cart",
            &json!({
                "items": [{ "productId": "golden-hour", "variantId": "12x16", "quantity": 1 }],
                "shippingOption": "express"
            }),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["shipping"], 999);
    assert_eq!(res.body["total"], 7900 + 999);
}

#[tokio::test]
async fn test_resave_keeps_cart_id() {
    let app = TestApp::new().await;
    let cart_id = app.create_cart("city-lights", "12x16", 1).await;

    let res = app
        .post_json(
            "/cart",
            &json!({
                "cartId": cart_id,
                "items": [{ "productId": "city-lights", "variantId": "16x20", "quantity": 1 }]
            }),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["cartId"], cart_id.as_str());
    assert_eq!(res.body["subtotal"], 11_900);
}

#[tokio::test]
async fn test_blank_cart_id_is_replaced() {
    let app = TestApp::new().await;
    let item = json!([{ "productId": "city-lights", "variantId": "12x16", "quantity": 1 }]);

    let first = app
        .post_json(
            "/cart",
            &json!({ "cartId": "", "email": "first@example.com", "items": item }),
        )
        .await;
    assert_eq!(first.status, StatusCode::OK);
    let cart_id = first.body["cartId"].as_str().unwrap().to_owned();
    assert!(!cart_id.is_empty());

    let second = app.post_json("/cart", &json!({ "cartId": "", "items": item })).await;
    assert_eq!(second.status, StatusCode::OK);
    assert_ne!(second.body["cartId"], cart_id.as_str());

    assert!(app.repos.carts.get(&CartId::new("")).await.unwrap().is_none());

    let checkout = app.post_json("/checkout", &json!({ "cartId": cart_id })).await;
    assert_eq!(checkout.status, StatusCode::OK);
}

#[tokio::test]
async fn test_inactive_variant_is_400_and_nothing_saved() {
    let app = TestApp::new().await;
    let mut product = app
        .repos
        .products
        .get(&ProductId::new("golden-hour"))
        .await
        .unwrap()
        .unwrap();
    for variant in &mut product.variants {
        variant.is_active = variant.id.as_str() != "24x36";
    }
    app.repos.products.upsert(&product).await.unwrap();

    let res = app
        .post_json(
            "/cart",
            &json!({
                "cartId": "cart-retired-size",
                "items": [
                    { "productId": "golden-hour", "variantId": "12x16", "quantity": 1 },
                    { "productId": "golden-hour", "variantId": "24x36", "quantity": 1 }
                ]
            }),
        )
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error_code(), Some("invalid_variant"));
    let stored = app.repos.carts.get(&CartId::new("cart-retired-size")).await.unwrap();
    assert!(stored.is_none());
}

#[tokio::test]
async fn test_empty_cart_is_400() {
    let app = TestApp::new().await;
    let res = app.post_json("/cart", &json!({ "items": [] })).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error_code(), Some("invalid_argument"));
}

#[tokio::test]
async fn test_unknown_variant_is_400() {
    let app = TestApp::new().await;
    let res = app
        .post_json(
            "/cart",
            &json!({
                "items": [{ "productId": "city-lights", "variantId": "99x99", "quantity": 1 }]
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error_code(), Some("invalid_variant"));
}

#[tokio::test]
async fn test_one_missing_product_fails_whole_cart() {
    let app = TestApp::new().await;
    let res = app
        .post_json(
            "/cart",
            &json!({
                "items": [
                    { "productId": "city-lights", "variantId": "12x16", "quantity": 1 },
                    { "productId": "lost-print", "variantId": "12x16", "quantity": 1 }
                ]
            }),
        )
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.error_code(), Some("not_found"));
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let app = TestApp::new().await;
    let res = app
        .post_json(
            "/cart",
            &json!({ "items": [{ "productId": "city-lights", "variantId": "12x16", "quantity": -1 }] }),
        )
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error_code(), Some("invalid_argument"));
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_checkout_creates_pending_order() {
    let app = TestApp::new().await;
    let cart_id = app.create_cart("city-lights", "12x16", 1).await;

    let res = app
        .post_json(
            "/checkout",
            &json!({ "cartId": cart_id, "email": "jas@example.com" }),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["clientSecret"], "pi_test_1_secret");
    let order_number = res.body["orderNumber"].as_str().unwrap();
    assert!(order_number.starts_with("ORD-"));
    assert_eq!(order_number.len(), "ORD-".len() + 6);

    let order_id = OrderId::new(res.body["orderId"].as_str().unwrap());
    let order = app.repos.orders.get(&order_id).await.unwrap().unwrap();
    assert_eq!(order.payment_ref.as_str(), "pi_test_1");
    assert_eq!(order.email.unwrap().as_str(), "jas@example.com");

    let requests = app.gateway.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].amount, Money::from_minor(8900 + 599));
    assert_eq!(requests[0].currency, CurrencyCode::GBP);
    assert_eq!(requests[0].cart_id.as_str(), cart_id);
    assert_eq!(requests[0].order_id, order_id);

    let confirmation = app.get(&format!("/orders/{order_id}")).await;
    assert_eq!(confirmation.status, StatusCode::OK);
    assert_eq!(confirmation.body["order"]["paymentStatus"], "pending");
    assert_eq!(confirmation.body["order"]["fulfilmentStatus"], "created");
    assert_eq!(confirmation.body["order"]["total"], 8900 + 599);
}

#[tokio::test]
async fn test_checkout_requires_cart_id() {
    let app = TestApp::new().await;
    let res = app
        .post_json("/checkout", &json!({ "email": "jas@example.com" }))
        .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error_code(), Some("invalid_argument"));
    assert!(app.gateway.requests().await.is_empty());
}

#[tokio::test]
async fn test_checkout_unknown_cart_is_404() {
    let app = TestApp::new().await;
    let res = app
        .post_json("/checkout", &json!({ "cartId": "no-such-cart" }))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert!(app.gateway.requests().await.is_empty());
}

#[tokio::test]
async fn test_gateway_failure_is_502_without_order() {
    let app = TestApp::new().await;
    let cart_id = app.create_cart("golden-hour", "16x20", 1).await;
    app.gateway.fail_requests();

    let res = app
        .post_json("/checkout", &json!({ "cartId": cart_id }))
        .await;

    assert_eq!(res.status, StatusCode::BAD_GATEWAY);
    assert_eq!(res.error_code(), Some("payment_gateway_error"));
    assert!(
        !res.body["error"]
            .as_str()
            .unwrap()
            .contains("declined")
    );
    let orders = app.repos.orders.list(&OrderFilter::default()).await.unwrap();
    assert!(orders.is_empty());
}

#[tokio::test]
async fn test_checkout_rejects_incomplete_address() {
    let app = TestApp::new().await;
    let cart_id = app.create_cart("golden-hour", "12x16", 1).await;

    let res = app
        .post_json(
            "/checkout",
            &json!({
                "cartId": cart_id,
                "shippingAddress": {
                    "fullName": "Jas Patel",
                    "addressLine1": "",
                    "city": "Leeds",
                    "postcode": "LS1 1AA",
                    "country": "GB"
                }
            }),
        )
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert!(res.body["error"].as_str().unwrap().contains("addressLine1"));
}

#[tokio::test]
async fn test_unknown_order_is_404() {
    let app = TestApp::new().await;
    let res = app.get("/orders/missing").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}
