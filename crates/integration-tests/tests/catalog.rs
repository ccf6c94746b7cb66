//! Catalog endpoints: health, listing, filters and slug lookup.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use darkroom_core::{ProductId, ProductStatus};
use darkroom_integration_tests::{TestApp, TestOptions};

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let res = app.get("/health").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["ok"], true);
}

#[tokio::test]
async fn test_empty_store_lists_nothing() {
    let app = TestApp::with_options(TestOptions {
        seed: false,
        ..TestOptions::default()
    })
    .await;

    let res = app.get("/products").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["products"].as_array().unwrap().len(), 0);
}

// =============================================================================
// Listing
// =============================================================================

#[tokio::test]
async fn test_lists_seeded_products() {
    let app = TestApp::new().await;
    let res = app.get("/products").await;

    assert_eq!(res.status, StatusCode::OK);
    let products = res.body["products"].as_array().unwrap();
    assert_eq!(products.len(), 3);
    assert!(products.iter().all(|p| p["status"] == "published"));
}

#[tokio::test]
async fn test_filters_by_collection_tag_and_orientation() {
    let app = TestApp::new().await;

    let res = app.get("/products?collection=Nature").await;
    let products = res.body["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["slug"], "golden-hour");

    let res = app.get("/products?tag=night").await;
    let products = res.body["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["slug"], "city-lights");

    let res = app.get("/products?orientation=portrait").await;
    let products = res.body["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["slug"], "abstract-lines");
}

#[tokio::test]
async fn test_search_is_case_insensitive() {
    let app = TestApp::new().await;
    let res = app.get("/products?search=GOLDEN").await;
    let products = res.body["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["slug"], "golden-hour");

    let res = app.get("/products?search=minimal").await;
    let products = res.body["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["slug"], "abstract-lines");
}

#[tokio::test]
async fn test_sort_by_price() {
    let app = TestApp::new().await;

    let res = app.get("/products?sort=price-low").await;
    let slugs: Vec<_> = res.body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["slug"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(slugs, ["abstract-lines", "golden-hour", "city-lights"]);

    let res = app.get("/products?sort=price-high").await;
    let slugs: Vec<_> = res.body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["slug"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(slugs, ["city-lights", "golden-hour", "abstract-lines"]);
}

#[tokio::test]
async fn test_invalid_orientation_is_rejected() {
    let app = TestApp::new().await;
    let res = app.get("/products?orientation=diagonal").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error_code(), Some("invalid_argument"));
}

// =============================================================================
// Single product
// =============================================================================

#[tokio::test]
async fn test_product_by_slug() {
    let app = TestApp::new().await;
    let res = app.get("/products/city-lights").await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["product"]["title"], "City Lights");
    assert_eq!(res.body["product"]["variants"][0]["basePrice"], 8900);
}

#[tokio::test]
async fn test_unknown_slug_is_404() {
    let app = TestApp::new().await;
    let res = app.get("/products/no-such-print").await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.error_code(), Some("not_found"));
    assert!(res.body["error"].is_string());
}

#[tokio::test]
async fn test_draft_product_is_hidden() {
    let app = TestApp::new().await;
    let mut product = app
        .repos
        .products
        .get(&ProductId::new("city-lights"))
        .await
        .unwrap()
        .unwrap();
    product.status = ProductStatus::Draft;
    app.repos.products.upsert(&product).await.unwrap();

    let res = app.get("/products/city-lights").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.get("/products").await;
    let products = res.body["products"].as_array().unwrap();
    assert!(products.iter().all(|p| p["slug"] != "city-lights"));
}
