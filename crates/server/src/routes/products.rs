//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use darkroom_core::Product;
use serde::Serialize;
use tracing::instrument;

use crate::error::{ApiQuery, Result};
use crate::services::{CatalogService, ProductQuery};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProductList {
    pub products: Vec<Product>,
}

#[derive(Debug, Serialize)]
pub struct ProductDetail {
    pub product: Product,
}

/// `GET /products`
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> Result<Json<ProductList>> {
    let products = CatalogService::new(state.repos().products.as_ref())
        .list_products(&query)
        .await?;
    Ok(Json(ProductList { products }))
}

/// `GET /products/{slug}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetail>> {
    let product = CatalogService::new(state.repos().products.as_ref())
        .get_product_by_slug(&slug)
        .await?;
    Ok(Json(ProductDetail { product }))
}
