//! Admin route handlers. Every handler takes [`RequireAdmin`].

use axum::{
    Json,
    extract::{Path, State},
};
use darkroom_core::{
    FulfilmentStatus, Order, OrderId, PaymentStatus, PricingConfig, PricingOverride,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::db::OrderFilter;
use crate::error::{ApiJson, ApiQuery, Result};
use crate::middleware::RequireAdmin;
use crate::services::{OrderService, PricingService, seed_catalog};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Done {
    pub ok: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderListQuery {
    pub payment_status: Option<PaymentStatus>,
    pub fulfilment_status: Option<FulfilmentStatus>,
}

#[derive(Debug, Serialize)]
pub struct OrderList {
    pub orders: Vec<Order>,
}

#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub order: Order,
}

#[derive(Debug, Deserialize)]
pub struct FulfilmentUpdate {
    pub status: FulfilmentStatus,
}

#[derive(Debug, Serialize)]
pub struct PricingDetail {
    pub pricing: PricingConfig,
}

/// `POST /admin/seed`
#[instrument(skip_all)]
pub async fn seed(_admin: RequireAdmin, State(state): State<AppState>) -> Result<Json<Done>> {
    let count = seed_catalog(state.repos(), state.clock()).await?;
    info!(products = count, "Seed requested via admin API");
    Ok(Json(Done { ok: true }))
}

/// `GET /admin/orders`
#[instrument(skip(state))]
pub async fn orders(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OrderListQuery>,
) -> Result<Json<OrderList>> {
    let orders = OrderService::new(state.repos().orders.as_ref())
        .list(&OrderFilter {
            payment_status: query.payment_status,
            fulfilment_status: query.fulfilment_status,
        })
        .await?;
    Ok(Json(OrderList { orders }))
}

/// `POST /admin/orders/{id}/fulfilment`
#[instrument(skip(state))]
pub async fn update_fulfilment(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    ApiJson(update): ApiJson<FulfilmentUpdate>,
) -> Result<Json<OrderDetail>> {
    let order = OrderService::new(state.repos().orders.as_ref())
        .update_fulfilment(&id, update.status)
        .await?;
    Ok(Json(OrderDetail { order }))
}

/// `PUT /admin/settings/pricing`: replace the pricing override document.
#[instrument(skip(state, pricing))]
pub async fn update_pricing(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    ApiJson(pricing): ApiJson<PricingOverride>,
) -> Result<Json<PricingDetail>> {
    let pricing = PricingService::new(state.repos().settings.as_ref())
        .replace_override(&pricing)
        .await?;
    info!(currency = %pricing.currency.code(), "Pricing override replaced");
    Ok(Json(PricingDetail { pricing }))
}
