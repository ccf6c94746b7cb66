//! Order confirmation lookup.

use axum::{
    Json,
    extract::{Path, State},
};
use darkroom_core::{Order, OrderId};
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::services::OrderService;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub order: Order,
}

/// `GET /orders/{id}`
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    let order = OrderService::new(state.repos().orders.as_ref())
        .get(&id)
        .await?;
    Ok(Json(OrderDetail { order }))
}
