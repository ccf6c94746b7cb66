//! Checkout route handler.

use axum::{Json, extract::State};
use darkroom_core::{CartId, Email, ShippingAddress, ShippingMethod};
use serde::Deserialize;
use tracing::instrument;

use crate::error::{ApiJson, Result, add_breadcrumb};
use crate::services::{CheckoutReceipt, CheckoutRequest, CheckoutService, ServiceError};
use crate::state::AppState;

/// `POST /checkout` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutBody {
    pub cart_id: Option<CartId>,
    pub email: Option<Email>,
    pub shipping_address: Option<ShippingAddress>,
    #[serde(alias = "shippingOption")]
    pub shipping_method: Option<ShippingMethod>,
}

/// `POST /checkout`: create a payment intent and a pending order.
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CheckoutBody>,
) -> Result<Json<CheckoutReceipt>> {
    let cart_id = body
        .cart_id
        .filter(|id| !id.as_str().trim().is_empty())
        .ok_or_else(|| ServiceError::InvalidArgument("cartId is required".to_string()))?;

    let receipt = CheckoutService::new(state.repos(), state.gateway(), state.clock())
        .checkout(CheckoutRequest {
            cart_id,
            email: body.email,
            shipping_address: body.shipping_address,
            shipping_method: body.shipping_method,
        })
        .await?;

    add_breadcrumb(
        "checkout",
        "Order created",
        &[
            ("order_id", receipt.order_id.as_str()),
            ("order_number", receipt.order_number.as_str()),
        ],
    );

    Ok(Json(receipt))
}
