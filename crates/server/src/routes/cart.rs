//! Cart route handlers.

use axum::{Json, extract::State};
use darkroom_core::{
    CartId, CartLineInput, CurrencyCode, Email, Money, PricedLine, ShippingMethod, UserId,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{ApiJson, Result, add_breadcrumb};
use crate::services::{CartService, SaveCartRequest};
use crate::state::AppState;

/// `POST /cart` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveCartBody {
    pub cart_id: Option<CartId>,
    pub user_id: Option<UserId>,
    pub email: Option<Email>,
    #[serde(default)]
    pub items: Vec<CartLineInput>,
    #[serde(default, alias = "shippingOption")]
    pub shipping_method: ShippingMethod,
}

/// `POST /cart` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCart {
    pub cart_id: CartId,
    pub subtotal: Money,
    pub shipping: Money,
    pub total: Money,
    pub currency: CurrencyCode,
    pub items: Vec<PricedLine>,
}

/// `POST /cart`: price the items and persist the cart.
#[instrument(skip(state, body), fields(lines = body.items.len()))]
pub async fn save(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SaveCartBody>,
) -> Result<Json<SavedCart>> {
    let cart = CartService::new(state.repos())
        .save_cart(SaveCartRequest {
            cart_id: body.cart_id,
            user_id: body.user_id,
            email: body.email,
            items: body.items,
            shipping_method: body.shipping_method,
        })
        .await?;

    add_breadcrumb(
        "cart",
        "Cart saved",
        &[("cart_id", cart.id.as_str()), ("total", &cart.total.to_string())],
    );

    Ok(Json(SavedCart {
        cart_id: cart.id,
        subtotal: cart.subtotal,
        shipping: cart.shipping,
        total: cart.total,
        currency: cart.currency,
        items: cart.items,
    }))
}
