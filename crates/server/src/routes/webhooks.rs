//! Payment gateway webhook endpoint.
//!
//! The body is taken as raw bytes: signature verification must see it
//! exactly as sent.

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::HeaderMap,
};
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::payments::SIGNATURE_HEADER;
use crate::services::WebhookService;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Received {
    pub received: bool,
}

/// `POST /webhook`
///
/// Responds 400 when the signature is missing or invalid; every verified
/// delivery is acknowledged, whatever processing did with it.
#[instrument(skip_all, fields(bytes = body.len()))]
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Received>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    WebhookService::new(state.repos(), state.verifier(), state.clock())
        .handle(&body, signature)
        .await?;

    Ok(Json(Received { received: true }))
}
