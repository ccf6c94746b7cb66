//! Admin authentication extractor.
//!
//! Admin routes take a [`RequireAdmin`] argument. When an admin token is
//! configured, the request must carry `Authorization: Bearer <token>`; when
//! none is configured every request is let through.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};

use crate::error::AppError;
use crate::state::AppState;

/// Extractor that requires the admin bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn seed(_admin: RequireAdmin, State(state): State<AppState>) -> Result<..> {
///     ...
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_token() else {
            return Ok(Self);
        };

        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized("admin token required".to_string()))?;

        if tokens_match(presented, expected.expose_secret()) {
            Ok(Self)
        } else {
            tracing::warn!(path = %parts.uri.path(), "Rejected admin request with wrong token");
            Err(AppError::Unauthorized("invalid admin token".to_string()))
        }
    }
}

/// Compare digests so the comparison time does not depend on how many
/// leading characters of the token were right.
fn tokens_match(presented: &str, expected: &str) -> bool {
    Sha256::digest(presented.as_bytes()) == Sha256::digest(expected.as_bytes())
}
