//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Every error is rendered as
//! JSON `{"error": <message>, "code": <machine code>}`; server-side failures
//! are captured to Sentry first and their details are not sent to the client.

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::ServiceError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// A service rejected or failed the operation.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Missing or wrong admin credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request could not be decoded.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

impl AppError {
    const fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Service(err) => match err {
                ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
                ServiceError::InvalidVariant { .. } => (StatusCode::BAD_REQUEST, "invalid_variant"),
                ServiceError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "invalid_argument"),
                ServiceError::InvalidSignature(_) => {
                    (StatusCode::BAD_REQUEST, "invalid_signature")
                }
                ServiceError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
                ServiceError::PaymentGateway(_) => {
                    (StatusCode::BAD_GATEWAY, "payment_gateway_error")
                }
                ServiceError::Repository(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "invalid_argument"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Internal(_)
                | Self::Service(ServiceError::Repository(_) | ServiceError::PaymentGateway(_))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (status, code) = self.status_and_code();

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Internal(_) | Self::Service(ServiceError::Repository(_)) => {
                "Internal server error".to_string()
            }
            Self::Service(ServiceError::PaymentGateway(_)) => {
                "Payment service unavailable".to_string()
            }
            Self::Service(err) => err.to_string(),
            Self::Unauthorized(msg) | Self::BadRequest(msg) => msg.clone(),
        };

        (
            status,
            Json(ErrorBody {
                error: message,
                code,
            }),
        )
            .into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// `Json` extractor whose rejections use the JSON error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Query` extractor whose rejections use the JSON error body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for a customer action.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}
