//! HTTP middleware.
//!
//! # Layer order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span, `request_id` field)
//! 3. Request ID (fills the span field, echoes the header)
//!
//! Admin authentication is an extractor, not a layer.

pub mod auth;
pub mod request_id;

pub use auth::RequireAdmin;
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
