//! Request correlation ids.
//!
//! A client or proxy may send its own `x-request-id`; it is kept only when it
//! is short printable ASCII, so log lines and Sentry tags cannot be flooded
//! or forged with control characters. Anything else gets a fresh UUID v4.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

fn accept_client_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN && id.bytes().all(|b| b.is_ascii_graphic())
}

/// Tag the request span and Sentry scope with a request id and echo it back.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| accept_client_id(id))
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    Span::current().record("request_id", request_id.as_str());
    sentry::configure_scope(|scope| scope.set_tag("request_id", &request_id));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_client_id() {
        assert!(accept_client_id("cf-8f3a1c2e9b7d4e60"));
        assert!(!accept_client_id(""));
        assert!(!accept_client_id("has space"));
        assert!(!accept_client_id("line\nbreak"));
        assert!(!accept_client_id(&"a".repeat(MAX_REQUEST_ID_LEN + 1)));
    }
}
