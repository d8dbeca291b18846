//! Correlation ids for every request.
//!
//! A well-formed upstream `x-request-id` is reused; anything else is replaced
//! with a UUID v4. The id lands on the trace span, the Sentry scope and the
//! response.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_UPSTREAM_LEN: usize = 128;

/// Upstream id if it is short, non-empty printable ASCII.
fn upstream_id(headers: &HeaderMap) -> Option<&str> {
    let id = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?;
    let acceptable = !id.is_empty()
        && id.len() <= MAX_UPSTREAM_LEN
        && id.bytes().all(|b| b.is_ascii_graphic());
    acceptable.then_some(id)
}

/// Tag the request with an id and echo it back.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = upstream_id(request.headers())
        .map_or_else(|| Uuid::new_v4().to_string(), ToOwned::to_owned);

    Span::current().record("request_id", request_id.as_str());
    sentry::configure_scope(|scope| scope.set_tag("request_id", &request_id));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn with_id(id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(id).unwrap());
        headers
    }

    #[test]
    fn test_accepts_upstream_id() {
        let headers = with_id("cf-7f3a9b21");
        assert_eq!(upstream_id(&headers), Some("cf-7f3a9b21"));
    }

    #[test]
    fn test_rejects_unusable_ids() {
        assert_eq!(upstream_id(&HeaderMap::new()), None);
        assert_eq!(upstream_id(&with_id("")), None);
        assert_eq!(upstream_id(&with_id("has space")), None);
        assert_eq!(upstream_id(&with_id(&"a".repeat(MAX_UPSTREAM_LEN + 1))), None);
    }
}
