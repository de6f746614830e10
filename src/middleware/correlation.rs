//! Correlation uuid middleware.
//!
//! The request filter stashes a correlation uuid in the request extensions
//! and the response filter copies it onto the outgoing response, so callers
//! can join their own logs with ours.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Instrument;
use uuid::Uuid;

/// Header carrying the correlation uuid on requests and responses.
pub const CORRELATION_UUID_HEADER: &str = "correlation-uuid";

/// Request extension holding the correlation uuid of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationUuid(pub String);

impl CorrelationUuid {
    /// Generate a new random (v4) correlation uuid.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CorrelationUuid {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationUuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store the correlation uuid of the request in its extensions.
///
/// A non-empty incoming `correlation-uuid` header is reused as is; otherwise a
/// new uuid is generated. The rest of the request runs inside a span carrying
/// the value.
pub async fn correlation_request_filter(mut req: Request, next: Next) -> Response {
    let correlation_uuid = req
        .headers()
        .get(CORRELATION_UUID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| CorrelationUuid(s.to_string()))
        .unwrap_or_default();

    let span = tracing::info_span!(
        "request",
        correlation_uuid = %correlation_uuid,
        method = %req.method(),
        path = %req.uri().path(),
    );

    req.extensions_mut().insert(correlation_uuid);

    next.run(req).instrument(span).await
}

/// Append the stored correlation uuid to the response headers.
///
/// Never fails: a missing extension, or a value that is not a valid header
/// value, yields an empty header. Headers set by the handler are kept.
pub async fn correlation_response_filter(req: Request, next: Next) -> Response {
    // The request is moved into `next`, so read the extension first
    let correlation_uuid = req.extensions().get::<CorrelationUuid>().cloned();

    let mut response = next.run(req).await;

    let value = correlation_uuid
        .and_then(|c| HeaderValue::from_str(c.as_str()).ok())
        .unwrap_or_else(|| HeaderValue::from_static(""));
    response.headers_mut().append(CORRELATION_UUID_HEADER, value);

    response
}
