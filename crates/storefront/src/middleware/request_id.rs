//! Request ID handling for request tracing and correlation.
//!
//! Every request carries an `x-request-id` header: the upstream proxy's
//! value when present, otherwise a fresh UUID v4. The id is recorded on the
//! request span, tagged in the Sentry scope and echoed in the response.

use axum::{
    extract::Request,
    http::HeaderName,
    middleware::Next,
    response::Response,
};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tracing::Span;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

fn header_name() -> HeaderName {
    HeaderName::from_static(REQUEST_ID_HEADER)
}

/// Layer that assigns a request ID when the client did not send one.
#[must_use]
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(header_name(), MakeRequestUuid)
}

/// Layer that copies the request ID onto the response.
#[must_use]
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(header_name())
}

/// Build the tracing span for a request, including its request ID.
pub fn make_request_span(request: &Request) -> Span {
    let request_id = request_id(request).unwrap_or("-");
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

/// Middleware that tags the Sentry scope with the request ID.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    if let Some(id) = request_id(&request) {
        sentry::configure_scope(|scope| {
            scope.set_tag("request_id", id);
        });
    }

    next.run(request).await
}

fn request_id(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
}
