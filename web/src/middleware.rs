//! Request correlation middleware.
//!
//! 1. Take the id from the `X-Correlation-ID` header, or generate one
//! 2. Store it in the request extensions for [`CorrelationId`](crate::CorrelationId)
//! 3. Run the request inside an `http_request` span carrying the id
//! 4. Echo the id in the response header and count the response by status
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/api/bookings", get(list_bookings))
//!     .layer(axum::middleware::from_fn(correlation_id));
//! ```

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// Attach a correlation id to the request, its span and the response.
pub async fn correlation_id(mut req: Request, next: Next) -> Response {
    let correlation_id = req
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4);

    req.extensions_mut().insert(correlation_id);

    let span = tracing::info_span!(
        "http_request",
        correlation_id = %correlation_id,
        method = %req.method(),
        uri = %req.uri(),
    );

    let mut response = next.run(req).instrument(span).await;

    metrics::counter!(
        "showtime.http.responses",
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);

    if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
        response.headers_mut().insert(CORRELATION_ID_HEADER, value);
    }

    response
}
