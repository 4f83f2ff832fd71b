//! Error types for web handlers.
//!
//! [`AppError`] bridges [`BookingError`] and HTTP. Every error body uses the
//! same envelope as successful responses:
//!
//! ```json
//! { "message": "Selected seats are already booked: [3]", "data": { "code": "SEAT_CONFLICT", "seats": [3] } }
//! ```
//!
//! Server errors never echo their internal message; they are logged once when
//! the response is built.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};
use showtime_core::{BookingError, ErrorKind};
use std::fmt;

/// Message returned for every 5xx response.
pub const INTERNAL_MESSAGE: &str = "Something went wrong. Try again later!";

/// Application error type for web handlers.
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: &'static str,
    /// Extra fields merged into the `data` object
    details: Map<String, Value>,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            message: message.into(),
            code,
            details: Map::new(),
            source: None,
        }
    }

    /// Attach the underlying error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Add a field to the `data` object of the body.
    #[must_use]
    pub fn with_detail(mut self, key: &str, value: Value) -> Self {
        self.details.insert(key.to_string(), value);
        self
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message, "UNAUTHENTICATED")
    }

    /// Create a 404 error for a route that does not exist.
    #[must_use]
    pub fn route_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Could not find this route.", "ROUTE_NOT_FOUND")
    }

    /// Create a 422 Unprocessable Entity error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message, "INVALID_REQUEST")
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(source: anyhow::Error) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            INTERNAL_MESSAGE,
            "INTERNAL_SERVER_ERROR",
        )
        .with_source(source)
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = self.code,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(status = %self.status, code = self.code, "Internal server error");
            }
        }

        let mut data = self.details;
        data.insert("code".to_string(), Value::from(self.code));

        let body = json!({
            "message": self.message,
            "data": data,
        });

        (self.status, Json(body)).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        let message = err.to_string();
        match (&err, err.kind()) {
            (BookingError::Locked { .. }, _) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, message, "LOCKED")
            },
            (_, ErrorKind::InvalidRequest) => Self::validation(message),
            (_, ErrorKind::Expired) => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, message, "EXPIRED")
            },
            (_, ErrorKind::Unauthenticated) => Self::unauthorized(message),
            (_, ErrorKind::Unauthorized) => Self::new(StatusCode::FORBIDDEN, message, "FORBIDDEN"),
            (_, ErrorKind::NotFound) => Self::new(StatusCode::NOT_FOUND, message, "NOT_FOUND"),
            (BookingError::SeatConflict { seats }, _) => {
                Self::new(StatusCode::CONFLICT, message, "SEAT_CONFLICT")
                    .with_detail("seats", json!(seats))
            },
            (BookingError::DuplicatePayment { .. }, _) => {
                Self::new(StatusCode::CONFLICT, message, "DUPLICATE_PAYMENT")
            },
            (_, ErrorKind::Conflict) => Self::new(StatusCode::CONFLICT, message, "SCHEDULE_OVERLAP"),
            (_, ErrorKind::VerificationFailed) => {
                Self::new(StatusCode::BAD_REQUEST, message, "VERIFICATION_FAILED")
            },
            (_, ErrorKind::Internal) => Self::internal(anyhow::Error::new(err)),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(format!("Provided details are invalid: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(format!("Provided details are invalid: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(format!("Provided details are invalid: {}", rejection.body_text()))
    }
}
