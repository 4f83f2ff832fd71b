//! Axum HTTP surface for the Showtime booking core.
//!
//! Handlers are thin: extract the caller and the request, call one core
//! service, wrap the result in the `{"message", "data"}` envelope.
//!
//! ```text
//! request ─► correlation id ─► CORS ─► TraceLayer ─► handler
//!                                                     │
//!                                   Authenticated (bearer token → Actor)
//!                                                     │
//!                                   core service ─► ApiResponse / AppError
//! ```
//!
//! # Example
//!
//! ```ignore
//! use showtime_web::{AppState, build_router, cors_layer};
//!
//! let app = build_router(state, cors_layer("http://localhost:5173")?);
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;

pub use auth::{JwtTokenVerifier, TokenSigner, TokenVerifier};
pub use error::AppError;
pub use extractors::{Authenticated, CorrelationId};
pub use middleware::CORRELATION_ID_HEADER;
pub use response::ApiResponse;
pub use routes::{build_router, cors_layer};
pub use state::{AppState, AuthContext};

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
