//! Custom Axum extractors.
//!
//! - [`CorrelationId`]: request correlation id
//! - [`Authenticated`]: the caller resolved from `Authorization: Bearer <token>`
//! - [`ApiJson`], [`ApiPath`], [`ApiQuery`]: the stock extractors with
//!   rejections rendered in the API envelope

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use crate::state::AuthContext;
use axum::{
    async_trait,
    extract::{FromRef, FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use showtime_core::{Actor, BookingError};
use uuid::Uuid;

/// Correlation ID for request tracing.
///
/// Reads the id stored by the correlation middleware, falling back to the
/// `X-Correlation-ID` header, or a fresh UUID v4.
#[derive(Debug, Clone, Copy)]
pub struct CorrelationId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Uuid>() {
            return Ok(Self(*id));
        }

        let correlation_id = parts
            .headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(correlation_id))
    }
}

/// The authenticated caller.
///
/// Rejects with 401 when the header is missing, is not a bearer token, or
/// the token does not verify.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for Authenticated
where
    AuthContext: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::unauthorized("Authentication failed"))?;

        let auth = AuthContext::from_ref(state);
        let actor = auth
            .tokens
            .verify(token, auth.clock.now())
            .map_err(|err| match err {
                BookingError::Unauthenticated => AppError::unauthorized("Authentication failed"),
                other => AppError::from(other),
            })?;

        Ok(Self(actor))
    }
}

/// JSON body extractor rejecting with [`AppError`].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Path extractor rejecting with [`AppError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Query string extractor rejecting with [`AppError`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
