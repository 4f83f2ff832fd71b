//! Application state for Axum handlers.

use crate::auth::TokenVerifier;
use axum::extract::FromRef;
use showtime_core::{
    BookingQueries, CatalogGuard, Clock, OrderInitiator, PaymentVerifier, ShowScheduler,
};
use std::sync::Arc;

/// What the [`Authenticated`](crate::extractors::Authenticated) extractor
/// needs to resolve a bearer token.
#[derive(Clone)]
pub struct AuthContext {
    /// Token verifier
    pub tokens: Arc<dyn TokenVerifier>,
    /// Clock used for token expiry
    pub clock: Arc<dyn Clock>,
}

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// `POST /bookings/payment`
    pub orders: Arc<OrderInitiator>,
    /// `POST /bookings/verify-payment`
    pub payments: Arc<PaymentVerifier>,
    /// Show create/update/delete
    pub scheduler: Arc<ShowScheduler>,
    /// Movie and theatre changes
    pub catalog: Arc<CatalogGuard>,
    /// Read side
    pub queries: Arc<BookingQueries>,
    /// Bearer token resolution
    pub auth: AuthContext,
}

impl FromRef<AppState> for AuthContext {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}
