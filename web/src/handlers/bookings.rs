//! Booking endpoints.
//!
//! - `GET /api/bookings?upcoming=true|false&limit=N`
//! - `POST /api/bookings/payment`: create a gateway order
//! - `POST /api/bookings/verify-payment`: verify the callback and book

use crate::WebResult;
use crate::extractors::{ApiJson, ApiQuery, Authenticated, CorrelationId};
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::extract::State;
use serde_json::{Value, json};
use showtime_core::{BookingQuery, BookingQueryParams, CreateOrderRequest, VerifyPaymentRequest};

/// Bookings of the caller for upcoming (default) or past shows.
pub async fn list_bookings(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ApiQuery(params): ApiQuery<BookingQueryParams>,
) -> WebResult<ApiResponse<Value>> {
    let query = BookingQuery::try_from(params)?;
    let bookings = state.queries.bookings_for(&actor, query).await?;

    Ok(ApiResponse::ok(
        "Fetched bookings of user successfully!",
        json!({ "bookings": bookings }),
    ))
}

/// Create a payment order for seats that are currently free.
pub async fn create_payment(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    correlation_id: CorrelationId,
    ApiJson(request): ApiJson<CreateOrderRequest>,
) -> WebResult<ApiResponse<Value>> {
    tracing::debug!(
        correlation_id = %correlation_id.0,
        user_id = %actor.user_id,
        "Initiating payment order"
    );
    let order = state.orders.initiate(&actor, request).await?;

    Ok(ApiResponse::created(
        "Payment Initialized",
        json!({ "orderDetails": order }),
    ))
}

/// Verify a gateway callback, book the seats and mail the ticket.
pub async fn verify_payment(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    correlation_id: CorrelationId,
    ApiJson(request): ApiJson<VerifyPaymentRequest>,
) -> WebResult<ApiResponse<Value>> {
    tracing::debug!(
        correlation_id = %correlation_id.0,
        user_id = %actor.user_id,
        "Verifying payment"
    );
    let confirmation = state.payments.verify(&actor, request).await?;

    let message = if confirmation.ticket_sent {
        "Payment Successful. Ticket has been sent to your email!"
    } else {
        "Payment Successful. We could not email your ticket, it is available under your bookings."
    };

    Ok(ApiResponse::created(
        message,
        json!({
            "bookingId": confirmation.booking_id,
            "seats": confirmation.seats,
            "ticketSent": confirmation.ticket_sent,
        }),
    ))
}
