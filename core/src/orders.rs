//! Payment order initiation.

use crate::authorization::{Action, Actor, Resource, authorize};
use crate::environment::Clock;
use crate::error::{BookingError, Result};
use crate::providers::{OrderRequest, PaymentGateway, ShowStore};
use crate::seat::validate_seat_request;
use crate::types::ShowId;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Settings for order creation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderConfig {
    /// ISO currency code sent to the gateway
    pub currency: String,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            currency: "INR".to_string(),
        }
    }
}

/// Client request to start paying for seats.
///
/// Fields are optional so that a missing field is reported as
/// [`BookingError::InvalidRequest`] rather than a deserialization failure.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Show to book
    pub show_id: Option<ShowId>,
    /// Requested seats
    pub selected_seats: Option<Vec<u32>>,
    /// Amount in major currency units
    pub amount: Option<u64>,
}

/// Order handed back to the client so it can open the gateway checkout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    /// Gateway order identifier
    pub order_id: String,
    /// Amount in minor currency units
    pub amount: u64,
    /// Currency of the order
    pub currency: String,
    /// Receipt attached to the order
    pub receipt: String,
}

/// Converts a major-unit amount into minor units.
///
/// # Errors
///
/// Returns [`BookingError::InvalidRequest`] for zero or overflowing amounts.
pub fn to_minor_units(amount: u64) -> Result<u64> {
    if amount == 0 {
        return Err(BookingError::invalid("amount must be positive"));
    }
    amount
        .checked_mul(100)
        .ok_or_else(|| BookingError::invalid("amount is too large"))
}

/// Creates gateway orders for seats that are currently free.
///
/// Seats are not held while the client pays; two clients may both receive
/// an order for the same seat and the loser is rejected at commit.
pub struct OrderInitiator {
    shows: Arc<dyn ShowStore>,
    gateway: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
    config: OrderConfig,
}

impl OrderInitiator {
    /// Create an initiator.
    #[must_use]
    pub fn new(
        shows: Arc<dyn ShowStore>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
        config: OrderConfig,
    ) -> Self {
        Self {
            shows,
            gateway,
            clock,
            config,
        }
    }

    /// Validate the request against the show and create a gateway order.
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidRequest`] for missing fields or bad seats
    /// - [`BookingError::NotFound`] if the show does not exist
    /// - [`BookingError::Expired`] if the show has started
    /// - [`BookingError::SeatConflict`] if a seat is already booked
    /// - [`BookingError::Gateway`] if the gateway fails
    pub async fn initiate(&self, actor: &Actor, request: CreateOrderRequest) -> Result<OrderDetails> {
        authorize(actor, Action::BookSeats, Resource::Own)?;

        let (Some(show_id), Some(seats), Some(amount)) =
            (request.show_id, request.selected_seats, request.amount)
        else {
            return Err(BookingError::invalid("showId, selectedSeats and amount are required"));
        };
        if seats.is_empty() {
            return Err(BookingError::invalid("at least one seat must be selected"));
        }
        let amount_minor = to_minor_units(amount)?;

        let show = self
            .shows
            .get_show(show_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Show", show_id))?;

        let now = self.clock.now();
        if show.has_started(now) {
            return Err(BookingError::Expired {
                reason: "This show has already started".to_string(),
            });
        }

        validate_seat_request(show.total_seats, &seats)?;
        if let Err(err) = show.check_seats_free(&seats) {
            tracing::info!(show_id = %show_id, seats = ?seats, "Order rejected: seats already booked");
            return Err(err);
        }

        let mut nonce = Uuid::new_v4().simple().to_string();
        nonce.truncate(8);
        let receipt = format!("receipt_order_{}_{nonce}", now.timestamp_millis());

        let order = self
            .gateway
            .create_order(OrderRequest {
                amount_minor,
                currency: self.config.currency.clone(),
                receipt: receipt.clone(),
            })
            .await?;

        tracing::info!(
            show_id = %show_id,
            user_id = %actor.user_id,
            seats = ?seats,
            order_id = %order.order_id,
            amount_minor = order.amount_minor,
            "Payment order initiated"
        );
        metrics::counter!("showtime.orders.initiated").increment(1);

        Ok(OrderDetails {
            order_id: order.order_id,
            amount: order.amount_minor,
            currency: self.config.currency.clone(),
            receipt,
        })
    }
}
