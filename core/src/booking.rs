//! Confirmed bookings.

use crate::show::Show;
use crate::types::{BookingId, ShowId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One confirmed purchase. Immutable once stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Booking identifier
    pub id: BookingId,
    /// Show the seats belong to
    pub show_id: ShowId,
    /// Purchaser
    pub user_id: UserId,
    /// Seats in the order they were requested
    pub seats: Vec<u32>,
    /// Amount paid in major currency units
    pub amount: u64,
    /// Gateway payment identifier; unique across bookings
    pub transaction_id: String,
    /// When the booking was committed
    pub created_at: DateTime<Utc>,
}

/// Input to an atomic booking commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewBooking {
    /// Show to book seats on
    pub show_id: ShowId,
    /// Purchaser
    pub user_id: UserId,
    /// Requested seats
    pub seats: Vec<u32>,
    /// Amount paid in major currency units
    pub amount: u64,
    /// Gateway payment identifier
    pub transaction_id: String,
}

impl NewBooking {
    /// Build the stored record.
    #[must_use]
    pub fn into_booking(self, created_at: DateTime<Utc>) -> Booking {
        Booking {
            id: BookingId::new(),
            show_id: self.show_id,
            user_id: self.user_id,
            seats: self.seats,
            amount: self.amount,
            transaction_id: self.transaction_id,
            created_at,
        }
    }
}

/// Result of a successful commit: the booking and the show as it was
/// written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommittedBooking {
    /// The stored booking
    pub booking: Booking,
    /// Show after the seats were appended
    pub show: Show,
}
