//! The `Show` aggregate: schedule window and seat inventory.
//!
//! All seat mutations go through [`Show::apply_booking`], which checks the
//! whole request against the current inventory before touching it. Stores
//! call it while holding whatever lock or row version makes the
//! read-modify-write atomic.

use crate::error::{BookingError, Result};
use crate::seat::validate_seat_request;
use crate::types::{MovieId, ShowId, TheatreId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed time interval `[start, end]` occupied by a show.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShowWindow {
    /// Start of the screening
    pub start: DateTime<Utc>,
    /// End of the screening
    pub end: DateTime<Utc>,
}

impl ShowWindow {
    /// Create a window, rejecting empty or inverted intervals.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidRequest`] unless `start < end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(BookingError::invalid("show must end after it starts"));
        }
        Ok(Self { start, end })
    }

    /// Two windows overlap when they share at least one instant.
    ///
    /// Bounds are inclusive: a show ending at 12:00 conflicts with one
    /// starting at 12:00.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// A screening of a movie in a theatre, with its own price and seat map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    /// Show identifier
    pub id: ShowId,
    /// Movie being screened
    pub movie_id: MovieId,
    /// Theatre hosting the screening
    pub theatre_id: TheatreId,
    /// Spoken language of this screening
    pub language: String,
    /// Start of the screening
    pub start: DateTime<Utc>,
    /// End of the screening
    pub end: DateTime<Utc>,
    /// Price of one ticket in major currency units
    pub ticket_price: u32,
    /// Seats in the hall
    pub total_seats: u32,
    /// Seats already sold, in booking order
    pub booked_seats: Vec<u32>,
    /// Optimistic concurrency version, bumped on every write
    pub version: i64,
}

impl Show {
    /// Schedule window of the show.
    #[must_use]
    pub const fn window(&self) -> ShowWindow {
        ShowWindow {
            start: self.start,
            end: self.end,
        }
    }

    /// The show starts strictly after `now`.
    #[must_use]
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.start > now
    }

    /// The show started strictly before `now`.
    #[must_use]
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.start < now
    }

    /// At least one seat has been sold.
    #[must_use]
    pub fn has_bookings(&self) -> bool {
        !self.booked_seats.is_empty()
    }

    /// Requested seats that are already booked, in request order.
    #[must_use]
    pub fn conflicting_seats(&self, requested: &[u32]) -> Vec<u32> {
        requested
            .iter()
            .copied()
            .filter(|seat| self.booked_seats.contains(seat))
            .collect()
    }

    /// Check that every requested seat is still free.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::SeatConflict`] listing the taken seats.
    pub fn check_seats_free(&self, requested: &[u32]) -> Result<()> {
        let taken = self.conflicting_seats(requested);
        if taken.is_empty() {
            Ok(())
        } else {
            Err(BookingError::SeatConflict { seats: taken })
        }
    }

    /// Mark `seats` as booked.
    ///
    /// Validates range, duplicates and conflicts against the current
    /// inventory, then appends the seats and bumps the version. Nothing is
    /// modified when any check fails.
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidRequest`] / [`BookingError::SeatOutOfRange`]
    ///   for malformed requests
    /// - [`BookingError::SeatConflict`] when a seat is already booked
    pub fn apply_booking(&mut self, seats: &[u32]) -> Result<()> {
        validate_seat_request(self.total_seats, seats)?;
        self.check_seats_free(seats)?;

        self.booked_seats.extend_from_slice(seats);
        self.version += 1;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, minute, 0).unwrap()
    }

    fn show(total_seats: u32) -> Show {
        Show {
            id: ShowId::new(),
            movie_id: MovieId::new(),
            theatre_id: TheatreId::new(),
            language: "English".to_string(),
            start: at(10, 0),
            end: at(12, 0),
            ticket_price: 250,
            total_seats,
            booked_seats: Vec::new(),
            version: 0,
        }
    }

    #[test]
    fn test_overlap_partial() {
        let a = ShowWindow::new(at(10, 0), at(12, 0)).unwrap();
        let b = ShowWindow::new(at(11, 0), at(13, 0)).unwrap();
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn test_overlap_boundary_is_inclusive() {
        let a = ShowWindow::new(at(10, 0), at(12, 0)).unwrap();
        let c = ShowWindow::new(at(12, 0), at(14, 0)).unwrap();
        assert!(a.overlaps(&c));
    }

    #[test]
    fn test_no_overlap_after_end() {
        let a = ShowWindow::new(at(10, 0), at(12, 0)).unwrap();
        let d = ShowWindow::new(at(12, 1), at(14, 0)).unwrap();
        assert!(!a.overlaps(&d));
    }

    #[test]
    fn test_containment_overlaps() {
        let outer = ShowWindow::new(at(9, 0), at(15, 0)).unwrap();
        let inner = ShowWindow::new(at(10, 0), at(11, 0)).unwrap();
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    #[test]
    fn test_inverted_window_rejected() {
        assert!(ShowWindow::new(at(12, 0), at(10, 0)).is_err());
        assert!(ShowWindow::new(at(12, 0), at(12, 0)).is_err());
    }

    #[test]
    fn test_apply_booking_appends_and_bumps_version() {
        let mut show = show(40);
        show.apply_booking(&[1, 2]).unwrap();
        assert_eq!(show.booked_seats, vec![1, 2]);
        assert_eq!(show.version, 1);

        show.apply_booking(&[5]).unwrap();
        assert_eq!(show.booked_seats, vec![1, 2, 5]);
        assert_eq!(show.version, 2);
    }

    #[test]
    fn test_apply_booking_conflict_leaves_show_untouched() {
        let mut show = show(40);
        show.apply_booking(&[1, 2]).unwrap();

        let err = show.apply_booking(&[3, 2]).unwrap_err();
        assert_eq!(err, BookingError::SeatConflict { seats: vec![2] });
        assert_eq!(show.booked_seats, vec![1, 2]);
        assert_eq!(show.version, 1);
    }

    #[test]
    fn test_apply_booking_out_of_range() {
        let mut show = show(10);
        assert!(matches!(
            show.apply_booking(&[10]),
            Err(BookingError::SeatOutOfRange { .. })
        ));
        assert!(show.booked_seats.is_empty());
    }

    #[test]
    fn test_upcoming_and_started() {
        let show = show(10);
        assert!(show.is_upcoming(at(9, 0)));
        assert!(!show.has_started(at(9, 0)));
        assert!(show.has_started(at(11, 0)));
        assert!(!show.is_upcoming(at(10, 0)));
        assert!(!show.has_started(at(10, 0)));
    }

    proptest! {
        /// Whatever sequence of requests arrives, the inventory stays a
        /// duplicate-free subset of the hall.
        #[test]
        fn prop_booked_seats_stay_valid(
            total in 1u32..80,
            requests in proptest::collection::vec(
                proptest::collection::vec(0u32..100, 0..6),
                0..20,
            ),
        ) {
            let mut show = show(total);
            for request in requests {
                let before = show.clone();
                if show.apply_booking(&request).is_err() {
                    prop_assert_eq!(&show, &before);
                }
            }

            let mut sorted = show.booked_seats.clone();
            sorted.sort_unstable();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), show.booked_seats.len());
            prop_assert!(show.booked_seats.iter().all(|seat| *seat < total));
        }
    }
}
