//! Seat numbering and human-readable seat labels.
//!
//! Seats are laid out row-major in rows of [`ROW_WIDTH`]. Labels are lettered
//! from the back of the hall: the row containing seat 1 gets the *last*
//! letter, the row nearest the screen gets `A`.
//!
//! The label column is `seat % ROW_WIDTH`, so the last seat of every row
//! (20, 40, ...) is labelled with column `0` (`B0` in a 40-seat hall), and
//! seat `0` sits in a phantom row one letter past the back row (`C0`). Both
//! quirks are kept as-is; ticket emails already in circulation use them.

use crate::error::{BookingError, Result};
use std::collections::HashSet;

/// Number of seats in one row of every hall.
pub const ROW_WIDTH: u32 = 20;

/// Label a seat number for a hall with `total_seats` seats.
///
/// # Examples
///
/// ```
/// use showtime_core::seat::seat_label;
///
/// assert_eq!(seat_label(40, 1), "B1");
/// assert_eq!(seat_label(40, 21), "A1");
/// ```
#[must_use]
pub fn seat_label(total_seats: u32, seat: u32) -> String {
    let rows = i64::from(total_seats.div_ceil(ROW_WIDTH));
    let row = i64::from(seat.div_ceil(ROW_WIDTH));
    let column = seat % ROW_WIDTH;

    let letter = u32::try_from(i64::from(b'A') + rows - row)
        .ok()
        .and_then(char::from_u32)
        .unwrap_or('?');

    format!("{letter}{column}")
}

/// Sort `seats` ascending and join their labels with `", "`.
#[must_use]
pub fn seat_labels(total_seats: u32, seats: &[u32]) -> String {
    let mut sorted = seats.to_vec();
    sorted.sort_unstable();
    sorted
        .iter()
        .map(|seat| seat_label(total_seats, *seat))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validate a seat request against a hall size.
///
/// Every seat must lie in `[0, total_seats)` and appear at most once.
///
/// # Errors
///
/// - [`BookingError::InvalidRequest`] if `seats` is empty or has duplicates
/// - [`BookingError::SeatOutOfRange`] if a seat does not exist
pub fn validate_seat_request(total_seats: u32, seats: &[u32]) -> Result<()> {
    if seats.is_empty() {
        return Err(BookingError::invalid("at least one seat must be selected"));
    }

    let mut seen = HashSet::with_capacity(seats.len());
    for &seat in seats {
        if seat >= total_seats {
            return Err(BookingError::SeatOutOfRange { seat, total_seats });
        }
        if !seen.insert(seat) {
            return Err(BookingError::invalid(format!("seat {seat} selected twice")));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_seat_is_in_back_row() {
        // 40 seats -> rows A (front) and B (back)
        assert_eq!(seat_label(40, 1), "B1");
        assert_eq!(seat_label(40, 2), "B2");
        assert_eq!(seat_label(40, 19), "B19");
    }

    #[test]
    fn test_second_row_letter() {
        assert_eq!(seat_label(40, 21), "A1");
        assert_eq!(seat_label(40, 39), "A19");
    }

    #[test]
    fn test_row_width_multiple_is_labelled_zero() {
        assert_eq!(seat_label(40, 20), "B0");
        assert_eq!(seat_label(40, 40), "A0");
    }

    #[test]
    fn test_seat_zero_lands_past_the_back_row() {
        assert_eq!(seat_label(40, 0), "C0");
    }

    #[test]
    fn test_partial_last_row_still_counts() {
        // 45 seats -> 3 rows
        assert_eq!(seat_label(45, 1), "C1");
        assert_eq!(seat_label(45, 44), "A4");
    }

    #[test]
    fn test_labels_are_sorted() {
        assert_eq!(seat_labels(40, &[22, 2, 1]), "B1, B2, A2");
    }

    #[test]
    fn test_validate_rejects_bad_requests() {
        assert!(validate_seat_request(40, &[1, 2]).is_ok());
        assert!(matches!(
            validate_seat_request(40, &[]),
            Err(BookingError::InvalidRequest { .. })
        ));
        assert_eq!(
            validate_seat_request(40, &[40]),
            Err(BookingError::SeatOutOfRange {
                seat: 40,
                total_seats: 40
            })
        );
        assert!(matches!(
            validate_seat_request(40, &[3, 3]),
            Err(BookingError::InvalidRequest { .. })
        ));
    }
}
