//! Error types for booking, scheduling and catalog operations.

use thiserror::Error;

/// Result type alias for Showtime operations.
pub type Result<T> = std::result::Result<T, BookingError>;

/// Coarse classification used by transports to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing input, or a state that forbids the change.
    InvalidRequest,
    /// No credentials, or credentials that could not be verified.
    Unauthenticated,
    /// The actor is not allowed to perform the action.
    Unauthorized,
    /// A referenced entity does not exist.
    NotFound,
    /// Seat or schedule conflict.
    Conflict,
    /// The show has already started.
    Expired,
    /// Payment signature mismatch.
    VerificationFailed,
    /// Downstream collaborator failure.
    Internal,
}

/// Error taxonomy for the booking core.
///
/// Variants are grouped by the [`ErrorKind`] they map to. Messages are
/// user-facing except for the system errors at the bottom, which transports
/// must not echo back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingError {
    // ═══════════════════════════════════════════════════════════
    // Request Errors
    // ═══════════════════════════════════════════════════════════

    /// Input is missing or malformed.
    #[error("Provided details are invalid: {reason}")]
    InvalidRequest {
        /// What was wrong with the input
        reason: String,
    },

    /// A requested seat does not exist on the show.
    #[error("Seat {seat} does not exist on a show with {total_seats} seats")]
    SeatOutOfRange {
        /// Offending seat number
        seat: u32,
        /// Seat count of the show
        total_seats: u32,
    },

    /// The entity can no longer be changed in the requested way.
    #[error("{reason}")]
    Locked {
        /// Why the change is blocked
        reason: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Access Errors
    // ═══════════════════════════════════════════════════════════

    /// Missing or invalid credentials.
    #[error("Authentication failed")]
    Unauthenticated,

    /// The actor lacks the capability for this action.
    #[error("You are not authorized to {action}")]
    Forbidden {
        /// Human readable description of the action
        action: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Lookup Errors
    // ═══════════════════════════════════════════════════════════

    /// Referenced entity does not exist.
    #[error("{resource} {id} not found")]
    NotFound {
        /// Entity kind ("Show", "Movie", ...)
        resource: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// The movie is not screened in the requested language.
    #[error("Language is not available for this movie")]
    LanguageUnavailable {
        /// Requested language
        language: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Conflicts
    // ═══════════════════════════════════════════════════════════

    /// One or more requested seats are already booked.
    #[error("Selected seats are already booked: {seats:?}")]
    SeatConflict {
        /// Seats that were already taken
        seats: Vec<u32>,
    },

    /// Another show in the theatre overlaps the requested window.
    #[error("Overlapping show {show_id} in selected time window")]
    ScheduleOverlap {
        /// The show that overlaps
        show_id: String,
    },

    /// A booking already exists for this payment.
    #[error("Payment {payment_id} has already been used for a booking")]
    DuplicatePayment {
        /// Gateway payment identifier
        payment_id: String,
    },

    // ═══════════════════════════════════════════════════════════
    // Temporal / Payment Errors
    // ═══════════════════════════════════════════════════════════

    /// The show is already running or finished.
    #[error("{reason}")]
    Expired {
        /// What expired
        reason: String,
    },

    /// Payment callback signature did not match.
    #[error("Payment verification failed. Try again!")]
    VerificationFailed,

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Payment gateway failure.
    #[error("Payment gateway error: {0}")]
    Gateway(String),

    /// Persistence failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Anything else that went wrong internally.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BookingError {
    /// Shorthand for [`BookingError::InvalidRequest`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`BookingError::NotFound`].
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Shorthand for [`BookingError::Locked`].
    pub fn locked(reason: impl Into<String>) -> Self {
        Self::Locked {
            reason: reason.into(),
        }
    }

    /// Classify the error.
    ///
    /// # Examples
    ///
    /// ```
    /// # use showtime_core::{BookingError, ErrorKind};
    /// assert_eq!(BookingError::SeatConflict { seats: vec![3] }.kind(), ErrorKind::Conflict);
    /// assert_eq!(BookingError::VerificationFailed.kind(), ErrorKind::VerificationFailed);
    /// ```
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest { .. } | Self::SeatOutOfRange { .. } | Self::Locked { .. } => {
                ErrorKind::InvalidRequest
            },
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::Forbidden { .. } => ErrorKind::Unauthorized,
            Self::NotFound { .. } | Self::LanguageUnavailable { .. } => ErrorKind::NotFound,
            Self::SeatConflict { .. }
            | Self::ScheduleOverlap { .. }
            | Self::DuplicatePayment { .. } => ErrorKind::Conflict,
            Self::Expired { .. } => ErrorKind::Expired,
            Self::VerificationFailed => ErrorKind::VerificationFailed,
            Self::Gateway(_) | Self::Storage(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns `true` for failures of a collaborator rather than of the request.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            BookingError::not_found("Show", "abc").to_string(),
            "Show abc not found"
        );
        assert_eq!(
            BookingError::Forbidden {
                action: "delete this show".to_string()
            }
            .to_string(),
            "You are not authorized to delete this show"
        );
        let language = BookingError::LanguageUnavailable {
            language: "Tamil".into(),
        };
        assert_eq!(language.to_string(), "Language is not available for this movie");
        assert_eq!(language.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(BookingError::invalid("x").kind(), ErrorKind::InvalidRequest);
        assert_eq!(BookingError::locked("x").kind(), ErrorKind::InvalidRequest);
        assert_eq!(
            BookingError::DuplicatePayment {
                payment_id: "p".into()
            }
            .kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            BookingError::Expired { reason: "x".into() }.kind(),
            ErrorKind::Expired
        );
        assert!(BookingError::Storage("down".into()).is_internal());
        assert!(!BookingError::Unauthenticated.is_internal());
    }
}
