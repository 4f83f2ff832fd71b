//! Persistence traits.

use crate::booking::{Booking, CommittedBooking, NewBooking};
use crate::catalog::{Movie, Theatre, User};
use crate::error::Result;
use crate::show::Show;
use crate::types::{MovieId, ShowId, TheatreId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Show records.
#[async_trait]
pub trait ShowStore: Send + Sync {
    /// Load a show.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookingError::Storage`] if the backend fails.
    async fn get_show(&self, id: ShowId) -> Result<Option<Show>>;

    /// All shows of a theatre, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookingError::Storage`] if the backend fails.
    async fn shows_in_theatre(&self, theatre_id: TheatreId) -> Result<Vec<Show>>;

    /// All shows of a movie, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookingError::Storage`] if the backend fails.
    async fn shows_for_movie(&self, movie_id: MovieId) -> Result<Vec<Show>>;

    /// Shows of a movie in one language starting in `[from, to)`, ordered
    /// by start.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookingError::Storage`] if the backend fails.
    async fn shows_for_movie_between(
        &self,
        movie_id: MovieId,
        language: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Show>>;

    /// One page of a theatre's shows ordered by start, plus the total count.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookingError::Storage`] if the backend fails.
    async fn page_theatre_shows(
        &self,
        theatre_id: TheatreId,
        skip: u64,
        limit: u64,
    ) -> Result<(Vec<Show>, u64)>;

    /// Store a new show.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookingError::Storage`] if the backend fails.
    async fn insert_show(&self, show: &Show) -> Result<()>;

    /// Replace a show only if its stored version still equals
    /// `expected_version` and it has no booked seats.
    ///
    /// Returns `false` when the condition did not hold and nothing was
    /// written. On success the stored version is `expected_version + 1`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookingError::Storage`] if the backend fails.
    async fn replace_unbooked_show(&self, show: &Show, expected_version: i64) -> Result<bool>;

    /// Delete a show. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookingError::Storage`] if the backend fails.
    async fn delete_show(&self, id: ShowId) -> Result<bool>;
}

/// Booking records and the atomic seat commit.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Atomically book seats.
    ///
    /// In one serializable step: load the show, re-validate the seats
    /// against its current inventory ([`Show::apply_booking`]), reject a
    /// transaction id that already has a booking, append the seats, bump the
    /// show version and insert the booking.
    ///
    /// # Errors
    ///
    /// - [`crate::BookingError::NotFound`] if the show is gone
    /// - [`crate::BookingError::SeatConflict`] if any seat was taken first
    /// - [`crate::BookingError::DuplicatePayment`] if the payment was
    ///   already used
    /// - [`crate::BookingError::Storage`] if the backend fails
    async fn commit_booking(
        &self,
        booking: NewBooking,
        now: DateTime<Utc>,
    ) -> Result<CommittedBooking>;

    /// All bookings of a user.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookingError::Storage`] if the backend fails.
    async fn bookings_for_user(&self, user_id: UserId) -> Result<Vec<Booking>>;
}

/// Movies, theatres and users.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Load a movie.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookingError::Storage`] if the backend fails.
    async fn get_movie(&self, id: MovieId) -> Result<Option<Movie>>;

    /// Load a theatre.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookingError::Storage`] if the backend fails.
    async fn get_theatre(&self, id: TheatreId) -> Result<Option<Theatre>>;

    /// Load a user.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookingError::Storage`] if the backend fails.
    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    /// Overwrite a movie.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookingError::Storage`] if the backend fails.
    async fn update_movie(&self, movie: &Movie) -> Result<()>;

    /// Delete a movie together with all of its shows, unless one of them
    /// starts after `now`.
    ///
    /// The check and the delete are one atomic step, so a show scheduled
    /// concurrently either blocks the delete or is never written. Returns
    /// `false`, deleting nothing, when an upcoming show exists.
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookingError::Storage`] if the backend fails.
    async fn delete_movie(&self, id: MovieId, now: DateTime<Utc>) -> Result<bool>;

    /// Delete a theatre together with all of its shows, unless one of them
    /// starts after `now`. Same contract as [`CatalogStore::delete_movie`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::BookingError::Storage`] if the backend fails.
    async fn delete_theatre(&self, id: TheatreId, now: DateTime<Utc>) -> Result<bool>;
}
