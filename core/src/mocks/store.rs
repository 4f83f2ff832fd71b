//! In-memory store implementing every persistence trait.

use crate::booking::{Booking, CommittedBooking, NewBooking};
use crate::catalog::{Movie, Theatre, User};
use crate::error::{BookingError, Result};
use crate::providers::{BookingStore, CatalogStore, ShowStore};
use crate::show::Show;
use crate::types::{BookingId, MovieId, ShowId, TheatreId, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Tables {
    shows: HashMap<ShowId, Show>,
    bookings: HashMap<BookingId, Booking>,
    movies: HashMap<MovieId, Movie>,
    theatres: HashMap<TheatreId, Theatre>,
    users: HashMap<UserId, User>,
}

/// Shows, bookings and catalog behind a single mutex.
///
/// Holding one lock for the whole booking commit gives it the same
/// all-or-nothing behaviour as the database transaction.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| BookingError::Storage("in-memory store lock poisoned".to_string()))
    }

    fn guard(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add or replace a movie.
    pub fn seed_movie(&self, movie: Movie) {
        self.guard().movies.insert(movie.id, movie);
    }

    /// Add or replace a theatre.
    pub fn seed_theatre(&self, theatre: Theatre) {
        self.guard().theatres.insert(theatre.id, theatre);
    }

    /// Add or replace a user.
    pub fn seed_user(&self, user: User) {
        self.guard().users.insert(user.id, user);
    }

    /// Add or replace a show.
    pub fn seed_show(&self, show: Show) {
        self.guard().shows.insert(show.id, show);
    }

    /// Current state of a show.
    #[must_use]
    pub fn show_snapshot(&self, id: ShowId) -> Option<Show> {
        self.guard().shows.get(&id).cloned()
    }

    /// Every stored booking, oldest first.
    #[must_use]
    pub fn all_bookings(&self) -> Vec<Booking> {
        let mut bookings: Vec<_> = self.guard().bookings.values().cloned().collect();
        bookings.sort_by_key(|b| b.created_at);
        bookings
    }

    /// Whether a movie is still stored.
    #[must_use]
    pub fn has_movie(&self, id: MovieId) -> bool {
        self.guard().movies.contains_key(&id)
    }

    /// Whether a theatre is still stored.
    #[must_use]
    pub fn has_theatre(&self, id: TheatreId) -> bool {
        self.guard().theatres.contains_key(&id)
    }
}

#[async_trait]
impl ShowStore for InMemoryStore {
    async fn get_show(&self, id: ShowId) -> Result<Option<Show>> {
        Ok(self.lock()?.shows.get(&id).cloned())
    }

    async fn shows_in_theatre(&self, theatre_id: TheatreId) -> Result<Vec<Show>> {
        Ok(self
            .lock()?
            .shows
            .values()
            .filter(|s| s.theatre_id == theatre_id)
            .cloned()
            .collect())
    }

    async fn shows_for_movie(&self, movie_id: MovieId) -> Result<Vec<Show>> {
        Ok(self
            .lock()?
            .shows
            .values()
            .filter(|s| s.movie_id == movie_id)
            .cloned()
            .collect())
    }

    async fn shows_for_movie_between(
        &self,
        movie_id: MovieId,
        language: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Show>> {
        let mut shows: Vec<Show> = self
            .lock()?
            .shows
            .values()
            .filter(|s| s.movie_id == movie_id && s.language == language)
            .filter(|s| s.start >= from && s.start < to)
            .cloned()
            .collect();
        shows.sort_by_key(|s| (s.start, s.id));
        Ok(shows)
    }

    async fn page_theatre_shows(
        &self,
        theatre_id: TheatreId,
        skip: u64,
        limit: u64,
    ) -> Result<(Vec<Show>, u64)> {
        let mut shows = self.shows_in_theatre(theatre_id).await?;
        shows.sort_by_key(|s| (s.start, s.id));
        let total = shows.len() as u64;
        let page = shows
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect();
        Ok((page, total))
    }

    async fn insert_show(&self, show: &Show) -> Result<()> {
        self.lock()?.shows.insert(show.id, show.clone());
        Ok(())
    }

    async fn replace_unbooked_show(&self, show: &Show, expected_version: i64) -> Result<bool> {
        let mut tables = self.lock()?;
        match tables.shows.get_mut(&show.id) {
            Some(stored) if stored.version == expected_version && !stored.has_bookings() => {
                *stored = Show {
                    version: expected_version + 1,
                    ..show.clone()
                };
                Ok(true)
            },
            _ => Ok(false),
        }
    }

    async fn delete_show(&self, id: ShowId) -> Result<bool> {
        Ok(self.lock()?.shows.remove(&id).is_some())
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn commit_booking(
        &self,
        booking: NewBooking,
        now: DateTime<Utc>,
    ) -> Result<CommittedBooking> {
        let mut tables = self.lock()?;

        if tables
            .bookings
            .values()
            .any(|b| b.transaction_id == booking.transaction_id)
        {
            return Err(BookingError::DuplicatePayment {
                payment_id: booking.transaction_id,
            });
        }

        let stored = tables
            .shows
            .get_mut(&booking.show_id)
            .ok_or_else(|| BookingError::not_found("Show", booking.show_id))?;
        stored.apply_booking(&booking.seats)?;
        let show = stored.clone();

        let booking = booking.into_booking(now);
        tables.bookings.insert(booking.id, booking.clone());

        Ok(CommittedBooking { booking, show })
    }

    async fn bookings_for_user(&self, user_id: UserId) -> Result<Vec<Booking>> {
        Ok(self
            .lock()?
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CatalogStore for InMemoryStore {
    async fn get_movie(&self, id: MovieId) -> Result<Option<Movie>> {
        Ok(self.lock()?.movies.get(&id).cloned())
    }

    async fn get_theatre(&self, id: TheatreId) -> Result<Option<Theatre>> {
        Ok(self.lock()?.theatres.get(&id).cloned())
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn update_movie(&self, movie: &Movie) -> Result<()> {
        self.lock()?.movies.insert(movie.id, movie.clone());
        Ok(())
    }

    async fn delete_movie(&self, id: MovieId, now: DateTime<Utc>) -> Result<bool> {
        let mut tables = self.lock()?;
        if tables
            .shows
            .values()
            .any(|s| s.movie_id == id && s.is_upcoming(now))
        {
            return Ok(false);
        }
        tables.shows.retain(|_, s| s.movie_id != id);
        tables.movies.remove(&id);
        Ok(true)
    }

    async fn delete_theatre(&self, id: TheatreId, now: DateTime<Utc>) -> Result<bool> {
        let mut tables = self.lock()?;
        if tables
            .shows
            .values()
            .any(|s| s.theatre_id == id && s.is_upcoming(now))
        {
            return Ok(false);
        }
        tables.shows.retain(|_, s| s.theatre_id != id);
        tables.theatres.remove(&id);
        Ok(true)
    }
}
