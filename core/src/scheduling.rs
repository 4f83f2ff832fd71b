//! Show scheduling: create, update and delete with overlap and booking
//! guards.

use crate::authorization::{Action, Actor, Resource, authorize};
use crate::catalog::{Movie, Theatre};
use crate::environment::Clock;
use crate::error::{BookingError, Result};
use crate::providers::{CatalogStore, ShowStore};
use crate::show::{Show, ShowWindow};
use crate::types::{MovieId, ShowId, TheatreId};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

/// Proposed show fields, as submitted by a partner.
///
/// Numbers arrive as JSON numbers and are normalised: the price is rounded
/// up and the seat count rounded down.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowDraft {
    /// Movie to screen
    #[serde(alias = "movie")]
    pub movie_id: Option<MovieId>,
    /// Hosting theatre
    #[serde(alias = "theatre")]
    pub theatre_id: Option<TheatreId>,
    /// Screening language
    pub language: Option<String>,
    /// Start time
    pub start: Option<DateTime<Utc>>,
    /// End time
    pub end: Option<DateTime<Utc>>,
    /// Ticket price in major currency units
    pub ticket_price: Option<f64>,
    /// Seats in the hall
    pub total_seats: Option<f64>,
}

/// A draft with every field present and normalised.
#[derive(Clone, Debug, PartialEq, Eq)]
struct ValidDraft {
    movie_id: MovieId,
    theatre_id: TheatreId,
    language: String,
    window: ShowWindow,
    ticket_price: u32,
    total_seats: u32,
}

impl ShowDraft {
    fn validate(self) -> Result<ValidDraft> {
        let (
            Some(movie_id),
            Some(theatre_id),
            Some(language),
            Some(start),
            Some(end),
            Some(price),
            Some(seats),
        ) = (
            self.movie_id,
            self.theatre_id,
            self.language.filter(|l| !l.trim().is_empty()),
            self.start,
            self.end,
            self.ticket_price,
            self.total_seats,
        )
        else {
            return Err(BookingError::invalid("all show fields are required"));
        };

        Ok(ValidDraft {
            movie_id,
            theatre_id,
            language,
            window: ShowWindow::new(start, end)?,
            ticket_price: normalise_price(price)?,
            total_seats: normalise_seats(seats)?,
        })
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn normalise_price(price: f64) -> Result<u32> {
    let price = price.ceil();
    if !price.is_finite() || price < 0.0 || price > f64::from(u32::MAX) {
        return Err(BookingError::invalid("ticket price must be a non-negative number"));
    }
    Ok(price as u32)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn normalise_seats(seats: f64) -> Result<u32> {
    let seats = seats.floor();
    if !seats.is_finite() || seats < 1.0 || seats > f64::from(u32::MAX) {
        return Err(BookingError::invalid("total seats must be a positive number"));
    }
    Ok(seats as u32)
}

/// Fail with [`BookingError::ScheduleOverlap`] if any show in `shows`
/// (other than `exclude`) overlaps `window`.
///
/// Callers pass the shows of one theatre.
///
/// # Errors
///
/// Returns [`BookingError::ScheduleOverlap`] naming the first overlapping show.
pub fn check_schedule_free(
    shows: &[Show],
    window: &ShowWindow,
    exclude: Option<ShowId>,
) -> Result<()> {
    match shows
        .iter()
        .filter(|show| Some(show.id) != exclude)
        .find(|show| show.window().overlaps(window))
    {
        Some(existing) => Err(BookingError::ScheduleOverlap {
            show_id: existing.id.to_string(),
        }),
        None => Ok(()),
    }
}

/// Creates, edits and removes shows.
pub struct ShowScheduler {
    shows: Arc<dyn ShowStore>,
    catalog: Arc<dyn CatalogStore>,
    clock: Arc<dyn Clock>,
}

impl ShowScheduler {
    /// Create a scheduler.
    #[must_use]
    pub fn new(
        shows: Arc<dyn ShowStore>,
        catalog: Arc<dyn CatalogStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            shows,
            catalog,
            clock,
        }
    }

    async fn theatre(&self, id: TheatreId) -> Result<Theatre> {
        self.catalog
            .get_theatre(id)
            .await?
            .ok_or_else(|| BookingError::not_found("Theatre", id))
    }

    async fn movie(&self, id: MovieId) -> Result<Movie> {
        self.catalog
            .get_movie(id)
            .await?
            .ok_or_else(|| BookingError::not_found("Movie", id))
    }

    async fn show(&self, id: ShowId) -> Result<Show> {
        self.shows
            .get_show(id)
            .await?
            .ok_or_else(|| BookingError::not_found("Show", id))
    }

    /// Resolve references, check language and ownership.
    async fn check_references(&self, actor: &Actor, action: Action, draft: &ValidDraft) -> Result<()> {
        let theatre = self.theatre(draft.theatre_id).await?;
        let movie = self.movie(draft.movie_id).await?;
        if !movie.supports_language(&draft.language) {
            return Err(BookingError::LanguageUnavailable {
                language: draft.language.clone(),
            });
        }
        authorize(actor, action, Resource::Theatre(&theatre))
    }

    async fn check_overlap(&self, draft: &ValidDraft, exclude: Option<ShowId>) -> Result<()> {
        let existing = self.shows.shows_in_theatre(draft.theatre_id).await?;
        check_schedule_free(&existing, &draft.window, exclude).inspect_err(|_| {
            tracing::info!(
                theatre_id = %draft.theatre_id,
                start = %draft.window.start,
                end = %draft.window.end,
                "Schedule overlap rejected"
            );
        })
    }

    /// Schedule a new show.
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidRequest`] for missing or invalid fields
    /// - [`BookingError::NotFound`] for an unknown theatre, movie or language
    /// - [`BookingError::Forbidden`] unless the actor owns the theatre
    /// - [`BookingError::ScheduleOverlap`] if the window collides
    pub async fn create(&self, actor: &Actor, draft: ShowDraft) -> Result<Show> {
        let draft = draft.validate()?;
        self.check_references(actor, Action::CreateShow, &draft).await?;
        self.check_overlap(&draft, None).await?;

        let show = Show {
            id: ShowId::new(),
            movie_id: draft.movie_id,
            theatre_id: draft.theatre_id,
            language: draft.language,
            start: draft.window.start,
            end: draft.window.end,
            ticket_price: draft.ticket_price,
            total_seats: draft.total_seats,
            booked_seats: Vec::new(),
            version: 0,
        };
        self.shows.insert_show(&show).await?;

        tracing::info!(show_id = %show.id, theatre_id = %show.theatre_id, "Show created");
        Ok(show)
    }

    /// Replace every field of a show that has no bookings yet.
    ///
    /// When the show moves to another theatre the actor must own both.
    ///
    /// # Errors
    ///
    /// As [`ShowScheduler::create`], plus:
    /// - [`BookingError::NotFound`] if the show does not exist
    /// - [`BookingError::Locked`] if seats are booked, including bookings
    ///   committed while the update was in flight
    pub async fn update(&self, actor: &Actor, show_id: ShowId, draft: ShowDraft) -> Result<Show> {
        let draft = draft.validate()?;
        self.check_references(actor, Action::UpdateShow, &draft).await?;

        let current = self.show(show_id).await?;
        if current.theatre_id != draft.theatre_id {
            let previous = self.theatre(current.theatre_id).await?;
            authorize(actor, Action::UpdateShow, Resource::Theatre(&previous))?;
        }
        if current.has_bookings() {
            return Err(BookingError::locked(
                "Cannot edit this show as bookings have already started",
            ));
        }
        self.check_overlap(&draft, Some(show_id)).await?;

        let updated = Show {
            id: show_id,
            movie_id: draft.movie_id,
            theatre_id: draft.theatre_id,
            language: draft.language,
            start: draft.window.start,
            end: draft.window.end,
            ticket_price: draft.ticket_price,
            total_seats: draft.total_seats,
            booked_seats: Vec::new(),
            version: current.version + 1,
        };
        if !self.shows.replace_unbooked_show(&updated, current.version).await? {
            return Err(BookingError::locked(
                "Cannot edit this show as bookings have already started",
            ));
        }

        tracing::info!(show_id = %show_id, "Show updated");
        Ok(updated)
    }

    /// Remove a show unless it is upcoming and already has bookings.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] if the show or its theatre does not exist
    /// - [`BookingError::Forbidden`] unless admin or owning partner
    /// - [`BookingError::Locked`] for an upcoming show with bookings
    pub async fn delete(&self, actor: &Actor, show_id: ShowId) -> Result<()> {
        let show = self.show(show_id).await?;
        let theatre = self.theatre(show.theatre_id).await?;
        authorize(actor, Action::DeleteShow, Resource::Theatre(&theatre))?;

        if show.is_upcoming(self.clock.now()) && show.has_bookings() {
            return Err(BookingError::locked(
                "Cannot delete this upcoming show as bookings have already started",
            ));
        }

        if !self.shows.delete_show(show_id).await? {
            return Err(BookingError::not_found("Show", show_id));
        }

        tracing::info!(show_id = %show_id, "Show deleted");
        Ok(())
    }
}
