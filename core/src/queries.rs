//! Read side: a user's bookings, single shows, a movie's shows on one day
//! and paginated theatre listings, each populated with the movie and
//! theatre they reference.

use crate::authorization::{Action, Actor, Resource, authorize};
use crate::booking::Booking;
use crate::catalog::{Movie, Theatre};
use crate::environment::Clock;
use crate::error::{BookingError, Result};
use crate::providers::{BookingStore, CatalogStore, ShowStore};
use crate::show::Show;
use crate::types::{MovieId, ShowId, TheatreId};
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Default page size for theatre listings.
pub const DEFAULT_PER_PAGE: u32 = 10;

/// Largest accepted page size.
pub const MAX_PER_PAGE: u32 = 100;

/// Raw query string of `GET /bookings`.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct BookingQueryParams {
    /// `"true"` or `"false"`
    pub upcoming: Option<String>,
    /// Maximum number of bookings
    pub limit: Option<String>,
}

/// Validated booking filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BookingQuery {
    /// Upcoming shows when `true`, past shows when `false`
    pub upcoming: bool,
    /// Maximum number of bookings returned
    pub limit: Option<u32>,
}

impl Default for BookingQuery {
    fn default() -> Self {
        Self {
            upcoming: true,
            limit: None,
        }
    }
}

impl TryFrom<BookingQueryParams> for BookingQuery {
    type Error = BookingError;

    fn try_from(params: BookingQueryParams) -> Result<Self> {
        let upcoming = match params.upcoming.as_deref() {
            None | Some("true") => true,
            Some("false") => false,
            Some(other) => {
                return Err(BookingError::invalid(format!(
                    "upcoming must be true or false, got '{other}'"
                )));
            },
        };
        let limit = params
            .limit
            .map(|raw| {
                raw.parse::<u32>()
                    .ok()
                    .filter(|limit| *limit > 0)
                    .ok_or_else(|| BookingError::invalid("limit must be a positive integer"))
            })
            .transpose()?;
        Ok(Self { upcoming, limit })
    }
}

/// Raw query string of paginated listings.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PageParams {
    /// 1-based page number
    pub page: Option<String>,
    /// Page size
    pub limit: Option<String>,
}

/// Validated pagination window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub per_page: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl Pagination {
    /// Create a window.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidRequest`] if either value is zero or
    /// `per_page` exceeds [`MAX_PER_PAGE`].
    pub fn new(page: u32, per_page: u32) -> Result<Self> {
        if page == 0 {
            return Err(BookingError::invalid("page starts at 1"));
        }
        if per_page == 0 || per_page > MAX_PER_PAGE {
            return Err(BookingError::invalid(format!(
                "limit must be between 1 and {MAX_PER_PAGE}"
            )));
        }
        Ok(Self { page, per_page })
    }

    /// Rows to skip.
    #[must_use]
    pub const fn skip(&self) -> u64 {
        (self.page as u64 - 1) * self.per_page as u64
    }

    /// Rows to take.
    #[must_use]
    pub const fn limit(&self) -> u64 {
        self.per_page as u64
    }

    /// Number of pages needed for `total` rows.
    #[must_use]
    pub const fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.per_page as u64)
    }
}

impl TryFrom<PageParams> for Pagination {
    type Error = BookingError;

    fn try_from(params: PageParams) -> Result<Self> {
        let parse = |raw: Option<String>, default: u32, name: &str| -> Result<u32> {
            raw.map_or(Ok(default), |raw| {
                raw.parse()
                    .map_err(|_| BookingError::invalid(format!("{name} must be a positive integer")))
            })
        };
        Self::new(
            parse(params.page, 1, "page")?,
            parse(params.limit, DEFAULT_PER_PAGE, "limit")?,
        )
    }
}

/// One page of results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Total items across all pages
    pub total: u64,
    /// Number of pages
    pub total_pages: u64,
    /// This page
    pub page: u32,
}

/// A show with its movie and theatre.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ShowView {
    /// The show
    #[serde(flatten)]
    pub show: Show,
    /// Movie being screened
    pub movie: Movie,
    /// Hosting theatre
    pub theatre: Theatre,
}

/// Shows of one theatre in a day listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TheatreShows {
    /// Hosting theatre
    pub theatre: Theatre,
    /// Its shows, ordered by start
    pub show_list: Vec<Show>,
}

/// A movie's shows on one day, grouped by theatre.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MovieShows {
    /// The movie
    pub movie: Movie,
    /// Theatres in order of their earliest show
    pub theatres: Vec<TheatreShows>,
}

/// Start and end of `date` in `offset`, as `[from, to)`.
///
/// The window ends at 23:59:59 local time. On the current local day it
/// starts at `now`, so shows that already began are left out.
///
/// # Errors
///
/// Returns [`BookingError::InvalidRequest`] if the date cannot be placed in
/// the offset.
pub fn day_window(
    date: NaiveDate,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let at = |hour, min, sec| {
        date.and_hms_opt(hour, min, sec)
            .and_then(|local| offset.from_local_datetime(&local).single())
            .map(|local| local.with_timezone(&Utc))
            .ok_or_else(|| BookingError::invalid(format!("date {date} is out of range")))
    };
    let mut from = at(0, 0, 0)?;
    let to = at(23, 59, 59)?;

    if now.with_timezone(&offset).date_naive() == date {
        from = from.max(now);
    }
    Ok((from, to))
}

/// A booking with its populated show.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BookingView {
    /// The booking
    #[serde(flatten)]
    pub booking: Booking,
    /// Populated show
    pub show: ShowView,
}

/// Read-only queries.
pub struct BookingQueries {
    bookings: Arc<dyn BookingStore>,
    shows: Arc<dyn ShowStore>,
    catalog: Arc<dyn CatalogStore>,
    clock: Arc<dyn Clock>,
    local_offset: FixedOffset,
}

impl BookingQueries {
    /// Create the query service.
    #[must_use]
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        shows: Arc<dyn ShowStore>,
        catalog: Arc<dyn CatalogStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            bookings,
            shows,
            catalog,
            clock,
            local_offset: Utc.fix(),
        }
    }

    /// Interpret calendar dates in `offset` instead of UTC.
    #[must_use]
    pub fn with_local_offset(mut self, offset: FixedOffset) -> Self {
        self.local_offset = offset;
        self
    }

    /// Populate a show, or `None` if its movie or theatre is gone.
    async fn populate(&self, show: Show) -> Result<Option<ShowView>> {
        let Some(movie) = self.catalog.get_movie(show.movie_id).await? else {
            return Ok(None);
        };
        let Some(theatre) = self.catalog.get_theatre(show.theatre_id).await? else {
            return Ok(None);
        };
        Ok(Some(ShowView {
            show,
            movie,
            theatre,
        }))
    }

    /// Bookings of the actor, filtered to upcoming or past shows.
    ///
    /// Upcoming bookings are ordered by show start ascending, past ones
    /// descending. Bookings whose show no longer resolves are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Storage`] if a store fails.
    pub async fn bookings_for(&self, actor: &Actor, query: BookingQuery) -> Result<Vec<BookingView>> {
        authorize(actor, Action::ListOwnBookings, Resource::Own)?;
        let now = self.clock.now();

        let mut shows: HashMap<ShowId, Option<ShowView>> = HashMap::new();
        let mut views = Vec::new();
        for booking in self.bookings.bookings_for_user(actor.user_id).await? {
            if !shows.contains_key(&booking.show_id) {
                let view = match self.shows.get_show(booking.show_id).await? {
                    Some(show) => self.populate(show).await?,
                    None => None,
                };
                shows.insert(booking.show_id, view);
            }
            let Some(Some(view)) = shows.get(&booking.show_id) else {
                continue;
            };

            let start = view.show.start;
            let matches = if query.upcoming { start > now } else { start < now };
            if matches {
                views.push(BookingView {
                    booking,
                    show: view.clone(),
                });
            }
        }

        if query.upcoming {
            views.sort_by_key(|view| view.show.show.start);
        } else {
            views.sort_by_key(|view| std::cmp::Reverse(view.show.show.start));
        }
        if let Some(limit) = query.limit {
            views.truncate(limit as usize);
        }
        Ok(views)
    }

    /// A single populated show.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::NotFound`] if the show, its movie or its
    /// theatre does not exist.
    pub async fn show(&self, id: ShowId) -> Result<ShowView> {
        let show = self
            .shows
            .get_show(id)
            .await?
            .ok_or_else(|| BookingError::not_found("Show", id))?;
        self.populate(show)
            .await?
            .ok_or_else(|| BookingError::not_found("Show", id))
    }

    /// Shows of a movie in `language` on `date`, grouped by theatre.
    ///
    /// Shows whose theatre no longer exists are skipped.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] if the movie does not exist
    /// - [`BookingError::LanguageUnavailable`] if it is not screened in
    ///   `language`
    /// - [`BookingError::InvalidRequest`] if the date is out of range
    pub async fn movie_shows(
        &self,
        actor: &Actor,
        movie_id: MovieId,
        date: NaiveDate,
        language: &str,
    ) -> Result<MovieShows> {
        authorize(actor, Action::BrowseShows, Resource::Catalog)?;
        let movie = self
            .catalog
            .get_movie(movie_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Movie", movie_id))?;
        if !movie.supports_language(language) {
            return Err(BookingError::LanguageUnavailable {
                language: language.to_string(),
            });
        }

        let (from, to) = day_window(date, self.local_offset, self.clock.now())?;
        let shows = self
            .shows
            .shows_for_movie_between(movie_id, language, from, to)
            .await?;

        let mut theatres: Vec<TheatreShows> = Vec::new();
        let mut slots: HashMap<TheatreId, Option<usize>> = HashMap::new();
        for show in shows {
            if !slots.contains_key(&show.theatre_id) {
                let slot = match self.catalog.get_theatre(show.theatre_id).await? {
                    Some(theatre) => {
                        theatres.push(TheatreShows {
                            theatre,
                            show_list: Vec::new(),
                        });
                        Some(theatres.len() - 1)
                    },
                    None => None,
                };
                slots.insert(show.theatre_id, slot);
            }
            if let Some(Some(slot)) = slots.get(&show.theatre_id) {
                theatres[*slot].show_list.push(show);
            }
        }

        tracing::debug!(
            movie_id = %movie_id,
            %date,
            language,
            theatres = theatres.len(),
            "Fetched shows of movie"
        );
        Ok(MovieShows { movie, theatres })
    }

    /// One page of a theatre's shows ordered by start.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Forbidden`] unless partner or admin
    /// - [`BookingError::NotFound`] if the theatre does not exist
    pub async fn theatre_shows(
        &self,
        actor: &Actor,
        theatre_id: TheatreId,
        pagination: Pagination,
    ) -> Result<Page<ShowView>> {
        let theatre = self
            .catalog
            .get_theatre(theatre_id)
            .await?
            .ok_or_else(|| BookingError::not_found("Theatre", theatre_id))?;
        authorize(actor, Action::ListTheatreShows, Resource::Theatre(&theatre))?;

        let (shows, total) = self
            .shows
            .page_theatre_shows(theatre_id, pagination.skip(), pagination.limit())
            .await?;

        let mut items = Vec::with_capacity(shows.len());
        for show in shows {
            if let Some(view) = self.populate(show).await? {
                items.push(view);
            }
        }

        Ok(Page {
            items,
            total,
            total_pages: pagination.total_pages(total),
            page: pagination.page,
        })
    }
}
