//! Movie and theatre changes that must respect scheduled shows.

use crate::authorization::{Action, Actor, Resource, authorize};
use crate::catalog::{Movie, MoviePatch};
use crate::environment::Clock;
use crate::error::{BookingError, Result};
use crate::providers::{CatalogStore, ShowStore};
use crate::types::{MovieId, TheatreId};
use std::sync::Arc;

/// Guards catalog edits against shows that reference them.
pub struct CatalogGuard {
    shows: Arc<dyn ShowStore>,
    catalog: Arc<dyn CatalogStore>,
    clock: Arc<dyn Clock>,
}

impl CatalogGuard {
    /// Create a guard.
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

    /// Apply `patch` to a movie.
    ///
    /// Once any show references the movie its release date is frozen and
    /// languages can only be added.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Forbidden`] unless admin
    /// - [`BookingError::InvalidRequest`] for an empty patch
    /// - [`BookingError::NotFound`] if the movie does not exist
    /// - [`BookingError::Locked`] if the patch touches frozen fields
    pub async fn update_movie(&self, actor: &Actor, id: MovieId, patch: MoviePatch) -> Result<Movie> {
        authorize(actor, Action::UpdateMovie, Resource::Catalog)?;
        if patch == MoviePatch::default() {
            return Err(BookingError::invalid("nothing to update"));
        }

        let mut movie = self
            .catalog
            .get_movie(id)
            .await?
            .ok_or_else(|| BookingError::not_found("Movie", id))?;

        let scheduled = !self.shows.shows_for_movie(id).await?.is_empty();
        if scheduled {
            if patch.release_date.is_some_and(|date| date != movie.release_date) {
                return Err(BookingError::locked(
                    "Cannot change release date as shows have already been added in theatres",
                ));
            }
            if let Some(languages) = &patch.languages {
                if movie.languages.iter().any(|l| !languages.contains(l)) {
                    return Err(BookingError::locked(
                        "Cannot remove existing languages as shows have already been added in theatres",
                    ));
                }
            }
        }

        patch.apply_to(&mut movie);
        self.catalog.update_movie(&movie).await?;

        tracing::info!(movie_id = %id, scheduled, "Movie updated");
        Ok(movie)
    }

    /// Delete a movie and its past shows.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Forbidden`] unless admin
    /// - [`BookingError::NotFound`] if the movie does not exist
    /// - [`BookingError::Locked`] while any of its shows is upcoming
    pub async fn delete_movie(&self, actor: &Actor, id: MovieId) -> Result<()> {
        authorize(actor, Action::DeleteMovie, Resource::Catalog)?;
        if self.catalog.get_movie(id).await?.is_none() {
            return Err(BookingError::not_found("Movie", id));
        }

        if !self.catalog.delete_movie(id, self.clock.now()).await? {
            return Err(BookingError::locked(
                "Cannot delete this movie as there are upcoming shows in theatres",
            ));
        }

        tracing::info!(movie_id = %id, "Movie deleted");
        Ok(())
    }

    /// Delete a theatre and its past shows.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] if the theatre does not exist
    /// - [`BookingError::Forbidden`] unless admin or the owner
    /// - [`BookingError::Locked`] while any of its shows is upcoming
    pub async fn delete_theatre(&self, actor: &Actor, id: TheatreId) -> Result<()> {
        let theatre = self
            .catalog
            .get_theatre(id)
            .await?
            .ok_or_else(|| BookingError::not_found("Theatre", id))?;
        authorize(actor, Action::DeleteTheatre, Resource::Theatre(&theatre))?;

        if !self.catalog.delete_theatre(id, self.clock.now()).await? {
            return Err(BookingError::locked(
                "Cannot delete this theatre as there are some upcoming shows",
            ));
        }

        tracing::info!(theatre_id = %id, "Theatre deleted");
        Ok(())
    }
}
