//! Movies, theatres and users referenced by shows and bookings.

use crate::authorization::Role;
use crate::types::{MovieId, TheatreId, UserId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A movie in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    /// Movie identifier
    pub id: MovieId,
    /// Display title
    pub title: String,
    /// Synopsis
    pub description: String,
    /// Running time in minutes
    pub duration_minutes: u32,
    /// Genres
    pub genres: Vec<String>,
    /// Languages the movie can be screened in
    pub languages: Vec<String>,
    /// Release date
    pub release_date: NaiveDate,
    /// Rating certificate ("U", "UA", "A")
    pub certificate: String,
}

impl Movie {
    /// The movie is available in `language` (exact match).
    #[must_use]
    pub fn supports_language(&self, language: &str) -> bool {
        self.languages.iter().any(|l| l == language)
    }
}

/// A theatre owned by a partner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theatre {
    /// Theatre identifier
    pub id: TheatreId,
    /// Display name
    pub name: String,
    /// Street address
    pub address: String,
    /// Owning partner
    pub owner_id: UserId,
    /// Contact phone
    pub phone: String,
    /// Approved by an admin
    pub is_approved: bool,
}

/// A registered user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier
    pub id: UserId,
    /// Display name
    pub name: String,
    /// Email address tickets are sent to
    pub email: String,
    /// Role
    pub role: Role,
}

/// Changes accepted on a movie.
///
/// `None` leaves the field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoviePatch {
    /// New title
    pub title: Option<String>,
    /// New synopsis
    pub description: Option<String>,
    /// New running time
    pub duration_minutes: Option<u32>,
    /// New genres
    pub genres: Option<Vec<String>>,
    /// New languages
    pub languages: Option<Vec<String>>,
    /// New release date
    pub release_date: Option<NaiveDate>,
    /// New certificate
    pub certificate: Option<String>,
}

impl MoviePatch {
    /// Apply the patch to `movie`.
    pub fn apply_to(self, movie: &mut Movie) {
        if let Some(title) = self.title {
            movie.title = title;
        }
        if let Some(description) = self.description {
            movie.description = description;
        }
        if let Some(duration) = self.duration_minutes {
            movie.duration_minutes = duration;
        }
        if let Some(genres) = self.genres {
            movie.genres = genres;
        }
        if let Some(languages) = self.languages {
            movie.languages = languages;
        }
        if let Some(release_date) = self.release_date {
            movie.release_date = release_date;
        }
        if let Some(certificate) = self.certificate {
            movie.certificate = certificate;
        }
    }
}
