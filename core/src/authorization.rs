//! Capability checks for state-changing operations.
//!
//! Every service calls [`authorize`] before it mutates anything, so role and
//! ownership rules live in one table ([`can`]) instead of in each handler.

use crate::catalog::Theatre;
use crate::error::{BookingError, Result};
use crate::types::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Books tickets
    User,
    /// Owns theatres and schedules shows
    Partner,
    /// Manages the catalog
    Admin,
}

impl Role {
    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Partner => "partner",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Self::User),
            "partner" => Ok(Self::Partner),
            "admin" => Ok(Self::Admin),
            other => Err(BookingError::invalid(format!("unknown role '{other}'"))),
        }
    }
}

/// The authenticated caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Actor {
    /// Caller's user id
    pub user_id: UserId,
    /// Caller's role
    pub role: Role,
}

impl Actor {
    /// Create an actor.
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    const fn is_partner_or_admin(&self) -> bool {
        matches!(self.role, Role::Partner | Role::Admin)
    }
}

/// Operations subject to authorization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Schedule a new show in a theatre
    CreateShow,
    /// Edit a show
    UpdateShow,
    /// Remove a show
    DeleteShow,
    /// Edit a movie
    UpdateMovie,
    /// Remove a movie
    DeleteMovie,
    /// Remove a theatre
    DeleteTheatre,
    /// List a theatre's shows
    ListTheatreShows,
    /// Look up a movie's shows on a day
    BrowseShows,
    /// Buy seats
    BookSeats,
    /// List the caller's own bookings
    ListOwnBookings,
}

impl Action {
    /// Phrase used in "You are not authorized to ..." messages.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::CreateShow => "create a show in this theatre",
            Self::UpdateShow => "update this show",
            Self::DeleteShow => "delete this show",
            Self::UpdateMovie => "update this movie",
            Self::DeleteMovie => "delete this movie",
            Self::DeleteTheatre => "delete this theatre",
            Self::ListTheatreShows => "view shows of this theatre",
            Self::BrowseShows => "browse shows",
            Self::BookSeats => "book seats",
            Self::ListOwnBookings => "view bookings",
        }
    }
}

/// What the action targets.
#[derive(Clone, Copy, Debug)]
pub enum Resource<'a> {
    /// A theatre (or a show, through its theatre)
    Theatre(&'a Theatre),
    /// The movie catalog
    Catalog,
    /// The caller's own data
    Own,
}

/// Whether `actor` may perform `action` on `resource`.
#[must_use]
pub fn can(actor: &Actor, action: Action, resource: Resource<'_>) -> bool {
    let owns = |theatre: &Theatre| theatre.owner_id == actor.user_id;

    match (action, resource) {
        (Action::CreateShow | Action::UpdateShow, Resource::Theatre(theatre)) => {
            actor.is_partner_or_admin() && owns(theatre)
        },
        (Action::DeleteShow | Action::DeleteTheatre, Resource::Theatre(theatre)) => {
            actor.is_admin() || (actor.role == Role::Partner && owns(theatre))
        },
        (Action::ListTheatreShows, Resource::Theatre(_)) => actor.is_partner_or_admin(),
        (Action::UpdateMovie | Action::DeleteMovie, Resource::Catalog) => actor.is_admin(),
        (Action::BrowseShows, Resource::Catalog) => true,
        (Action::BookSeats | Action::ListOwnBookings, Resource::Own) => true,
        _ => false,
    }
}

/// Fail with [`BookingError::Forbidden`] unless [`can`] allows the action.
///
/// # Errors
///
/// Returns [`BookingError::Forbidden`] when the capability check fails.
pub fn authorize(actor: &Actor, action: Action, resource: Resource<'_>) -> Result<()> {
    if can(actor, action, resource) {
        Ok(())
    } else {
        tracing::debug!(
            user_id = %actor.user_id,
            role = %actor.role,
            ?action,
            "Authorization denied"
        );
        Err(BookingError::Forbidden {
            action: action.describe().to_string(),
        })
    }
}
