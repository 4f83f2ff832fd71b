//! # Showtime Core
//!
//! Seat reservation, payment verification and show scheduling for a movie
//! ticket booking backend.
//!
//! ## Flow
//!
//! ```text
//! OrderInitiator ──► payment gateway ──► PaymentVerifier
//!                                            │
//!                       BookingStore::commit_booking (seats + booking, atomic)
//!                                            │
//!                                   TicketRenderer ─► TicketNotifier
//! ```
//!
//! - [`OrderInitiator`] checks that the show is upcoming and the seats are
//!   free, then asks the gateway for an order. Seats are not held.
//! - [`PaymentVerifier`] checks the HMAC signature of the gateway callback
//!   and commits the booking. The commit re-validates the seats, so two
//!   buyers racing for one seat cannot both win.
//! - [`ShowScheduler`] and [`CatalogGuard`] protect schedules and catalog
//!   entries that already have bookings or upcoming shows.
//! - [`BookingQueries`] serves the read side.
//!
//! Every collaborator (stores, gateway, renderer, notifier, clock) is a
//! trait in [`providers`] or [`environment`]; in-memory versions live in
//! [`mocks`] behind the `test-utils` feature.

#![forbid(unsafe_code)]

pub mod authorization;
pub mod booking;
pub mod catalog;
pub mod catalog_guard;
pub mod environment;
pub mod error;
pub mod orders;
pub mod providers;
pub mod queries;
pub mod scheduling;
pub mod seat;
pub mod show;
pub mod signature;
pub mod ticket;
pub mod types;
pub mod verification;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use authorization::{Action, Actor, Resource, Role, authorize, can};
pub use booking::{Booking, CommittedBooking, NewBooking};
pub use catalog::{Movie, MoviePatch, Theatre, User};
pub use catalog_guard::CatalogGuard;
pub use environment::{Clock, SystemClock};
pub use error::{BookingError, ErrorKind, Result};
pub use orders::{CreateOrderRequest, OrderConfig, OrderDetails, OrderInitiator};
pub use queries::{
    BookingQueries, BookingQuery, BookingQueryParams, BookingView, MovieShows, Page, PageParams,
    Pagination, ShowView, TheatreShows, day_window,
};
pub use scheduling::{ShowDraft, ShowScheduler, check_schedule_free};
pub use seat::{seat_label, seat_labels};
pub use show::{Show, ShowWindow};
pub use ticket::{TextTicketRenderer, TicketDetails};
pub use types::{BookingId, MovieId, ShowId, TheatreId, UserId};
pub use verification::{BookingConfirmation, PaymentVerifier, VerifierConfig, VerifyPaymentRequest};
