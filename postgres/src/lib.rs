//! `PostgreSQL` persistence for Showtime.
//!
//! [`PostgresStore`] implements the show, booking and catalog store traits
//! from `showtime-core` over one sqlx pool. Seat commits run in a single
//! transaction that locks the show row (`SELECT ... FOR UPDATE`),
//! re-validates the seats, appends them and inserts the booking.
//! `bookings.transaction_id` is `UNIQUE`, so a payment can back at most one
//! booking even if two commits race past the existence check.
//!
//! # Example
//!
//! ```no_run
//! use showtime_postgres::{PoolSettings, PostgresStore};
//!
//! # async fn example() -> showtime_core::Result<()> {
//! let store = PostgresStore::connect("postgres://localhost/showtime", &PoolSettings::default()).await?;
//! store.migrate().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod rows;
mod store;

pub use store::{PoolSettings, PostgresStore};
