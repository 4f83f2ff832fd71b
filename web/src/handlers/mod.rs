//! HTTP request handlers, one module per resource.

pub mod bookings;
pub mod health;
pub mod movies;
pub mod shows;
pub mod theatres;

pub use health::health_check;
