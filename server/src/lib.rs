//! # Showtime Server
//!
//! Production wiring for the booking API:
//!
//! - [`config`]: environment configuration
//! - [`razorpay`]: [`PaymentGateway`](showtime_core::providers::PaymentGateway) over the Razorpay order API
//! - [`smtp`]: [`TicketNotifier`](showtime_core::providers::TicketNotifier) over SMTP with HTML templates
//! - [`pdf`]: [`TicketRenderer`](showtime_core::providers::TicketRenderer) producing PDF tickets
//! - [`telemetry`]: tracing subscriber and Prometheus exporter
//! - [`app`]: service construction, startup and graceful shutdown

#![forbid(unsafe_code)]

pub mod app;
pub mod config;
pub mod pdf;
pub mod razorpay;
pub mod smtp;
pub mod telemetry;

pub use app::{Adapters, build_state, run, serve_until};
pub use config::{Config, ConfigError};
pub use pdf::PdfTicketRenderer;
