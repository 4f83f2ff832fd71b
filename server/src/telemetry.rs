//! Logging and metrics setup.
//!
//! ## Counters
//! - `showtime.orders.initiated` - gateway orders created
//! - `showtime.payments.rejected` - callbacks with a bad signature
//! - `showtime.bookings.committed` - bookings stored
//! - `showtime.bookings.conflicts` - commits lost to a concurrent booking
//! - `showtime.tickets.failed` - ticket emails that could not be delivered
//! - `showtime.tickets.deferred` - ticket emails still sending when the response went out
//! - `showtime.postgres.commits` - booking transactions committed
//! - `showtime.http.responses{status}` - responses by status code

use metrics::describe_counter;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,showtime=debug,sqlx=warn";

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(())
}

/// Register descriptions for every counter the service records.
pub fn register_metrics() {
    describe_counter!("showtime.orders.initiated", "Payment orders created at the gateway");
    describe_counter!(
        "showtime.payments.rejected",
        "Payment callbacks rejected for a bad signature"
    );
    describe_counter!("showtime.bookings.committed", "Bookings committed");
    describe_counter!(
        "showtime.bookings.conflicts",
        "Booking commits rejected because a seat was taken"
    );
    describe_counter!("showtime.tickets.failed", "Ticket emails that failed to send");
    describe_counter!(
        "showtime.tickets.deferred",
        "Ticket emails still sending when the booking response was returned"
    );
    describe_counter!("showtime.postgres.commits", "Booking transactions committed");
    describe_counter!("showtime.http.responses", "HTTP responses by status code");
}

/// Start the Prometheus scrape endpoint on `addr` and register metrics.
///
/// Must be called from within the Tokio runtime.
///
/// # Errors
///
/// Returns an error if the address is invalid or a recorder is already
/// installed.
pub fn install_metrics(addr: &str) -> anyhow::Result<()> {
    let addr: SocketAddr = addr.parse()?;
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    register_metrics();
    tracing::info!(%addr, "Metrics available at http://{addr}/metrics");
    Ok(())
}
