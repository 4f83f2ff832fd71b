//! Showtime booking API server.

use showtime_server::{Config, run, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if present)
    let _ = dotenvy::dotenv();

    telemetry::init_tracing()?;
    info!("Starting Showtime server");

    let config = Config::from_env();
    info!(
        bind = %config.server.bind_address(),
        frontend = %config.server.frontend_url,
        "Configuration loaded"
    );

    run(config).await
}
