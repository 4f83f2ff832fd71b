//! Wiring: stores and adapters into services, services into the router.

use crate::config::{Config, ConfigError};
use crate::pdf::PdfTicketRenderer;
use crate::razorpay::RazorpayGateway;
use crate::smtp::SmtpTicketNotifier;
use crate::telemetry;
use showtime_core::providers::{
    BookingStore, CatalogStore, PaymentGateway, ShowStore, TicketNotifier,
};
use showtime_core::{
    BookingQueries, CatalogGuard, Clock, OrderConfig, OrderInitiator, PaymentVerifier,
    ShowScheduler, SystemClock, VerifierConfig,
};
use showtime_postgres::{PoolSettings, PostgresStore};
use showtime_web::{AppState, AuthContext, JwtTokenVerifier, build_router, cors_layer};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

/// External collaborators of the booking services.
pub struct Adapters {
    /// Payment gateway
    pub gateway: Arc<dyn PaymentGateway>,
    /// Ticket email delivery
    pub notifier: Arc<dyn TicketNotifier>,
    /// Time source
    pub clock: Arc<dyn Clock>,
}

/// Build the handler state over one store implementing every store trait.
///
/// # Errors
///
/// Returns [`ConfigError`] if the ticket offset is out of range.
pub fn build_state<S>(store: &Arc<S>, adapters: Adapters, config: &Config) -> Result<AppState, ConfigError>
where
    S: ShowStore + BookingStore + CatalogStore + 'static,
{
    let shows: Arc<dyn ShowStore> = store.clone();
    let bookings: Arc<dyn BookingStore> = store.clone();
    let catalog: Arc<dyn CatalogStore> = store.clone();
    let Adapters {
        gateway,
        notifier,
        clock,
    } = adapters;
    let local_offset = config.ticket.offset()?;

    let orders = OrderInitiator::new(
        shows.clone(),
        gateway,
        clock.clone(),
        OrderConfig {
            currency: config.payment.currency.clone(),
        },
    );
    let payments = PaymentVerifier::new(
        bookings.clone(),
        catalog.clone(),
        Arc::new(PdfTicketRenderer::default()),
        notifier,
        clock.clone(),
        VerifierConfig {
            secret: config.payment.api_secret.clone(),
            ticket_offset: local_offset,
            ticket_timeout: config.ticket.send_timeout(),
        },
    );

    Ok(AppState {
        orders: Arc::new(orders),
        payments: Arc::new(payments),
        scheduler: Arc::new(ShowScheduler::new(shows.clone(), catalog.clone(), clock.clone())),
        catalog: Arc::new(CatalogGuard::new(shows.clone(), catalog.clone(), clock.clone())),
        queries: Arc::new(
            BookingQueries::new(bookings, shows, catalog, clock.clone())
                .with_local_offset(local_offset),
        ),
        auth: AuthContext {
            tokens: Arc::new(JwtTokenVerifier::new(config.auth.token_key.clone())),
            clock,
        },
    })
}

/// Connect to the database, start the metrics endpoint and serve the API
/// until a shutdown signal arrives.
///
/// # Errors
///
/// Returns an error if any startup step fails or the server stops with an
/// error.
pub async fn run(config: Config) -> anyhow::Result<()> {
    config.validate()?;

    telemetry::install_metrics(&config.server.metrics_address())?;

    info!("Connecting to database...");
    let store = Arc::new(
        PostgresStore::connect(
            &config.postgres.url,
            &PoolSettings {
                max_connections: config.postgres.max_connections,
                min_connections: config.postgres.min_connections,
                connect_timeout: config.postgres.connect_timeout(),
            },
        )
        .await?,
    );
    store.migrate().await?;
    info!("Database ready");

    let adapters = Adapters {
        gateway: Arc::new(RazorpayGateway::new(&config.payment)?),
        notifier: Arc::new(SmtpTicketNotifier::new(&config.smtp)?),
        clock: Arc::new(SystemClock),
    };
    let state = build_state(&store, adapters, &config)?;
    let app = build_router(state, cors_layer(&config.server.frontend_url)?);

    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");

    serve_until(listener, app, shutdown_signal(), config.server.shutdown_timeout()).await
}

/// Serve `app` until `shutdown` resolves, then allow in-flight requests
/// `grace` to finish.
///
/// # Errors
///
/// Returns an error if the server fails before shutdown.
pub async fn serve_until(
    listener: TcpListener,
    app: axum::Router,
    shutdown: impl Future<Output = ()> + Send,
    grace: std::time::Duration,
) -> anyhow::Result<()> {
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .await
    });

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        },
        () = shutdown => {},
    }

    let _ = stop_tx.send(());
    match tokio::time::timeout(grace, server).await {
        Ok(result) => result??,
        Err(_) => warn!(grace_secs = grace.as_secs(), "Shutdown grace period elapsed"),
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            },
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
