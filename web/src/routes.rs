//! Router assembly.

use crate::error::AppError;
use crate::handlers::{bookings, health_check, movies, shows, theatres};
use crate::middleware::correlation_id;
use crate::state::AppState;
use axum::{
    Router,
    http::{
        HeaderName, HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware::from_fn,
    routing::{delete, get, patch, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// CORS policy admitting the frontend origin.
///
/// # Errors
///
/// Returns an error if `frontend_url` is not a valid header value.
pub fn cors_layer(frontend_url: &str) -> anyhow::Result<CorsLayer> {
    let origin = HeaderValue::from_str(frontend_url)?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-correlation-id"),
        ]))
}

/// Build the complete router.
///
/// Everything under `/api` resolves the caller from a bearer token.
/// Unknown routes get a 404 in the API envelope.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let api_routes = Router::new()
        // Bookings
        .route("/bookings", get(bookings::list_bookings))
        .route("/bookings/payment", post(bookings::create_payment))
        .route("/bookings/verify-payment", post(bookings::verify_payment))
        // Shows
        .route("/shows", post(shows::create_show))
        .route("/shows/show/:show_id", get(shows::get_show))
        .route("/shows/theatre/:theatre_id", get(shows::theatre_shows))
        .route(
            "/shows/movie/:movie_id/:date/:language",
            get(shows::movie_shows),
        )
        .route(
            "/shows/:show_id",
            patch(shows::update_show).delete(shows::delete_show),
        )
        // Catalog
        .route(
            "/movies/:movie_id",
            patch(movies::update_movie).delete(movies::delete_movie),
        )
        .route("/theatres/:theatre_id", delete(theatres::delete_theatre));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes)
        .fallback(|| async { AppError::route_not_found() })
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(from_fn(correlation_id))
        .with_state(state)
}
