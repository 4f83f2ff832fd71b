//! Show endpoints.
//!
//! - `GET /api/shows/show/:show_id`
//! - `GET /api/shows/movie/:movie_id/:date/:language`
//! - `GET /api/shows/theatre/:theatre_id?page&limit`
//! - `POST /api/shows`
//! - `PATCH /api/shows/:show_id`
//! - `DELETE /api/shows/:show_id`

use crate::WebResult;
use crate::extractors::{ApiJson, ApiPath, ApiQuery, Authenticated};
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::extract::State;
use chrono::NaiveDate;
use serde_json::{Value, json};
use showtime_core::{MovieId, PageParams, Pagination, ShowDraft, ShowId, TheatreId};

/// One show with its movie and theatre.
pub async fn get_show(
    State(state): State<AppState>,
    Authenticated(_actor): Authenticated,
    ApiPath(show_id): ApiPath<ShowId>,
) -> WebResult<ApiResponse<Value>> {
    let show = state.queries.show(show_id).await?;
    Ok(ApiResponse::ok("Show fetched successfully!", json!({ "show": show })))
}

/// A movie's shows in one language on one day, grouped by theatre.
pub async fn movie_shows(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ApiPath((movie_id, date, language)): ApiPath<(MovieId, NaiveDate, String)>,
) -> WebResult<ApiResponse<Value>> {
    let listing = state
        .queries
        .movie_shows(&actor, movie_id, date, &language)
        .await?;

    Ok(ApiResponse::ok(
        "Fetched shows successfully!",
        json!({ "movie": listing.movie, "shows": listing.theatres }),
    ))
}

/// A page of a theatre's shows, ordered by start.
pub async fn theatre_shows(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ApiPath(theatre_id): ApiPath<TheatreId>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> WebResult<ApiResponse<Value>> {
    let pagination = Pagination::try_from(params)?;
    let page = state
        .queries
        .theatre_shows(&actor, theatre_id, pagination)
        .await?;

    Ok(ApiResponse::ok(
        "Fetched shows successfully!",
        json!({
            "shows": page.items,
            "total": page.total,
            "totalPages": page.total_pages,
            "page": page.page,
        }),
    ))
}

/// Schedule a show.
pub async fn create_show(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ApiJson(draft): ApiJson<ShowDraft>,
) -> WebResult<ApiResponse<Value>> {
    let show = state.scheduler.create(&actor, draft).await?;
    Ok(ApiResponse::created(
        "Show created successfully!",
        json!({ "showId": show.id }),
    ))
}

/// Replace the details of a show that has no bookings.
pub async fn update_show(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ApiPath(show_id): ApiPath<ShowId>,
    ApiJson(draft): ApiJson<ShowDraft>,
) -> WebResult<ApiResponse<Value>> {
    let show = state.scheduler.update(&actor, show_id, draft).await?;
    Ok(ApiResponse::ok(
        "Show updated successfully!",
        json!({ "showId": show.id }),
    ))
}

/// Remove a show.
pub async fn delete_show(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ApiPath(show_id): ApiPath<ShowId>,
) -> WebResult<ApiResponse<Value>> {
    state.scheduler.delete(&actor, show_id).await?;
    Ok(ApiResponse::ok("Show deleted successfully!", json!({})))
}
