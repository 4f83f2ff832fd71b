//! Movie endpoints guarded by scheduled shows.

use crate::WebResult;
use crate::extractors::{ApiJson, ApiPath, Authenticated};
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::extract::State;
use serde_json::{Value, json};
use showtime_core::{MovieId, MoviePatch};

/// `PATCH /api/movies/:movie_id`
pub async fn update_movie(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ApiPath(movie_id): ApiPath<MovieId>,
    ApiJson(patch): ApiJson<MoviePatch>,
) -> WebResult<ApiResponse<Value>> {
    let movie = state.catalog.update_movie(&actor, movie_id, patch).await?;
    Ok(ApiResponse::ok(
        format!("{} movie updated successfully!", movie.title),
        json!({ "movieId": movie.id }),
    ))
}

/// `DELETE /api/movies/:movie_id`
pub async fn delete_movie(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ApiPath(movie_id): ApiPath<MovieId>,
) -> WebResult<ApiResponse<Value>> {
    state.catalog.delete_movie(&actor, movie_id).await?;
    Ok(ApiResponse::ok("Movie deleted successfully", json!({})))
}
