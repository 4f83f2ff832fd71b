//! Theatre endpoints.

use crate::WebResult;
use crate::extractors::{ApiPath, Authenticated};
use crate::response::ApiResponse;
use crate::state::AppState;
use axum::extract::State;
use serde_json::{Value, json};
use showtime_core::TheatreId;

/// `DELETE /api/theatres/:theatre_id`
pub async fn delete_theatre(
    State(state): State<AppState>,
    Authenticated(actor): Authenticated,
    ApiPath(theatre_id): ApiPath<TheatreId>,
) -> WebResult<ApiResponse<Value>> {
    state.catalog.delete_theatre(&actor, theatre_id).await?;
    Ok(ApiResponse::ok("Theatre deleted successfully!", json!({})))
}
