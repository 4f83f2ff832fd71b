//! Liveness endpoint for load balancers.

use crate::response::ApiResponse;
use serde_json::{Value, json};

/// Returns 200 while the process is serving requests.
///
/// Does not check the database.
///
/// ```text
/// GET /health
/// ```
#[allow(clippy::unused_async)]
pub async fn health_check() -> ApiResponse<Value> {
    ApiResponse::ok("Server is up", json!({ "status": "ok" }))
}
