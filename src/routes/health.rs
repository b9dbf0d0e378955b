//! Liveness endpoint.

use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/health",
        get(|| async { Json(serde_json::json!({"status": "healthy", "service": "storefront"})) }),
    )
}
