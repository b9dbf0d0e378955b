//! HTTP surface.
//!
//! `app` assembles the full router over an [`AppState`]; the binary and the
//! integration tests both go through it, so they exercise identical routing.

pub mod extract;
pub mod health;
pub mod orders;
pub mod products;
pub mod reviews;

use axum::Router;

use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/api/v1/products", products::router())
        .nest("/api/v1/reviews", reviews::router())
        .nest("/api/v1/orders", orders::router())
        .with_state(state)
}
