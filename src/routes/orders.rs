//! Order endpoints.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::checkout::{place_order, PlaceOrder};
use crate::error::{Error, Result};
use crate::query::Pagination;
use crate::routes::extract::Identity;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_order))
        .route("/my", get(my_orders))
        .route(
            "/:id",
            get(get_order).patch(update_order).delete(delete_order),
        )
}

/// GET /api/v1/orders — newest-first page over all orders.
async fn list_orders(
    State(state): State<AppState>,
    Identity(_user): Identity,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse> {
    let pagination = Pagination::from_params(&params, &state.config.query);
    let orders = state
        .store
        .orders(pagination.skip(), u64::from(pagination.limit))
        .await?;
    Ok(Json(json!({
        "status": "success",
        "results": orders.len(),
        "data": { "orders": orders },
    })))
}

/// POST /api/v1/orders — checkout.
async fn create_order(
    State(state): State<AppState>,
    Identity(user): Identity,
    Json(req): Json<PlaceOrder>,
) -> Result<impl IntoResponse> {
    let order = place_order(state.store.as_ref(), user, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "data": { "order": order } })),
    ))
}

/// GET /api/v1/orders/my — the caller's own orders.
async fn my_orders(
    State(state): State<AppState>,
    Identity(user): Identity,
) -> Result<impl IntoResponse> {
    let orders = state.store.orders_for_user(user).await?;
    Ok(Json(json!({
        "status": "success",
        "results": orders.len(),
        "data": { "orders": orders },
    })))
}

/// GET /api/v1/orders/:id
async fn get_order(
    State(state): State<AppState>,
    Identity(_user): Identity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let order = state
        .store
        .order(id)
        .await?
        .ok_or_else(|| Error::not_found("order"))?;
    Ok(Json(json!({ "status": "success", "data": { "order": order } })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateOrderRequest {
    status: Option<String>,
    is_paid: Option<bool>,
    is_delivered: Option<bool>,
}

/// PATCH /api/v1/orders/:id — status/fulfilment transitions. Line items are
/// immutable snapshots; totals are rederived on every save regardless.
async fn update_order(
    State(state): State<AppState>,
    Identity(_user): Identity,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateOrderRequest>,
) -> Result<impl IntoResponse> {
    let mut order = state
        .store
        .order(id)
        .await?
        .ok_or_else(|| Error::not_found("order"))?;

    if let Some(status) = req.status {
        order.status = status.parse()?;
    }
    if let Some(is_paid) = req.is_paid {
        order.is_paid = is_paid;
        order.paid_at = is_paid.then(Utc::now);
    }
    if let Some(is_delivered) = req.is_delivered {
        order.is_delivered = is_delivered;
        order.delivered_at = is_delivered.then(Utc::now);
    }
    order.recalculate();

    let order = state.store.save_order(order).await?;
    Ok(Json(json!({ "status": "success", "data": { "order": order } })))
}

/// DELETE /api/v1/orders/:id
async fn delete_order(
    State(state): State<AppState>,
    Identity(_user): Identity,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.store.delete_order(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
