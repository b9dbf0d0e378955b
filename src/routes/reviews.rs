//! Review endpoints.
//!
//! Every write refreshes the owning product's denormalized rating summary
//! before responding, so reads that follow a review mutation always see the
//! recomputed average.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::patch;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::domain::review::{validate_rating, validate_text};
use crate::domain::Review;
use crate::error::{Error, Result};
use crate::routes::extract::Identity;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/:id", patch(update_review).delete(delete_review))
}

/// GET /api/v1/products/:id/reviews
pub async fn list_for_product(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let reviews = state.store.reviews_for_product(product_id).await?;
    Ok(Json(json!({
        "status": "success",
        "results": reviews.len(),
        "data": { "reviews": reviews },
    })))
}

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub rating: i32,
    pub review: String,
}

/// POST /api/v1/products/:id/reviews — one review per (product, user) pair.
pub async fn create_review(
    State(state): State<AppState>,
    Path(product_id): Path<Uuid>,
    Identity(user): Identity,
    Json(req): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse> {
    state
        .store
        .product(product_id)
        .await?
        .ok_or_else(|| Error::not_found("product"))?;
    if state
        .store
        .review_by_product_and_user(product_id, user)
        .await?
        .is_some()
    {
        return Err(Error::DuplicateReview);
    }

    let review = Review::new(product_id, user, req.rating, req.review)?;
    let review = state.store.insert_review(review).await?;
    state
        .store
        .refresh_rating_summary(product_id, state.config.neutral_rating)
        .await?;
    tracing::info!(review_id = %review.id, product_id = %product_id, "review created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "data": { "review": review } })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateReviewRequest {
    pub rating: Option<i32>,
    pub review: Option<String>,
}

/// PATCH /api/v1/reviews/:id
async fn update_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateReviewRequest>,
) -> Result<impl IntoResponse> {
    let mut review = state
        .store
        .review(id)
        .await?
        .ok_or_else(|| Error::not_found("review"))?;

    if let Some(rating) = req.rating {
        validate_rating(rating)?;
        review.rating = rating;
    }
    if let Some(text) = req.review {
        validate_text(&text)?;
        review.review = text;
    }
    review.updated_at = Utc::now();

    let review = state.store.save_review(review).await?;
    state
        .store
        .refresh_rating_summary(review.product, state.config.neutral_rating)
        .await?;
    Ok(Json(json!({ "status": "success", "data": { "review": review } })))
}

/// DELETE /api/v1/reviews/:id
async fn delete_review(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let review = state.store.delete_review(id).await?;
    state
        .store
        .refresh_rating_summary(review.product, state.config.neutral_rating)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
