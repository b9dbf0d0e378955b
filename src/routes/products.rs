//! Product catalog endpoints.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::checkout::validation_message;
use crate::domain::{Category, Product};
use crate::error::{Error, Result};
use crate::query::{apply_projection, ListQuery};
use crate::recommend::recommendations;
use crate::routes::extract::Identity;
use crate::routes::reviews;
use crate::search::{trending_query, PaginationMeta, SearchParams};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/search", get(search_products))
        .route("/trending", get(trending))
        .route("/recommendations", get(recommend))
        .route(
            "/:id",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .route("/:id/view", post(record_view))
        .route(
            "/:id/reviews",
            get(reviews::list_for_product).post(reviews::create_review),
        )
}

/// GET /api/v1/products — the generic list read. Any non-reserved parameter
/// becomes a filter; `sort`, `fields`, `page` and `limit` shape the response.
async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse> {
    let list = ListQuery::from_params(&params, &state.config.query);
    let products = state.store.find_products(&list.query).await?;

    let mut rows = Vec::with_capacity(products.len());
    for product in &products {
        let mut value = serde_json::to_value(product)?;
        if let Some(fields) = &list.fields {
            apply_projection(&mut value, fields);
        }
        rows.push(value);
    }

    Ok(Json(json!({
        "status": "success",
        "results": rows.len(),
        "data": { "products": rows },
    })))
}

/// GET /api/v1/products/search — faceted search with a pagination block.
async fn search_products(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse> {
    let (query, pagination) = params.build(&state.config.query);
    let products = state.store.find_products(&query).await?;
    let total = state.store.count_products(&query.filter).await?;
    let meta = PaginationMeta::new(pagination, total);

    Ok(Json(json!({
        "status": "success",
        "results": products.len(),
        "data": { "products": products, "pagination": meta },
    })))
}

/// GET /api/v1/products/trending — globally top-rated products.
async fn trending(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let products = state.store.find_products(&trending_query()).await?;
    Ok(Json(json!({
        "status": "success",
        "results": products.len(),
        "data": { "products": products },
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendationParams {
    product_id: Option<Uuid>,
}

/// GET /api/v1/products/recommendations — contextual, then personalized,
/// then top-rated fallback. Works for anonymous callers too.
async fn recommend(
    State(state): State<AppState>,
    Query(params): Query<RecommendationParams>,
    identity: Option<Identity>,
) -> Result<impl IntoResponse> {
    let viewer = identity.map(|Identity(user)| user);
    let products = recommendations(state.store.as_ref(), params.product_id, viewer).await?;
    Ok(Json(json!({
        "status": "success",
        "results": products.len(),
        "data": { "products": products },
    })))
}

/// GET /api/v1/products/:id — the product with its reviews embedded.
async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let product = state
        .store
        .product(id)
        .await?
        .ok_or_else(|| Error::not_found("product"))?;
    let reviews = state.store.reviews_for_product(id).await?;

    let mut value = serde_json::to_value(&product)?;
    value["reviews"] = serde_json::to_value(&reviews)?;
    Ok(Json(json!({
        "status": "success",
        "data": { "product": value },
    })))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
struct CreateProductRequest {
    #[validate(length(min = 2, max = 100, message = "A product name must be between 2 and 100 characters"))]
    name: String,
    #[validate(length(min = 1, max = 2000, message = "A product must have a description"))]
    description: String,
    price: Decimal,
    category: String,
    #[validate(length(min = 1, max = 50, message = "A product must have a brand"))]
    brand: String,
    #[serde(default)]
    images: Vec<String>,
    stock: i32,
    #[serde(default)]
    discount_percentage: Decimal,
    #[serde(default)]
    featured: bool,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    shipping_cost: Decimal,
    #[serde(default)]
    tax_percentage: Decimal,
}

/// POST /api/v1/products
async fn create_product(
    State(state): State<AppState>,
    Json(req): Json<CreateProductRequest>,
) -> Result<impl IntoResponse> {
    req.validate()
        .map_err(|e| Error::invalid(validation_message(&e)))?;
    if req.price < Decimal::ZERO {
        return Err(Error::invalid("Price must be zero or positive"));
    }
    if req.stock < 0 {
        return Err(Error::invalid("Stock must be zero or positive"));
    }
    let category: Category = req.category.parse()?;

    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4(),
        name: req.name,
        description: req.description,
        price: req.price,
        category,
        brand: req.brand,
        images: req.images,
        ratings_average: 0.0,
        ratings_quantity: 0,
        stock: req.stock,
        sold: 0,
        discount_percentage: req.discount_percentage,
        featured: req.featured,
        tags: req.tags,
        shipping_cost: req.shipping_cost,
        tax_percentage: req.tax_percentage,
        created_at: now,
        updated_at: now,
    };
    let product = state.store.insert_product(product).await?;
    tracing::info!(product_id = %product.id, "product created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "data": { "product": product } })),
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProductRequest {
    name: Option<String>,
    description: Option<String>,
    price: Option<Decimal>,
    category: Option<String>,
    brand: Option<String>,
    images: Option<Vec<String>>,
    stock: Option<i32>,
    discount_percentage: Option<Decimal>,
    featured: Option<bool>,
    tags: Option<Vec<String>>,
    shipping_cost: Option<Decimal>,
    tax_percentage: Option<Decimal>,
}

/// PATCH /api/v1/products/:id — partial update. The rating summary is not
/// editable here; it is owned by the rating aggregation path.
async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse> {
    let mut product = state
        .store
        .product(id)
        .await?
        .ok_or_else(|| Error::not_found("product"))?;

    if let Some(name) = req.name {
        product.name = name;
    }
    if let Some(description) = req.description {
        product.description = description;
    }
    if let Some(price) = req.price {
        if price < Decimal::ZERO {
            return Err(Error::invalid("Price must be zero or positive"));
        }
        product.price = price;
    }
    if let Some(category) = req.category {
        product.category = category.parse()?;
    }
    if let Some(brand) = req.brand {
        product.brand = brand;
    }
    if let Some(images) = req.images {
        product.images = images;
    }
    if let Some(stock) = req.stock {
        if stock < 0 {
            return Err(Error::invalid("Stock must be zero or positive"));
        }
        product.stock = stock;
    }
    if let Some(discount) = req.discount_percentage {
        product.discount_percentage = discount;
    }
    if let Some(featured) = req.featured {
        product.featured = featured;
    }
    if let Some(tags) = req.tags {
        product.tags = tags;
    }
    if let Some(shipping_cost) = req.shipping_cost {
        product.shipping_cost = shipping_cost;
    }
    if let Some(tax_percentage) = req.tax_percentage {
        product.tax_percentage = tax_percentage;
    }
    product.updated_at = Utc::now();

    let product = state.store.save_product(product).await?;
    Ok(Json(json!({ "status": "success", "data": { "product": product } })))
}

/// DELETE /api/v1/products/:id
async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    state.store.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/products/:id/view — appends to the caller's view history,
/// which feeds the personalized recommendation tier.
async fn record_view(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Identity(user): Identity,
) -> Result<impl IntoResponse> {
    state
        .store
        .record_view(user, id, Utc::now(), state.config.view_history_cap)
        .await?;
    Ok(Json(json!({ "status": "success" })))
}
