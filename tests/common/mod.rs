//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use tower::ServiceExt;
use uuid::Uuid;

use storefront::config::{Config, QueryConfig};
use storefront::domain::{Category, Product};
use storefront::routes;
use storefront::state::AppState;
use storefront::store::{MemoryStore, ProductStore};

pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".into(),
        port: 0,
        database_url: String::new(),
        query: QueryConfig::default(),
        neutral_rating: 4.5,
        view_history_cap: 50,
    }
}

/// Build the full app router over a fresh in-memory store. Uses the same
/// route structure as `main.rs`.
pub fn test_app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(store.clone(), Arc::new(test_config()));
    (routes::app(state), store)
}

pub fn product(name: &str, category: Category, price: i64, stock: i32) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4(),
        name: name.into(),
        description: format!("{name} description"),
        price: Decimal::from(price),
        category,
        brand: "Acme".into(),
        images: vec![],
        ratings_average: 0.0,
        ratings_quantity: 0,
        stock,
        sold: 0,
        discount_percentage: Decimal::ZERO,
        featured: false,
        tags: vec![],
        shipping_cost: Decimal::ZERO,
        tax_percentage: Decimal::ZERO,
        created_at: now,
        updated_at: now,
    }
}

pub async fn seed_products(store: &MemoryStore, products: Vec<Product>) {
    for p in products {
        store.insert_product(p).await.unwrap();
    }
}

/// Reads a money field out of a response body regardless of whether the
/// serializer emitted it as a string or a number.
pub fn decimal(value: &serde_json::Value) -> Decimal {
    serde_json::from_value(value.clone()).unwrap()
}

async fn send(
    app: Router,
    method: &str,
    uri: &str,
    user: Option<Uuid>,
    body: Option<&serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, None, None).await
}

pub async fn get_json_as(app: Router, uri: &str, user: Uuid) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, Some(user), None).await
}

pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, None, Some(body)).await
}

pub async fn post_json_as(
    app: Router,
    uri: &str,
    user: Uuid,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, Some(user), Some(body)).await
}

pub async fn post_empty_as(app: Router, uri: &str, user: Uuid) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, Some(user), None).await
}

pub async fn patch_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "PATCH", uri, None, Some(body)).await
}

pub async fn patch_json_as(
    app: Router,
    uri: &str,
    user: Uuid,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "PATCH", uri, Some(user), Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    send(app, "DELETE", uri, None, None).await
}

pub async fn delete_as(app: Router, uri: &str, user: Uuid) -> (StatusCode, serde_json::Value) {
    send(app, "DELETE", uri, Some(user), None).await
}
