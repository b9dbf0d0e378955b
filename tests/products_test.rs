//! Integration tests for the product catalog endpoints.

mod common;

use axum::http::StatusCode;
use rust_decimal::Decimal;
use storefront::domain::Category;
use uuid::Uuid;

#[tokio::test]
async fn test_list_filters_sorts_and_projects() {
    let (app, store) = common::test_app();
    common::seed_products(
        &store,
        vec![
            common::product("Cheap", Category::Electronics, 5, 1),
            common::product("Mid", Category::Electronics, 10, 1),
            common::product("Dear", Category::Electronics, 20, 1),
        ],
    )
    .await;

    let (status, json) = common::get_json(
        app,
        "/api/v1/products?price%5Bgte%5D=10&sort=price&fields=name,price",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
    assert_eq!(json["results"], 2);
    let products = json["data"]["products"].as_array().unwrap();
    assert_eq!(products[0]["name"], "Mid");
    assert_eq!(products[1]["name"], "Dear");
    // Projection keeps only the requested fields plus the id.
    let keys: Vec<&String> = products[0].as_object().unwrap().keys().collect();
    assert_eq!(keys.len(), 3);
    assert!(products[0].get("id").is_some());
    assert!(products[0].get("stock").is_none());
}

#[tokio::test]
async fn test_unknown_filter_field_is_rejected() {
    let (app, store) = common::test_app();
    common::seed_products(&store, vec![common::product("A", Category::Books, 5, 1)]).await;

    let (status, json) = common::get_json(app, "/api/v1/products?madeUpField=1").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["status"], "fail");
    assert_eq!(json["error"], "invalid_input");
}

#[tokio::test]
async fn test_malformed_filter_value_is_rejected() {
    let (app, store) = common::test_app();
    common::seed_products(&store, vec![common::product("A", Category::Books, 5, 1)]).await;

    let (status, json) = common::get_json(app, "/api/v1/products?price%5Bgte%5D=cheap").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_input");
}

#[tokio::test]
async fn test_list_defaults_to_twelve_newest_first() {
    let (app, store) = common::test_app();
    let mut products = Vec::new();
    for i in 0..20 {
        let mut p = common::product(&format!("p{i}"), Category::Home, 5, 1);
        p.created_at = chrono::Utc::now() - chrono::Duration::minutes(i64::from(i));
        products.push(p);
    }
    common::seed_products(&store, products).await;

    let (status, json) = common::get_json(app, "/api/v1/products").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"], 12);
    // Newest first: p0 has the most recent timestamp.
    assert_eq!(json["data"]["products"][0]["name"], "p0");
}

#[tokio::test]
async fn test_search_facets_and_pagination_block() {
    let (app, store) = common::test_app();
    let mut products = Vec::new();
    for i in 0..15 {
        products.push(common::product(&format!("Phone {i}"), Category::Electronics, 10, 1));
    }
    products.push(common::product("Novel", Category::Books, 10, 1));
    common::seed_products(&store, products).await;

    let (status, json) =
        common::get_json(app, "/api/v1/products/search?category=electronics&limit=10").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"], 10);
    let pagination = &json["data"]["pagination"];
    assert_eq!(pagination["currentPage"], 1);
    assert_eq!(pagination["totalPages"], 2);
    assert_eq!(pagination["totalProducts"], 15);
    assert_eq!(pagination["hasNextPage"], true);
    assert_eq!(pagination["hasPrevPage"], false);
}

#[tokio::test]
async fn test_search_all_sentinel_disables_the_facet() {
    let (app, store) = common::test_app();
    common::seed_products(
        &store,
        vec![
            common::product("A", Category::Electronics, 5, 1),
            common::product("B", Category::Books, 5, 1),
        ],
    )
    .await;

    let (status, json) = common::get_json(app, "/api/v1/products/search?category=all").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"], 2);
}

#[tokio::test]
async fn test_search_price_sort_presets() {
    let (app, store) = common::test_app();
    common::seed_products(
        &store,
        vec![
            common::product("Dear", Category::Home, 30, 1),
            common::product("Cheap", Category::Home, 5, 1),
            common::product("Mid", Category::Home, 10, 1),
        ],
    )
    .await;

    let (status, json) = common::get_json(app, "/api/v1/products/search?sortBy=price-low").await;

    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json["data"]["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Cheap", "Mid", "Dear"]);
}

#[tokio::test]
async fn test_trending_returns_top_rated_first() {
    let (app, store) = common::test_app();
    let mut low = common::product("Low", Category::Sports, 5, 1);
    low.ratings_average = 3.0;
    let mut high = common::product("High", Category::Sports, 5, 1);
    high.ratings_average = 4.9;
    common::seed_products(&store, vec![low, high]).await;

    let (status, json) = common::get_json(app, "/api/v1/products/trending").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["products"][0]["name"], "High");
}

#[tokio::test]
async fn test_product_crud_flow() {
    let (app, _store) = common::test_app();

    // Create.
    let (status, json) = common::post_json(
        app.clone(),
        "/api/v1/products",
        &serde_json::json!({
            "name": "Wireless Mouse",
            "description": "A mouse",
            "price": 25.5,
            "category": "electronics",
            "brand": "Acme",
            "stock": 10
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let product = &json["data"]["product"];
    assert_eq!(product["ratingsQuantity"], 0);
    assert_eq!(product["sold"], 0);
    let id = product["id"].as_str().unwrap().to_string();

    // Read, with the review list embedded.
    let (status, json) = common::get_json(app.clone(), &format!("/api/v1/products/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["product"]["name"], "Wireless Mouse");
    assert_eq!(json["data"]["product"]["reviews"], serde_json::json!([]));

    // Update.
    let (status, json) = common::patch_json(
        app.clone(),
        &format!("/api/v1/products/{id}"),
        &serde_json::json!({"price": 19.99, "featured": true}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        common::decimal(&json["data"]["product"]["price"]),
        Decimal::new(1999, 2)
    );
    assert_eq!(json["data"]["product"]["featured"], true);

    // Delete, then the read 404s.
    let (status, _) = common::delete(app.clone(), &format!("/api/v1/products/{id}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, json) = common::get_json(app, &format!("/api/v1/products/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "No product found with that ID");
}

#[tokio::test]
async fn test_create_product_validation() {
    let (app, _store) = common::test_app();

    let (status, json) = common::post_json(
        app.clone(),
        "/api/v1/products",
        &serde_json::json!({
            "name": "X",
            "description": "too-short name",
            "price": 5,
            "category": "electronics",
            "brand": "Acme",
            "stock": 1
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["message"],
        "A product name must be between 2 and 100 characters"
    );

    let (status, json) = common::post_json(
        app,
        "/api/v1/products",
        &serde_json::json!({
            "name": "Couch",
            "description": "A couch",
            "price": 5,
            "category": "furniture",
            "brand": "Acme",
            "stock": 1
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["message"],
        "Category is either: electronics, clothing, books, home, beauty, sports, other"
    );
}

#[tokio::test]
async fn test_record_view_requires_identity() {
    let (app, store) = common::test_app();
    let p = common::product("A", Category::Beauty, 5, 1);
    let id = p.id;
    common::seed_products(&store, vec![p]).await;

    let (status, json) = common::post_json(
        app.clone(),
        &format!("/api/v1/products/{id}/view"),
        &serde_json::json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "unauthorized");

    let (status, json) =
        common::post_empty_as(app, &format!("/api/v1/products/{id}/view"), Uuid::new_v4()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "success");
}
