//! Integration tests for checkout and order management.

mod common;

use axum::http::StatusCode;
use rust_decimal::Decimal;
use storefront::domain::Category;
use uuid::Uuid;

fn shipping_address() -> serde_json::Value {
    serde_json::json!({
        "address": "1 Main St",
        "city": "Lagos",
        "postalCode": "100001",
        "country": "NG",
        "phone": "+2340000000"
    })
}

#[tokio::test]
async fn test_checkout_reserves_stock_and_derives_totals() {
    let (app, store) = common::test_app();
    let mut p = common::product("Widget", Category::Electronics, 10, 5);
    p.tax_percentage = Decimal::from(10);
    p.shipping_cost = Decimal::from(2);
    let id = p.id;
    common::seed_products(&store, vec![p]).await;

    let (status, json) = common::post_json_as(
        app.clone(),
        "/api/v1/orders",
        Uuid::new_v4(),
        &serde_json::json!({
            "items": [{"product": id, "quantity": 2}],
            "shippingAddress": shipping_address(),
            "paymentMethod": "paypal"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let order = &json["data"]["order"];
    assert_eq!(common::decimal(&order["itemsPrice"]), Decimal::from(20));
    assert_eq!(common::decimal(&order["taxPrice"]), Decimal::from(2));
    assert_eq!(common::decimal(&order["shippingPrice"]), Decimal::from(4));
    assert_eq!(common::decimal(&order["totalPrice"]), Decimal::from(26));
    assert_eq!(order["status"], "Pending");

    let (_, json) = common::get_json(app, &format!("/api/v1/products/{id}")).await;
    assert_eq!(json["data"]["product"]["stock"], 3);
    assert_eq!(json["data"]["product"]["sold"], 2);
}

#[tokio::test]
async fn test_checkout_shortfall_leaves_stock_unchanged() {
    let (app, store) = common::test_app();
    let p = common::product("Widget", Category::Electronics, 10, 3);
    let id = p.id;
    common::seed_products(&store, vec![p]).await;

    let (status, json) = common::post_json_as(
        app.clone(),
        "/api/v1/orders",
        Uuid::new_v4(),
        &serde_json::json!({
            "items": [{"product": id, "quantity": 10}],
            "shippingAddress": shipping_address(),
            "paymentMethod": "paypal"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Product Widget is out of stock");

    let (_, json) = common::get_json(app, &format!("/api/v1/products/{id}")).await;
    assert_eq!(json["data"]["product"]["stock"], 3);
    assert_eq!(json["data"]["product"]["sold"], 0);
}

#[tokio::test]
async fn test_checkout_requires_items_address_and_payment() {
    let (app, store) = common::test_app();
    let p = common::product("Widget", Category::Electronics, 10, 5);
    let id = p.id;
    common::seed_products(&store, vec![p]).await;
    let user = Uuid::new_v4();

    let (status, json) = common::post_json_as(
        app.clone(),
        "/api/v1/orders",
        user,
        &serde_json::json!({"items": []}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Order must have at least one item");

    let (status, json) = common::post_json_as(
        app.clone(),
        "/api/v1/orders",
        user,
        &serde_json::json!({
            "items": [{"product": id, "quantity": 1}],
            "paymentMethod": "paypal"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Order must have a shipping address");

    let (status, json) = common::post_json_as(
        app.clone(),
        "/api/v1/orders",
        user,
        &serde_json::json!({
            "items": [{"product": id, "quantity": 1}],
            "shippingAddress": shipping_address(),
            "paymentMethod": "barter"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["message"],
        "Payment method is either: credit_card, paypal, cash_on_delivery"
    );

    // No identity header at all.
    let (status, _) = common::post_json(
        app,
        "/api/v1/orders",
        &serde_json::json!({
            "items": [{"product": id, "quantity": 1}],
            "shippingAddress": shipping_address(),
            "paymentMethod": "paypal"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_my_orders_only_returns_the_callers() {
    let (app, store) = common::test_app();
    let p = common::product("Widget", Category::Electronics, 10, 10);
    let id = p.id;
    common::seed_products(&store, vec![p]).await;
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    for user in [alice, alice, bob] {
        let (status, _) = common::post_json_as(
            app.clone(),
            "/api/v1/orders",
            user,
            &serde_json::json!({
                "items": [{"product": id, "quantity": 1}],
                "shippingAddress": shipping_address(),
                "paymentMethod": "credit_card"
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, json) = common::get_json_as(app.clone(), "/api/v1/orders/my", alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"], 2);

    let (status, json) = common::get_json_as(app, "/api/v1/orders", bob).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"], 3);
}

#[tokio::test]
async fn test_order_status_updates() {
    let (app, store) = common::test_app();
    let p = common::product("Widget", Category::Electronics, 10, 5);
    let id = p.id;
    common::seed_products(&store, vec![p]).await;
    let user = Uuid::new_v4();

    let (_, json) = common::post_json_as(
        app.clone(),
        "/api/v1/orders",
        user,
        &serde_json::json!({
            "items": [{"product": id, "quantity": 1}],
            "shippingAddress": shipping_address(),
            "paymentMethod": "cash_on_delivery"
        }),
    )
    .await;
    let order_id = json["data"]["order"]["id"].as_str().unwrap().to_string();

    let (status, json) = common::patch_json_as(
        app.clone(),
        &format!("/api/v1/orders/{order_id}"),
        user,
        &serde_json::json!({"status": "Shipped", "isPaid": true}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["order"]["status"], "Shipped");
    assert_eq!(json["data"]["order"]["isPaid"], true);
    assert!(json["data"]["order"]["paidAt"].is_string());

    let (status, json) = common::patch_json_as(
        app.clone(),
        &format!("/api/v1/orders/{order_id}"),
        user,
        &serde_json::json!({"status": "Teleported"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["message"],
        "Status is either: Pending, Processing, Shipped, Delivered, Cancelled"
    );

    let (status, _) =
        common::delete_as(app.clone(), &format!("/api/v1/orders/{order_id}"), user).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, json) =
        common::get_json_as(app, &format!("/api/v1/orders/{order_id}"), user).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["message"], "No order found with that ID");
}
