use reqwest::{Client, StatusCode};
use serde_json::json;

mod common;

async fn seed_user(client: &Client, base: &str) -> i64 {
    let response = client
        .post(format!("{base}/users"))
        .json(&json!({ "email": "buyer@example.com", "password": "Secret15" }))
        .send()
        .await
        .expect("Failed to send create user request");
    assert_eq!(response.status(), StatusCode::CREATED);

    response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse create user response JSON")["id"]
        .as_i64()
        .expect("User id missing")
}

async fn seed_product(client: &Client, base: &str, name: &str, price: f64) -> i64 {
    let response = client
        .post(format!("{base}/products"))
        .json(&json!({ "name": name, "price": price, "stock": 50 }))
        .send()
        .await
        .expect("Failed to send create product request");
    assert_eq!(response.status(), StatusCode::CREATED);

    response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse create product response JSON")["id"]
        .as_i64()
        .expect("Product id missing")
}

#[tokio::test]
async fn test_create_order_prices_lines_and_sums_total() {
    let base = common::spawn_app().await;
    let client = Client::new();

    let user_id = seed_user(&client, &base).await;
    let product_id = seed_product(&client, &base, "Baguette", 9.99).await;

    let response = client
        .post(format!("{base}/orders"))
        .json(&json!({
            "user_id": user_id,
            "items": [{ "product_id": product_id, "quantity": 2 }]
        }))
        .send()
        .await
        .expect("Failed to send create order request");

    assert_eq!(response.status(), StatusCode::CREATED);

    let order = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse create order response JSON");

    assert_eq!(order["user_id"].as_i64(), Some(user_id));
    assert_eq!(order["status"].as_str(), Some("pending"));
    let total = order["total"].as_f64().expect("Order total missing");
    assert!((total - 19.98).abs() < 1e-9);

    let items = order["items"].as_array().expect("Order items missing");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["product_id"].as_i64(), Some(product_id));
    assert_eq!(items[0]["name"].as_str(), Some("Baguette"));
    assert_eq!(items[0]["quantity"].as_i64(), Some(2));
    let unit_price = items[0]["unit_price"].as_f64().expect("unit_price missing");
    assert!((unit_price - 9.99).abs() < 1e-9);
}

#[tokio::test]
async fn test_create_order_with_unknown_product_persists_nothing() {
    let base = common::spawn_app().await;
    let client = Client::new();

    let user_id = seed_user(&client, &base).await;
    let product_id = seed_product(&client, &base, "Baguette", 9.99).await;

    let response = client
        .post(format!("{base}/orders"))
        .json(&json!({
            "user_id": user_id,
            "items": [
                { "product_id": product_id, "quantity": 1 },
                { "product_id": 999, "quantity": 1 }
            ]
        }))
        .send()
        .await
        .expect("Failed to send create order request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // No parent row survived the rejected request
    let listing = client
        .get(format!("{base}/orders"))
        .send()
        .await
        .expect("Failed to send list orders request")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse list orders response JSON");
    assert_eq!(listing.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_create_order_requires_user_and_items() {
    let base = common::spawn_app().await;
    let client = Client::new();

    // No user id
    let response = client
        .post(format!("{base}/orders"))
        .json(&json!({ "items": [{ "product_id": 1, "quantity": 1 }] }))
        .send()
        .await
        .expect("Failed to send create order request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Empty item list
    let response = client
        .post(format!("{base}/orders"))
        .json(&json!({ "user_id": 1, "items": [] }))
        .send()
        .await
        .expect("Failed to send create order request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // No item list at all
    let response = client
        .post(format!("{base}/orders"))
        .json(&json!({ "user_id": 1 }))
        .send()
        .await
        .expect("Failed to send create order request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_order_rejects_non_positive_quantity() {
    let base = common::spawn_app().await;
    let client = Client::new();

    let user_id = seed_user(&client, &base).await;
    let product_id = seed_product(&client, &base, "Baguette", 9.99).await;

    let response = client
        .post(format!("{base}/orders"))
        .json(&json!({
            "user_id": user_id,
            "items": [{ "product_id": product_id, "quantity": 0 }]
        }))
        .send()
        .await
        .expect("Failed to send create order request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_order_allows_duplicate_product_lines() {
    let base = common::spawn_app().await;
    let client = Client::new();

    let user_id = seed_user(&client, &base).await;
    let product_id = seed_product(&client, &base, "Croissant", 2.5).await;

    let response = client
        .post(format!("{base}/orders"))
        .json(&json!({
            "user_id": user_id,
            "items": [
                { "product_id": product_id, "quantity": 1 },
                { "product_id": product_id, "quantity": 2 }
            ]
        }))
        .send()
        .await
        .expect("Failed to send create order request");

    assert_eq!(response.status(), StatusCode::CREATED);

    let order = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse create order response JSON");

    let total = order["total"].as_f64().expect("Order total missing");
    assert!((total - 7.5).abs() < 1e-9);
    assert_eq!(order["items"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_order_keeps_unit_price_snapshot_after_catalog_change() {
    let base = common::spawn_app().await;
    let client = Client::new();

    let user_id = seed_user(&client, &base).await;
    let product_id = seed_product(&client, &base, "Baguette", 9.99).await;

    let order = client
        .post(format!("{base}/orders"))
        .json(&json!({
            "user_id": user_id,
            "items": [{ "product_id": product_id, "quantity": 2 }]
        }))
        .send()
        .await
        .expect("Failed to send create order request")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse create order response JSON");
    let order_id = order["id"].as_i64().expect("Order id missing");

    // Reprice the product after the order was placed
    let response = client
        .put(format!("{base}/products/{product_id}"))
        .json(&json!({ "name": "Baguette", "price": 100.0, "stock": 50 }))
        .send()
        .await
        .expect("Failed to send update product request");
    assert_eq!(response.status(), StatusCode::OK);

    let fetched = client
        .get(format!("{base}/orders/{order_id}"))
        .send()
        .await
        .expect("Failed to send get order request")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse get order response JSON");

    let total = fetched["total"].as_f64().expect("Order total missing");
    assert!((total - 19.98).abs() < 1e-9);
    let unit_price = fetched["items"][0]["unit_price"]
        .as_f64()
        .expect("unit_price missing");
    assert!((unit_price - 9.99).abs() < 1e-9);
}

#[tokio::test]
async fn test_update_order_status() {
    let base = common::spawn_app().await;
    let client = Client::new();

    let user_id = seed_user(&client, &base).await;
    let product_id = seed_product(&client, &base, "Baguette", 9.99).await;

    let order = client
        .post(format!("{base}/orders"))
        .json(&json!({
            "user_id": user_id,
            "items": [{ "product_id": product_id, "quantity": 1 }]
        }))
        .send()
        .await
        .expect("Failed to send create order request")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse create order response JSON");
    let order_id = order["id"].as_i64().expect("Order id missing");

    let response = client
        .put(format!("{base}/orders/{order_id}/status"))
        .json(&json!({ "status": "paid" }))
        .send()
        .await
        .expect("Failed to send update status request");

    assert_eq!(response.status(), StatusCode::OK);

    let updated = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse update status response JSON");
    assert_eq!(updated["status"].as_str(), Some("paid"));

    // Missing status aborts the request
    let response = client
        .put(format!("{base}/orders/{order_id}/status"))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to send update status request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Unknown order
    let response = client
        .put(format!("{base}/orders/999/status"))
        .json(&json!({ "status": "paid" }))
        .send()
        .await
        .expect("Failed to send update status request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_missing_order_returns_404() {
    let base = common::spawn_app().await;
    let client = Client::new();

    let response = client
        .get(format!("{base}/orders/999"))
        .send()
        .await
        .expect("Failed to send get order request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_order() {
    let base = common::spawn_app().await;
    let client = Client::new();

    let user_id = seed_user(&client, &base).await;
    let product_id = seed_product(&client, &base, "Baguette", 9.99).await;

    let order = client
        .post(format!("{base}/orders"))
        .json(&json!({
            "user_id": user_id,
            "items": [{ "product_id": product_id, "quantity": 1 }]
        }))
        .send()
        .await
        .expect("Failed to send create order request")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse create order response JSON");
    let order_id = order["id"].as_i64().expect("Order id missing");

    let response = client
        .delete(format!("{base}/orders/{order_id}"))
        .send()
        .await
        .expect("Failed to send delete order request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get(format!("{base}/orders/{order_id}"))
        .send()
        .await
        .expect("Failed to send get order request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = client
        .delete(format!("{base}/orders/{order_id}"))
        .send()
        .await
        .expect("Failed to send delete order request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
