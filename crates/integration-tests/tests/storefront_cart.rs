//! Integration tests for the cart and checkout.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (fp-cli migrate)
//! - The storefront running (cargo run -p farmers-place-storefront)

#![allow(clippy::unwrap_used)]

use farmers_place_integration_tests::{client, create_item, get_json, post_json, sign_up};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

/// A farmer with one freshly listed item; returns the item id.
async fn listed_item(price: &str, quantity: i32) -> i64 {
    let farmer = client();
    sign_up(&farmer, true).await;
    create_item(&farmer, "Strawberries", price, quantity).await
}

async fn shopper() -> Client {
    let shopper = client();
    sign_up(&shopper, false).await;
    shopper
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_anonymous_cart_is_unauthorized() {
    let anonymous = client();

    let (status, body) = get_json(&anonymous, "/cart").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "You must be logged in to add items to cart.");

    let (status, _) = post_json(&anonymous, "/cart/add", &json!({"item_id": 1})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = post_json(&anonymous, "/checkout", &json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_cart_walkthrough_against_stock() {
    let item_id = listed_item("4.50", 5).await;
    let shopper = shopper().await;

    let (status, body) = post_json(
        &shopper,
        "/cart/add",
        &json!({"item_id": item_id, "quantity": 3}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart"]["count"], 3);
    assert_eq!(body["cart"]["formatted_total"], "$13.50");

    let (status, body) = post_json(
        &shopper,
        "/cart/add",
        &json!({"item_id": item_id, "quantity": 3}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body["message"],
        "Sorry, only 5 units available. You already have 3 in your cart."
    );

    let (status, body) = post_json(
        &shopper,
        "/cart/update",
        &json!({"item_id": item_id, "quantity": 5}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart"]["items"][0]["quantity"], 5);

    let (_, body) = get_json(&shopper, "/cart/count").await;
    assert_eq!(body["count"], 5);

    let (status, body) = post_json(&shopper, "/cart/clear", &json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart"]["items"], json!([]));

    let (_, body) = get_json(&shopper, "/cart").await;
    assert_eq!(body["cart"]["count"], 0);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_update_to_zero_removes_entry() {
    let item_id = listed_item("2.00", 10).await;
    let shopper = shopper().await;

    post_json(&shopper, "/cart/add", &json!({"item_id": item_id, "quantity": 2})).await;
    let (status, body) = post_json(
        &shopper,
        "/cart/update",
        &json!({"item_id": item_id, "quantity": 0}),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cart"]["count"], 0);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_adding_missing_item_is_not_found() {
    let shopper = shopper().await;
    let (status, body) = post_json(
        &shopper,
        "/cart/add",
        &json!({"item_id": i32::MAX, "quantity": 1}),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Item not found");
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_empty_checkout_is_rejected() {
    let shopper = shopper().await;

    let (status, body) = post_json(&shopper, "/checkout", &json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No items in cart or user not logged in");

    let (_, body) = get_json(&shopper, "/orders").await;
    assert_eq!(body["orders"], json!([]));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_checkout_places_order_and_adjusts_stock() {
    let partial = listed_item("3.00", 4).await;
    let sold_out = listed_item("9.00", 1).await;
    let shopper = shopper().await;

    post_json(&shopper, "/cart/add", &json!({"item_id": partial, "quantity": 3})).await;
    post_json(&shopper, "/cart/add", &json!({"item_id": sold_out, "quantity": 1})).await;

    let (status, body) = post_json(&shopper, "/checkout", &json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Order placed successfully!");
    assert_eq!(body["order"]["status"], "completed");
    assert_eq!(body["order"]["total"], "18.00");
    assert_eq!(body["order"]["items"].as_array().unwrap().len(), 2);

    let (_, item) = get_json(&shopper, &format!("/items/{partial}")).await;
    assert_eq!(item["item"]["quantity"], 1);

    let (status, _) = get_json(&shopper, &format!("/items/{sold_out}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, cart) = get_json(&shopper, "/cart").await;
    assert_eq!(cart["cart"]["count"], 0);

    let (_, orders) = get_json(&shopper, "/orders").await;
    assert_eq!(orders["orders"][0]["id"], body["order"]["id"]);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_checkout_rejects_oversold_cart() {
    let item_id = listed_item("5.00", 2).await;
    let first = shopper().await;
    let second = shopper().await;

    for shopper in [&first, &second] {
        let (status, _) = post_json(
            shopper,
            "/cart/add",
            &json!({"item_id": item_id, "quantity": 2}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = post_json(&first, "/checkout", &json!({})).await;
    assert_eq!(status, StatusCode::CREATED);

    // The item sold out and was removed with the first order.
    let (status, body): (StatusCode, Value) = post_json(&second, "/checkout", &json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Strawberries is no longer available.");

    let (_, cart) = get_json(&second, "/cart").await;
    assert_eq!(cart["cart"]["count"], 2);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_concurrent_checkouts_consume_cart_once() {
    let item_id = listed_item("2.50", 10).await;
    let shopper = shopper().await;

    let (status, _) = post_json(
        &shopper,
        "/cart/add",
        &json!({"item_id": item_id, "quantity": 2}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let body = json!({});
    let (a, b) = tokio::join!(
        post_json(&shopper, "/checkout", &body),
        post_json(&shopper, "/checkout", &body),
    );

    let mut statuses = [a.0, b.0];
    statuses.sort_by_key(StatusCode::as_u16);
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::BAD_REQUEST]);

    let (_, orders) = get_json(&shopper, "/orders").await;
    assert_eq!(orders["orders"].as_array().unwrap().len(), 1);

    let (_, item) = get_json(&shopper, &format!("/items/{item_id}")).await;
    assert_eq!(item["item"]["quantity"], 8);
}
