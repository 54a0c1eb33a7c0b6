//! Integration tests for the catalog, farmer inventory, profiles, and feed.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (fp-cli migrate)
//! - The storefront running (cargo run -p farmers-place-storefront)

#![allow(clippy::unwrap_used)]

use farmers_place_integration_tests::{client, create_item, get_json, post_json, sign_up, url};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::{Value, json};
use uuid::Uuid;

/// 1x1 transparent PNG.
const PIXEL_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_catalog_search_and_price_filters() {
    let farmer = client();
    sign_up(&farmer, true).await;

    let tag = Uuid::new_v4().simple().to_string();
    let cheap = create_item(&farmer, &format!("Radish {tag}"), "1.25", 10).await;
    let pricey = create_item(&farmer, &format!("Radish Deluxe {tag}"), "8.00", 3).await;

    let (status, body) = get_json(&farmer, &format!("/items?search=radish%20{tag}")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<i64> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![cheap]);

    let (_, body) = get_json(
        &farmer,
        &format!("/items?search={tag}&min_price=2&max_price=&category=test%20produce"),
    )
    .await;
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], pricey);
    assert_eq!(items[0]["farmer"]["last_name"], "Grower");

    let (status, _) = get_json(&farmer, "/items?min_price=cheap").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_only_owning_farmer_manages_item() {
    let owner = client();
    sign_up(&owner, true).await;
    let item_id = create_item(&owner, "Kale", "3.00", 8).await;

    let shopper = client();
    sign_up(&shopper, false).await;
    let (status, body) = post_json(
        &shopper,
        "/profile/items",
        &json!({"name": "Kale", "price": "1.00", "quantity": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Only farmers can add items");

    let rival = client();
    sign_up(&rival, true).await;
    let resp = rival
        .delete(url(&format!("/profile/items/{item_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = owner
        .put(url(&format!("/profile/items/{item_id}")))
        .json(&json!({"name": "Lacinato Kale", "price": "3.50", "quantity": 6}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["item"]["name"], "Lacinato Kale");

    let (status, body) = post_json(
        &owner,
        "/profile/items",
        &json!({"name": "Kale", "price": "-1.00", "quantity": 1}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Price cannot be negative");

    let resp = owner
        .delete(url(&format!("/profile/items/{item_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_farmer_directory_and_profile() {
    let farmer = client();
    let user = sign_up(&farmer, true).await;
    let item_id = create_item(&farmer, "Garlic", "1.50", 20).await;
    let farmer_id = user["id"].as_i64().unwrap();

    let (_, body) = get_json(&client(), "/farmers").await;
    let listed = body["farmers"]
        .as_array()
        .unwrap()
        .iter()
        .any(|f| f["id"] == farmer_id);
    assert!(listed);

    let (status, body) = get_json(&client(), &format!("/farmers/{farmer_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["farmer"]["items"][0]["id"], item_id);

    let shopper = client();
    let shopper_user = sign_up(&shopper, false).await;
    let (status, _) = get_json(&client(), &format!("/farmers/{}", shopper_user["id"])).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = get_json(&farmer, "/profile").await;
    assert_eq!(body["profile"]["items"][0]["id"], item_id);
    assert!(
        body["profile"]["avatar_url"]
            .as_str()
            .unwrap()
            .starts_with("https://ui-avatars.com/api/?name=Test+Grower")
    );

    let resp = shopper
        .put(url("/profile"))
        .json(&json!({"first_name": "Renamed", "last_name": "Shopper", "phone_num": "555-0100"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["profile"]["first_name"], "Renamed");
    assert!(body["profile"].get("items").is_none());
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_farmer_posts_with_uploaded_image() {
    let farmer = client();
    sign_up(&farmer, true).await;

    let form = Form::new()
        .text("caption", "First strawberries of the season!")
        .text("image_url", "https://example.com/ignored.jpg")
        .part(
            "image_file",
            Part::bytes(PIXEL_PNG.to_vec())
                .file_name("berries.png")
                .mime_str("image/png")
                .unwrap(),
        );

    let resp = farmer
        .post(url("/posts"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.unwrap();

    let image_url = body["post"]["image_url"].as_str().unwrap().to_string();
    assert!(image_url.contains("/storage/farmers-place/post-images/"));
    assert!(image_url.ends_with(".png"));

    let resp = client().get(&image_url).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let (_, feed) = get_json(&client(), "/posts").await;
    let published = feed["posts"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["id"] == body["post"]["id"])
        .unwrap();
    assert_eq!(published["content"], "First strawberries of the season!");
    assert_eq!(published["user"]["last_name"], "Grower");
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_shoppers_cannot_post() {
    let shopper = client();
    sign_up(&shopper, false).await;

    let resp = shopper
        .post(url("/posts"))
        .multipart(Form::new().text("caption", "Hello"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Only farmers can create posts");
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_non_image_upload_is_rejected() {
    let farmer = client();
    sign_up(&farmer, true).await;

    let form = Form::new().text("caption", "Price list").part(
        "image_file",
        Part::bytes(b"not an image".to_vec())
            .file_name("prices.txt")
            .mime_str("text/plain")
            .unwrap(),
    );

    let resp = farmer
        .post(url("/posts"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Only image uploads are allowed");
}
