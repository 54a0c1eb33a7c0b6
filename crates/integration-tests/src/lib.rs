//! Integration tests for Farmers Place.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate the database and start the storefront
//! cargo run -p farmers-place-cli -- migrate
//! cargo run -p farmers-place-storefront
//!
//! # Run the ignored integration tests against it
//! cargo test -p farmers-place-integration-tests -- --ignored
//! ```
//!
//! `STOREFRONT_BASE_URL` points the tests at another server.
//!
//! Every test creates its own accounts with unique emails, so tests can run
//! in parallel against a shared database.

#![allow(clippy::missing_panics_doc)]

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL of the storefront under test.
#[must_use]
pub fn base_url() -> String {
    std::env::var("STOREFRONT_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// URL for `path` on the storefront under test.
#[must_use]
pub fn url(path: &str) -> String {
    format!("{}{path}", base_url())
}

/// A client with its own cookie jar.
///
/// Each client presents a distinct `X-Forwarded-For` address so the per-IP
/// auth rate limit does not throttle a full test run.
#[must_use]
pub fn client() -> Client {
    let [a, b, c, ..] = Uuid::new_v4().into_bytes();
    let ip = format!("10.{a}.{b}.{c}");

    let mut headers = HeaderMap::new();
    headers.insert(
        "x-forwarded-for",
        HeaderValue::from_str(&ip).expect("valid header value"),
    );

    Client::builder()
        .cookie_store(true)
        .default_headers(headers)
        .build()
        .expect("Failed to create HTTP client")
}

/// A fresh email address.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

/// Sign up a new account on `client` and return the created user.
pub async fn sign_up(client: &Client, is_farmer: bool) -> Value {
    let prefix = if is_farmer { "farmer" } else { "shopper" };
    let resp = client
        .post(url("/auth/signup"))
        .json(&json!({
            "email": unique_email(prefix),
            "password": "market-day-2026",
            "first_name": "Test",
            "last_name": if is_farmer { "Grower" } else { "Shopper" },
            "is_farmer": is_farmer,
        }))
        .send()
        .await
        .expect("Failed to sign up");

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.expect("Failed to parse signup response");
    body["user"].clone()
}

/// List an item as the farmer signed in on `client` and return its id.
pub async fn create_item(client: &Client, name: &str, price: &str, quantity: i32) -> i64 {
    let resp = client
        .post(url("/profile/items"))
        .json(&json!({
            "name": name,
            "price": price,
            "quantity": quantity,
            "category": "Test Produce",
        }))
        .send()
        .await
        .expect("Failed to create item");

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.expect("Failed to parse item response");
    body["item"]["id"].as_i64().expect("item id")
}

/// POST a JSON body and return status and parsed response.
pub async fn post_json(client: &Client, path: &str, body: &Value) -> (StatusCode, Value) {
    let resp = client
        .post(url(path))
        .json(body)
        .send()
        .await
        .expect("Request failed");
    let status = resp.status();
    let body = resp.json().await.unwrap_or(Value::Null);
    (status, body)
}

/// GET a path and return status and parsed response.
pub async fn get_json(client: &Client, path: &str) -> (StatusCode, Value) {
    let resp = client.get(url(path)).send().await.expect("Request failed");
    let status = resp.status();
    let body = resp.json().await.unwrap_or(Value::Null);
    (status, body)
}
