//! Integration tests for sign-up, sign-in, and sessions.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (fp-cli migrate)
//! - The storefront running (cargo run -p farmers-place-storefront)

#![allow(clippy::unwrap_used)]

use farmers_place_integration_tests::{client, get_json, post_json, sign_up, unique_email, url};
use reqwest::StatusCode;
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_health_endpoints() {
    let resp = client().get(url("/health")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "ok");

    let resp = client().get(url("/health/ready")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_signup_starts_session_and_logout_ends_it() {
    let client = client();

    let (_, body) = get_json(&client, "/auth/session").await;
    assert_eq!(body["user"], Value::Null);

    let user = sign_up(&client, false).await;
    assert_eq!(user["is_farmer"], false);
    assert!(user["username"].as_str().unwrap().starts_with("TestShopper"));

    let (status, body) = get_json(&client, "/auth/session").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user["id"]);

    let (status, _) = post_json(&client, "/auth/logout", &json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get_json(&client, "/auth/session").await;
    assert_eq!(body["user"], Value::Null);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_login_with_form_body() {
    let signup_client = client();
    let email = unique_email("form");

    let resp = signup_client
        .post(url("/auth/signup"))
        .form(&[
            ("email", email.as_str()),
            ("password", "market-day-2026"),
            ("first_name", "Form"),
            ("last_name", "User"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let other = client();
    let resp = other
        .post(url("/auth/login"))
        .form(&[
            ("email", email.to_uppercase().as_str()),
            ("password", "market-day-2026"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["user"]["email"], email);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_duplicate_email_is_conflict() {
    let email = unique_email("dup");
    let form = json!({
        "email": email,
        "password": "market-day-2026",
        "first_name": "Dup",
        "last_name": "Licate",
    });

    let (status, _) = post_json(&client(), "/auth/signup", &form).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = post_json(&client(), "/auth/signup", &form).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_wrong_password_is_unauthorized() {
    let client = client();
    let (status, body) = post_json(
        &client,
        "/auth/login",
        &json!({"email": unique_email("nobody"), "password": "whatever-1234"}),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
#[ignore = "Requires running storefront server and database"]
async fn test_short_password_is_rejected() {
    let (status, body) = post_json(
        &client(),
        "/auth/signup",
        &json!({
            "email": unique_email("weak"),
            "password": "short",
            "first_name": "Weak",
            "last_name": "Password",
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}
