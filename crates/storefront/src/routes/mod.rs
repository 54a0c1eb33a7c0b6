//! HTTP route handlers for the marketplace API.
//!
//! # Route Structure
//!
//! ```text
//! # Auth (rate limited, except session)
//! POST /auth/signup            - Create an account (form or JSON)
//! POST /auth/login             - Sign in
//! POST /auth/logout            - Sign out
//! GET  /auth/session           - Current user or null
//!
//! # Catalog
//! GET  /items                  - Catalog (search, min_price, max_price, category)
//! GET  /items/{id}             - Item detail
//! GET  /farmers                - Farmer directory
//! GET  /farmers/{id}           - Farmer profile with items
//!
//! # Profile (requires auth)
//! GET  /profile                - My profile
//! PUT  /profile                - Update my profile
//! POST /profile/items          - List a new item (farmers)
//! PUT  /profile/items/{id}     - Edit own item (farmers)
//! DELETE /profile/items/{id}   - Delete own item (farmers)
//! GET  /orders                 - My orders
//!
//! # Cart (requires auth)
//! GET  /cart                   - My cart
//! POST /cart/add               - Add {item_id, quantity}
//! POST /cart/update            - Update {item_id, quantity}
//! POST /cart/remove            - Remove {item_id}
//! POST /cart/clear             - Empty the cart
//! GET  /cart/count             - {count}
//! POST /checkout               - Place an order
//!
//! # Feed
//! GET  /posts                  - Social feed
//! POST /posts                  - Multipart post (farmers)
//! ```

pub mod auth;
pub mod cart;
pub mod farmers;
pub mod items;
pub mod posts;
pub mod profile;

use axum::{
    Form, Json, Router,
    extract::{DefaultBodyLimit, FromRequest, Request},
    http::header::CONTENT_TYPE,
    routing::{get, post, put},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::services::storage::MAX_UPLOAD_BYTES;
use crate::state::AppState;

/// Request body accepted as either JSON or an urlencoded form.
///
/// Rejections become `AppError::BadRequest` so clients always get the JSON
/// error body.
pub struct JsonOrForm<T>(pub T);

impl<T, S> FromRequest<S> for JsonOrForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(value) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(Self(value))
        } else {
            let Json(value) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            Ok(Self(value))
        }
    }
}

/// Create the auth routes router.
///
/// `/session` is polled by clients and sits outside the strict limiter.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .layer(auth_rate_limiter())
        .route("/session", get(auth::session))
}

/// Create the catalog routes router.
pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(items::index))
        .route("/{id}", get(items::show))
}

/// Create the farmer directory router.
pub fn farmer_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(farmers::index))
        .route("/{id}", get(farmers::show))
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::show).put(profile::update))
        .route("/items", post(profile::create_item))
        .route(
            "/items/{id}",
            put(profile::update_item).delete(profile::delete_item),
        )
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/count", get(cart::count))
}

/// Create the feed routes router.
pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(posts::index).post(posts::create))
        // Multipart framing on top of the largest accepted image.
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024))
}

/// Create all routes for the marketplace.
pub fn routes() -> Router<AppState> {
    let shopping = Router::new()
        .nest("/cart", cart_routes())
        .route("/checkout", post(cart::checkout))
        .nest("/posts", post_routes())
        .layer(api_rate_limiter());

    Router::new()
        .nest("/auth", auth_routes())
        .nest("/items", item_routes())
        .nest("/farmers", farmer_routes())
        .nest("/profile", profile_routes())
        .route("/orders", get(profile::orders))
        .merge(shopping)
}
