//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding to the client. All route handlers return
//! `Result<T, AppError>`; every error body is
//! `{"success": false, "message": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use farmers_place_core::{CartError, CheckoutError};

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::cart::CartServiceError;
use crate::services::catalog::CatalogError;
use crate::services::checkout::CheckoutServiceError;
use crate::services::feed::FeedError;
use crate::services::profile::ProfileError;
use crate::services::storage::StorageError;

const INTERNAL: &str = "Internal server error";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartServiceError),

    /// Checkout failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutServiceError),

    /// Catalog or inventory operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Profile operation failed.
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    /// Feed operation failed.
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    /// Upload storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but not allowed to do this.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Status code and client-facing message.
    ///
    /// Internal error details are never exposed to clients.
    fn status_and_message(&self) -> (StatusCode, String) {
        let internal = || (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string());

        match self {
            Self::Database(_) | Self::Internal(_) => internal(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::UserNotFound => {
                    (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
                }
                AuthError::UserAlreadyExists => (
                    StatusCode::CONFLICT,
                    "An account with this email already exists".to_string(),
                ),
                AuthError::WeakPassword(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                AuthError::InvalidEmail(_) => {
                    (StatusCode::BAD_REQUEST, "Invalid email address".to_string())
                }
                AuthError::MissingField(_) => (StatusCode::BAD_REQUEST, err.to_string()),
                AuthError::Repository(_) | AuthError::PasswordHash => internal(),
            },
            Self::Cart(err) => match err {
                CartServiceError::Cart(
                    cart_err @ (CartError::InsufficientStock { .. }
                    | CartError::ExceedsStockWithCart { .. }),
                ) => (StatusCode::CONFLICT, cart_err.to_string()),
                CartServiceError::Cart(cart_err @ CartError::InvalidQuantity(_)) => {
                    (StatusCode::BAD_REQUEST, cart_err.to_string())
                }
                CartServiceError::ItemNotFound(_) | CartServiceError::InventoryUnavailable(_) => {
                    (StatusCode::NOT_FOUND, err.to_string())
                }
                CartServiceError::Repository(_) => internal(),
            },
            Self::Checkout(err) => match err {
                CheckoutServiceError::Checkout(
                    CheckoutError::EmptyCart | CheckoutError::InvalidQuantity { .. },
                ) => (StatusCode::BAD_REQUEST, err.to_string()),
                CheckoutServiceError::Checkout(
                    CheckoutError::ItemUnavailable { .. } | CheckoutError::InsufficientStock { .. },
                ) => (StatusCode::CONFLICT, err.to_string()),
                CheckoutServiceError::Repository(_) => internal(),
            },
            Self::Catalog(err) => match err {
                CatalogError::NotFound => (StatusCode::NOT_FOUND, "Item not found".to_string()),
                CatalogError::NotAFarmer => (StatusCode::FORBIDDEN, err.to_string()),
                CatalogError::Invalid(msg) => (StatusCode::BAD_REQUEST, (*msg).to_string()),
                CatalogError::Repository(_) => internal(),
            },
            Self::Profile(err) => match err {
                ProfileError::NotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
                ProfileError::Invalid(msg) => (StatusCode::BAD_REQUEST, (*msg).to_string()),
                ProfileError::Repository(_) => internal(),
            },
            Self::Feed(err) => match err {
                FeedError::NotAFarmer => (StatusCode::FORBIDDEN, err.to_string()),
                FeedError::MissingCaption => (StatusCode::BAD_REQUEST, err.to_string()),
                FeedError::Storage(storage) => storage_status(storage),
                FeedError::Repository(_) => internal(),
            },
            Self::Storage(err) => storage_status(err),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many requests, please slow down".to_string(),
            ),
        }
    }
}

fn storage_status(err: &StorageError) -> (StatusCode, String) {
    match err {
        StorageError::UnsupportedType | StorageError::Empty => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        StorageError::TooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, err.to_string()),
        StorageError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string()),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        let body = Json(json!({ "success": false, "message": message }));
        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("navigation", "Viewed product page", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use farmers_place_core::ItemId;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    async fn body_json(err: AppError) -> serde_json::Value {
        let response = err.into_response();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("item-123".to_string());
        assert_eq!(err.to_string(), "Not found: item-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("test".to_string())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_cart_and_checkout_status_codes() {
        let stock = CartServiceError::Cart(CartError::ExceedsStockWithCart {
            available: 5,
            in_cart: 3,
        });
        assert_eq!(get_status(stock.into()), StatusCode::CONFLICT);

        let fresh = CartServiceError::Cart(CartError::InsufficientStock { available: 2 });
        assert_eq!(get_status(fresh.into()), StatusCode::CONFLICT);

        let quantity = CartServiceError::Cart(CartError::InvalidQuantity(0));
        assert_eq!(get_status(quantity.into()), StatusCode::BAD_REQUEST);

        let missing = CartServiceError::ItemNotFound(ItemId::new(4));
        assert_eq!(get_status(missing.into()), StatusCode::NOT_FOUND);

        let empty = CheckoutServiceError::Checkout(CheckoutError::EmptyCart);
        assert_eq!(get_status(empty.into()), StatusCode::BAD_REQUEST);

        let oversold = CheckoutServiceError::Checkout(CheckoutError::InsufficientStock {
            item_id: ItemId::new(1),
            name: "Honey".to_string(),
            available: 1,
            requested: 2,
        });
        assert_eq!(get_status(oversold.into()), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_error_body_carries_cart_message() {
        let err: AppError = CartServiceError::Cart(CartError::ExceedsStockWithCart {
            available: 5,
            in_cart: 3,
        })
        .into();

        let body = body_json(err).await;
        assert_eq!(body["success"], false);
        assert_eq!(
            body["message"],
            "Sorry, only 5 units available. You already have 3 in your cart."
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let body = body_json(AppError::Internal("pool exhausted".to_string())).await;
        assert_eq!(body["message"], "Internal server error");
    }

    #[test]
    fn test_forbidden_for_shoppers() {
        assert_eq!(
            get_status(CatalogError::NotAFarmer.into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(get_status(FeedError::NotAFarmer.into()), StatusCode::FORBIDDEN);
    }
}
