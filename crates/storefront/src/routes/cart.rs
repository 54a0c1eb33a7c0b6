//! Cart and checkout route handlers.
//!
//! Carts belong to the signed-in user and are persisted server-side under
//! `cart_<user id>`. Every cart response carries the full cart view.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use farmers_place_core::ItemId;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::Order;
use crate::services::cart::{CartService, CartView};
use crate::services::checkout::CheckoutService;
use crate::state::AppState;

use super::JsonOrForm;

const fn default_quantity() -> i32 {
    1
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub item_id: ItemId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub item_id: ItemId,
    pub quantity: i32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub item_id: ItemId,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub success: bool,
    pub cart: CartView,
}

impl CartResponse {
    fn ok(cart: &farmers_place_core::Cart) -> Json<Self> {
        Json(Self {
            success: true,
            cart: CartView::from(cart),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub success: bool,
    pub order: Order,
    pub message: &'static str,
}

/// GET /cart
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartResponse>> {
    let cart = CartService::from_pool(state.pool()).get(user.id).await?;
    Ok(CartResponse::ok(&cart))
}

/// POST /cart/add
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    JsonOrForm(form): JsonOrForm<AddToCartForm>,
) -> Result<Json<CartResponse>> {
    let cart = CartService::from_pool(state.pool())
        .add(user.id, form.item_id, form.quantity)
        .await?;

    let item_id = form.item_id.to_string();
    add_breadcrumb("cart", "Added to cart", Some(&[("item_id", item_id.as_str())]));
    Ok(CartResponse::ok(&cart))
}

/// POST /cart/update
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    JsonOrForm(form): JsonOrForm<UpdateCartForm>,
) -> Result<Json<CartResponse>> {
    let cart = CartService::from_pool(state.pool())
        .update_quantity(user.id, form.item_id, form.quantity)
        .await?;
    Ok(CartResponse::ok(&cart))
}

/// POST /cart/remove
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    JsonOrForm(form): JsonOrForm<RemoveFromCartForm>,
) -> Result<Json<CartResponse>> {
    let cart = CartService::from_pool(state.pool())
        .remove(user.id, form.item_id)
        .await?;
    Ok(CartResponse::ok(&cart))
}

/// POST /cart/clear
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartResponse>> {
    let cart = CartService::from_pool(state.pool()).clear(user.id).await?;
    Ok(CartResponse::ok(&cart))
}

/// GET /cart/count
pub async fn count(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CountResponse>> {
    let cart = CartService::from_pool(state.pool()).get(user.id).await?;
    Ok(Json(CountResponse {
        count: cart.count(),
    }))
}

/// POST /checkout
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<(StatusCode, Json<CheckoutResponse>)> {
    add_breadcrumb("checkout", "Checkout started", None);

    let order = CheckoutService::from_pool(state.pool())
        .place_order(user.id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            success: true,
            order,
            message: "Order placed successfully!",
        }),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_add_form_defaults_to_one_unit() {
        let form: AddToCartForm = serde_json::from_str(r#"{"item_id": 3}"#).unwrap();
        assert_eq!(form.item_id, ItemId::new(3));
        assert_eq!(form.quantity, 1);
    }
}
