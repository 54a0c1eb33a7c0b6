//! Profile, farmer inventory, and order history handlers.
//!
//! Every handler here requires a signed-in user.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;

use farmers_place_core::ItemId;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::{Item, ItemInput, Order, ProfileUpdate};
use crate::services::catalog::CatalogService;
use crate::services::profile::{Profile, ProfileService};
use crate::state::AppState;

use super::JsonOrForm;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub profile: Profile,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub success: bool,
    pub item: Item,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct OrdersResponse {
    pub success: bool,
    pub orders: Vec<Order>,
}

/// GET /profile
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<ProfileResponse>> {
    let profile = ProfileService::new(state.pool()).get(user.id).await?;
    Ok(Json(ProfileResponse {
        success: true,
        profile,
    }))
}

/// PUT /profile
#[instrument(skip(state, update), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    JsonOrForm(update): JsonOrForm<ProfileUpdate>,
) -> Result<Json<ProfileResponse>> {
    let profile = ProfileService::new(state.pool())
        .update(user.id, &update)
        .await?;
    Ok(Json(ProfileResponse {
        success: true,
        profile,
    }))
}

/// POST /profile/items
pub async fn create_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    JsonOrForm(input): JsonOrForm<ItemInput>,
) -> Result<(StatusCode, Json<ItemResponse>)> {
    let item = CatalogService::new(state.pool())
        .create_item(&user, &input)
        .await?;

    let item_id = item.id.to_string();
    add_breadcrumb("inventory", "Listed item", Some(&[("item_id", item_id.as_str())]));
    Ok((
        StatusCode::CREATED,
        Json(ItemResponse {
            success: true,
            item,
        }),
    ))
}

/// PUT /profile/items/{id}
pub async fn update_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
    JsonOrForm(input): JsonOrForm<ItemInput>,
) -> Result<Json<ItemResponse>> {
    let item = CatalogService::new(state.pool())
        .update_item(&user, ItemId::new(id), &input)
        .await?;
    Ok(Json(ItemResponse {
        success: true,
        item,
    }))
}

/// DELETE /profile/items/{id}
pub async fn delete_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Json<DeletedResponse>> {
    CatalogService::new(state.pool())
        .delete_item(&user, ItemId::new(id))
        .await?;
    Ok(Json(DeletedResponse {
        success: true,
        message: "Item deleted",
    }))
}

/// GET /orders
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<OrdersResponse>> {
    let orders = ProfileService::new(state.pool()).orders(user.id).await?;
    Ok(Json(OrdersResponse {
        success: true,
        orders,
    }))
}
