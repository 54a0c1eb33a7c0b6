//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
};
use serde::Serialize;

use farmers_place_core::ItemId;

use crate::error::{AppError, Result};
use crate::models::{ItemFilter, ItemWithFarmer};
use crate::services::catalog::CatalogService;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ItemList {
    pub success: bool,
    pub items: Vec<ItemWithFarmer>,
}

#[derive(Debug, Serialize)]
pub struct ItemDetail {
    pub success: bool,
    pub item: ItemWithFarmer,
}

/// GET /items
///
/// Query parameters: `search`, `min_price`, `max_price`, `category`. Blank
/// values are ignored.
pub async fn index(
    State(state): State<AppState>,
    query: std::result::Result<Query<ItemFilter>, QueryRejection>,
) -> Result<Json<ItemList>> {
    let Query(filter) = query.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let items = CatalogService::new(state.pool()).list(&filter).await?;

    Ok(Json(ItemList {
        success: true,
        items,
    }))
}

/// GET /items/{id}
pub async fn show(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<ItemDetail>> {
    let item = CatalogService::new(state.pool())
        .get(ItemId::new(id))
        .await?;

    Ok(Json(ItemDetail {
        success: true,
        item,
    }))
}
