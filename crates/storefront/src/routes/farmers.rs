//! Farmer directory route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use farmers_place_core::UserId;

use crate::error::{AppError, Result};
use crate::models::User;
use crate::services::catalog::{CatalogError, CatalogService, FarmerProfile};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct FarmerList {
    pub success: bool,
    pub farmers: Vec<User>,
}

#[derive(Debug, Serialize)]
pub struct FarmerDetail {
    pub success: bool,
    pub farmer: FarmerProfile,
}

/// GET /farmers
pub async fn index(State(state): State<AppState>) -> Result<Json<FarmerList>> {
    let farmers = CatalogService::new(state.pool()).list_farmers().await?;
    Ok(Json(FarmerList {
        success: true,
        farmers,
    }))
}

/// GET /farmers/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<FarmerDetail>> {
    let farmer = CatalogService::new(state.pool())
        .farmer_profile(UserId::new(id))
        .await
        .map_err(|e| match e {
            CatalogError::NotFound => AppError::NotFound("Farmer not found".to_string()),
            other => other.into(),
        })?;

    Ok(Json(FarmerDetail {
        success: true,
        farmer,
    }))
}
