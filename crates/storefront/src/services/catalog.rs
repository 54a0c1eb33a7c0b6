//! Catalog browsing and farmer inventory.

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use farmers_place_core::{ItemId, UserId};

use crate::db::{ItemRepository, RepositoryError, UserRepository};
use crate::models::item::{Item, ItemFilter, ItemInput, ItemWithFarmer};
use crate::models::session::CurrentUser;
use crate::models::user::User;

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Item or farmer does not exist (or is not the caller's).
    #[error("not found")]
    NotFound,

    /// Only farmers may manage inventory.
    #[error("Only farmers can add items")]
    NotAFarmer,

    /// The submitted item failed validation.
    #[error("{0}")]
    Invalid(&'static str),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CatalogError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

/// A farmer and the items they list.
#[derive(Debug, Clone, Serialize)]
pub struct FarmerProfile {
    #[serde(flatten)]
    pub farmer: User,
    pub items: Vec<Item>,
}

/// Catalog service.
pub struct CatalogService<'a> {
    items: ItemRepository<'a>,
    users: UserRepository<'a>,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            items: ItemRepository::new(pool),
            users: UserRepository::new(pool),
        }
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn list(&self, filter: &ItemFilter) -> Result<Vec<ItemWithFarmer>, CatalogError> {
        Ok(self.items.list(filter).await?)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the item does not exist.
    pub async fn get(&self, id: ItemId) -> Result<ItemWithFarmer, CatalogError> {
        self.items.get(id).await?.ok_or(CatalogError::NotFound)
    }

    /// Users flagged as farmers.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn list_farmers(&self) -> Result<Vec<User>, CatalogError> {
        Ok(self.users.list_farmers().await?)
    }

    /// A farmer with their listed items.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the user does not exist or is not
    /// a farmer.
    pub async fn farmer_profile(&self, id: UserId) -> Result<FarmerProfile, CatalogError> {
        let farmer = self
            .users
            .get_by_id(id)
            .await?
            .filter(|u| u.is_farmer)
            .ok_or(CatalogError::NotFound)?;
        let items = self.items.list_by_farmer(farmer.id).await?;
        Ok(FarmerProfile { farmer, items })
    }

    /// List a new item for the current farmer.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotAFarmer` for shoppers and
    /// `CatalogError::Invalid` for input that fails validation.
    #[instrument(skip(self, input), fields(user_id = %user.id))]
    pub async fn create_item(
        &self,
        user: &CurrentUser,
        input: &ItemInput,
    ) -> Result<Item, CatalogError> {
        ensure_farmer(user)?;
        input.validate().map_err(CatalogError::Invalid)?;

        let item = self.items.create(user.id, input).await?;
        tracing::info!(item_id = %item.id, "Item listed");
        Ok(item)
    }

    /// Edit one of the current farmer's items.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the item is not the farmer's.
    #[instrument(skip(self, input), fields(user_id = %user.id))]
    pub async fn update_item(
        &self,
        user: &CurrentUser,
        id: ItemId,
        input: &ItemInput,
    ) -> Result<Item, CatalogError> {
        ensure_farmer(user)?;
        input.validate().map_err(CatalogError::Invalid)?;

        Ok(self.items.update(id, user.id, input).await?)
    }

    /// Delete one of the current farmer's items.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the item is not the farmer's.
    #[instrument(skip(self), fields(user_id = %user.id))]
    pub async fn delete_item(&self, user: &CurrentUser, id: ItemId) -> Result<(), CatalogError> {
        ensure_farmer(user)?;
        self.items.delete(id, user.id).await?;
        tracing::info!(item_id = %id, "Item deleted");
        Ok(())
    }
}

fn ensure_farmer(user: &CurrentUser) -> Result<(), CatalogError> {
    if user.is_farmer {
        Ok(())
    } else {
        Err(CatalogError::NotAFarmer)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use farmers_place_core::Email;
    use rust_decimal::Decimal;
    use sqlx::postgres::PgPoolOptions;

    use super::*;

    fn user(is_farmer: bool) -> CurrentUser {
        CurrentUser {
            id: UserId::new(1),
            email: Email::parse("grower@example.com").unwrap(),
            is_farmer,
        }
    }

    #[test]
    fn test_only_farmers_manage_inventory() {
        assert!(ensure_farmer(&user(true)).is_ok());
        let err = ensure_farmer(&user(false)).unwrap_err();
        assert_eq!(err.to_string(), "Only farmers can add items");
    }

    #[test]
    fn test_repository_not_found_maps_to_not_found() {
        assert!(matches!(
            CatalogError::from(RepositoryError::NotFound),
            CatalogError::NotFound
        ));
        assert!(matches!(
            CatalogError::from(RepositoryError::Conflict("x".to_string())),
            CatalogError::Repository(_)
        ));
    }

    #[tokio::test]
    async fn test_oversized_price_is_invalid_before_insert() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/farmers_place_test")
            .unwrap();
        let input = ItemInput {
            name: "Kale".to_string(),
            description: None,
            price: Decimal::from(1_000_000_000_000_i64),
            quantity: 3,
            category: None,
            image_url: None,
        };

        let err = CatalogService::new(&pool)
            .create_item(&user(true), &input)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Invalid(_)));
        assert_eq!(pool.size(), 0);
    }
}
