//! Profile and order history.

use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use farmers_place_core::UserId;

use crate::db::{ItemRepository, OrderRepository, RepositoryError, UserRepository};
use crate::models::item::Item;
use crate::models::order::Order;
use crate::models::user::{ProfileUpdate, User};

/// Errors from profile operations.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// The user no longer exists.
    #[error("not found")]
    NotFound,

    /// A submitted field failed validation.
    #[error("{0}")]
    Invalid(&'static str),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ProfileError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

/// The signed-in user's profile. Farmers also get their listed items.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    #[serde(flatten)]
    pub user: User,
    pub avatar_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<Item>>,
}

pub struct ProfileService<'a> {
    users: UserRepository<'a>,
    items: ItemRepository<'a>,
    orders: OrderRepository<'a>,
}

impl<'a> ProfileService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            items: ItemRepository::new(pool),
            orders: OrderRepository::new(pool),
        }
    }

    /// # Errors
    ///
    /// Returns `ProfileError::NotFound` if the user no longer exists.
    pub async fn get(&self, user_id: UserId) -> Result<Profile, ProfileError> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or(ProfileError::NotFound)?;

        let items = if user.is_farmer {
            Some(self.items.list_by_farmer(user.id).await?)
        } else {
            None
        };

        Ok(Profile {
            avatar_url: user.avatar_url(),
            user,
            items,
        })
    }

    /// # Errors
    ///
    /// Returns `ProfileError::Invalid` if a name is blank.
    #[instrument(skip(self, update))]
    pub async fn update(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Profile, ProfileError> {
        validate_update(update)?;
        self.users.update_profile(user_id, update).await?;
        tracing::info!("Profile updated");
        self.get(user_id).await
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::Repository` if the query fails.
    pub async fn orders(&self, user_id: UserId) -> Result<Vec<Order>, ProfileError> {
        Ok(self.orders.list_for_user(user_id).await?)
    }
}

fn validate_update(update: &ProfileUpdate) -> Result<(), ProfileError> {
    if update.first_name.trim().is_empty() {
        return Err(ProfileError::Invalid("First name is required"));
    }
    if update.last_name.trim().is_empty() {
        return Err(ProfileError::Invalid("Last name is required"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_required() {
        let mut update = ProfileUpdate {
            first_name: "Ada".to_string(),
            last_name: "Hart".to_string(),
            ..ProfileUpdate::default()
        };
        assert!(validate_update(&update).is_ok());

        update.last_name = " ".to_string();
        assert!(matches!(
            validate_update(&update),
            Err(ProfileError::Invalid("Last name is required"))
        ));
    }
}
