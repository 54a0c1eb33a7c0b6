//! Saved cart repository.
//!
//! Carts are stored as a JSON array of entries under their storage key
//! (`cart_<user id>`). Stock is never read from here.

use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use farmers_place_core::Cart;

use super::RepositoryError;
use crate::services::cart::CartStore;

/// Repository for persisted carts.
pub struct SavedCartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SavedCartRepository<'a> {
    /// Create a new saved cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }
}

impl CartStore for SavedCartRepository<'_> {
    async fn load(&self, key: &str) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_scalar::<_, Json<Cart>>(
            "SELECT entries FROM storefront.saved_cart WHERE storage_key = $1",
        )
        .bind(key)
        .fetch_optional(self.pool)
        .await
        .map_err(decode_error)?;

        Ok(row.map(|Json(cart)| cart))
    }

    async fn save(&self, key: &str, cart: &Cart) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO storefront.saved_cart (storage_key, entries, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (storage_key)
            DO UPDATE SET entries = EXCLUDED.entries, updated_at = now()
            ",
        )
        .bind(key)
        .bind(Json(cart))
        .execute(self.pool)
        .await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM storefront.saved_cart WHERE storage_key = $1")
            .bind(key)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}

fn decode_error(err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::ColumnDecode { source, .. } => {
            RepositoryError::DataCorruption(format!("invalid saved cart: {source}"))
        }
        other => RepositoryError::Database(other),
    }
}

/// Lock the saved cart row and read it.
///
/// A concurrent transaction that deletes the row first leaves this one with
/// `None` once it commits.
///
/// # Errors
///
/// Returns `RepositoryError::DataCorruption` if the stored entries do not
/// decode.
pub async fn lock(conn: &mut PgConnection, key: &str) -> Result<Option<Cart>, RepositoryError> {
    let row = sqlx::query_scalar::<_, Json<Cart>>(
        "SELECT entries FROM storefront.saved_cart WHERE storage_key = $1 FOR UPDATE",
    )
    .bind(key)
    .fetch_optional(conn)
    .await
    .map_err(decode_error)?;

    Ok(row.map(|Json(cart)| cart))
}

/// Delete the saved cart on the given connection.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the statement fails.
pub async fn delete(conn: &mut PgConnection, key: &str) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM storefront.saved_cart WHERE storage_key = $1")
        .bind(key)
        .execute(conn)
        .await?;

    Ok(())
}
