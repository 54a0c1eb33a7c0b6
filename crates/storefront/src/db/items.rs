//! Catalog item repository.
//!
//! Besides the pool-backed catalog queries, this module holds the row-locking
//! helpers checkout runs inside its transaction.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use farmers_place_core::{ItemId, StockAdjustment, UserId};

use super::{RepositoryError, escape_like};
use crate::models::item::{Item, ItemFilter, ItemInput, ItemWithFarmer};
use crate::models::user::FarmerName;
use crate::services::cart::StockLookup;

const ITEM_COLUMNS: &str = "i.id, i.name, i.description, i.price, i.quantity, i.category, \
                            i.image_url, i.farmer_id, i.created_at";

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: ItemId,
    name: String,
    description: Option<String>,
    price: Decimal,
    quantity: i32,
    category: Option<String>,
    image_url: Option<String>,
    farmer_id: UserId,
    created_at: DateTime<Utc>,
}

impl From<ItemRow> for Item {
    fn from(r: ItemRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            price: r.price,
            quantity: r.quantity,
            category: r.category,
            image_url: r.image_url,
            farmer_id: r.farmer_id,
            created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ItemWithFarmerRow {
    #[sqlx(flatten)]
    item: ItemRow,
    farmer_first_name: Option<String>,
    farmer_last_name: Option<String>,
}

impl From<ItemWithFarmerRow> for ItemWithFarmer {
    fn from(r: ItemWithFarmerRow) -> Self {
        let farmer_id = r.item.farmer_id;
        let farmer = match (r.farmer_first_name, r.farmer_last_name) {
            (Some(first_name), Some(last_name)) => Some(FarmerName {
                id: farmer_id,
                first_name,
                last_name,
            }),
            _ => None,
        };

        Self {
            item: r.item.into(),
            farmer,
        }
    }
}

fn select_with_farmer() -> QueryBuilder<'static, Postgres> {
    QueryBuilder::new(format!(
        "SELECT {ITEM_COLUMNS}, u.first_name AS farmer_first_name, \
         u.last_name AS farmer_last_name \
         FROM storefront.item i \
         LEFT JOIN storefront.user u ON u.id = i.farmer_id \
         WHERE TRUE"
    ))
}

/// Repository for catalog items.
pub struct ItemRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ItemRepository<'a> {
    /// Create a new item repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List catalog items matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &ItemFilter) -> Result<Vec<ItemWithFarmer>, RepositoryError> {
        let mut query = select_with_farmer();

        if let Some(term) = filter.search_term() {
            query
                .push(" AND i.name ILIKE ")
                .push_bind(format!("%{}%", escape_like(term)));
        }
        if let Some(min) = filter.min_price {
            query.push(" AND i.price >= ").push_bind(min);
        }
        if let Some(max) = filter.max_price {
            query.push(" AND i.price <= ").push_bind(max);
        }
        if let Some(category) = filter.category_name() {
            query
                .push(" AND lower(i.category) = lower(")
                .push_bind(category.to_owned())
                .push(")");
        }
        query.push(" ORDER BY i.created_at DESC, i.id DESC");

        let rows = query
            .build_query_as::<ItemWithFarmerRow>()
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(ItemWithFarmer::from).collect())
    }

    /// Get a single item with its farmer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ItemId) -> Result<Option<ItemWithFarmer>, RepositoryError> {
        let mut query = select_with_farmer();
        query.push(" AND i.id = ").push_bind(id);

        let row = query
            .build_query_as::<ItemWithFarmerRow>()
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(ItemWithFarmer::from))
    }

    /// Items listed by one farmer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_farmer(&self, farmer_id: UserId) -> Result<Vec<Item>, RepositoryError> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            r"
            SELECT {ITEM_COLUMNS} FROM storefront.item i
            WHERE i.farmer_id = $1
            ORDER BY i.created_at DESC, i.id DESC
            "
        ))
        .bind(farmer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Item::from).collect())
    }

    /// Current stock of an item, `None` if it no longer exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn quantity(&self, id: ItemId) -> Result<Option<i32>, RepositoryError> {
        let quantity = sqlx::query_scalar::<_, i32>(
            "SELECT quantity FROM storefront.item WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(quantity)
    }

    /// List a new item for `farmer_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        farmer_id: UserId,
        input: &ItemInput,
    ) -> Result<Item, RepositoryError> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r"
            INSERT INTO storefront.item AS i
                (name, description, price, quantity, category, image_url, farmer_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(input.name.trim())
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.quantity)
        .bind(input.category.as_deref())
        .bind(input.image_url.as_deref())
        .bind(farmer_id)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Replace the fields of an item owned by `farmer_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such item belongs to the farmer.
    pub async fn update(
        &self,
        id: ItemId,
        farmer_id: UserId,
        input: &ItemInput,
    ) -> Result<Item, RepositoryError> {
        let row = sqlx::query_as::<_, ItemRow>(&format!(
            r"
            UPDATE storefront.item AS i
            SET name = $3, description = $4, price = $5, quantity = $6,
                category = $7, image_url = $8
            WHERE i.id = $1 AND i.farmer_id = $2
            RETURNING {ITEM_COLUMNS}
            "
        ))
        .bind(id)
        .bind(farmer_id)
        .bind(input.name.trim())
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.quantity)
        .bind(input.category.as_deref())
        .bind(input.image_url.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Delete an item owned by `farmer_id`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such item belongs to the farmer.
    pub async fn delete(&self, id: ItemId, farmer_id: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.item WHERE id = $1 AND farmer_id = $2")
            .bind(id)
            .bind(farmer_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

impl StockLookup for ItemRepository<'_> {
    async fn find_item(&self, id: ItemId) -> Result<Option<Item>, RepositoryError> {
        Ok(self.get(id).await?.map(|found| found.item))
    }

    async fn available_quantity(&self, id: ItemId) -> Result<Option<i32>, RepositoryError> {
        self.quantity(id).await
    }
}

/// Lock the rows of `ids` and read their stock.
///
/// Rows are locked in ascending id order. Items that no longer exist are
/// absent from the result.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_stock(
    conn: &mut PgConnection,
    ids: &[ItemId],
) -> Result<HashMap<ItemId, i32>, RepositoryError> {
    let raw: Vec<i32> = ids.iter().map(ItemId::as_i32).collect();

    let rows = sqlx::query_as::<_, (ItemId, i32)>(
        r"
        SELECT id, quantity FROM storefront.item
        WHERE id = ANY($1)
        ORDER BY id
        FOR UPDATE
        ",
    )
    .bind(raw)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().collect())
}

/// Apply one planned stock adjustment.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the statement fails.
pub async fn apply_adjustment(
    conn: &mut PgConnection,
    adjustment: StockAdjustment,
) -> Result<(), RepositoryError> {
    match adjustment {
        StockAdjustment::SetQuantity { item_id, quantity } => {
            sqlx::query("UPDATE storefront.item SET quantity = $2 WHERE id = $1")
                .bind(item_id)
                .bind(quantity)
                .execute(conn)
                .await?;
        }
        StockAdjustment::Remove { item_id } => {
            sqlx::query("DELETE FROM storefront.item WHERE id = $1")
                .bind(item_id)
                .execute(conn)
                .await?;
        }
    }
    Ok(())
}
