//! Order repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use farmers_place_core::{OrderId, OrderLine, OrderStatus, UserId};

use super::RepositoryError;
use crate::models::order::Order;

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    order_date: DateTime<Utc>,
    total: Decimal,
    status: OrderStatus,
    items: Json<Vec<OrderLine>>,
}

impl From<OrderRow> for Order {
    fn from(r: OrderRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            order_date: r.order_date,
            total: r.total,
            status: r.status,
            items: r.items.0,
        }
    }
}

/// Repository for placed orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, order_date, total, status, items
            FROM storefront.order
            WHERE user_id = $1
            ORDER BY order_date DESC, id DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Order::from).collect())
    }
}

/// Insert an order on an open connection (normally a checkout transaction).
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the insert fails.
pub async fn insert(
    conn: &mut PgConnection,
    user_id: UserId,
    lines: &[OrderLine],
    total: Decimal,
    status: OrderStatus,
) -> Result<Order, RepositoryError> {
    let row = sqlx::query_as::<_, OrderRow>(
        r"
        INSERT INTO storefront.order (user_id, order_date, total, status, items)
        VALUES ($1, now(), $2, $3, $4)
        RETURNING id, user_id, order_date, total, status, items
        ",
    )
    .bind(user_id)
    .bind(total)
    .bind(status)
    .bind(Json(lines))
    .fetch_one(conn)
    .await?;

    Ok(row.into())
}
