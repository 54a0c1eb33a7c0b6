//! Checkout.
//!
//! An order is placed in a single transaction: the saved cart row is locked
//! and re-read, the cart's item rows are locked in ascending id order, stock
//! is re-validated against the locked values, the order is inserted, the
//! stock adjustments applied and the saved cart deleted. Nothing is written
//! unless every line can be filled, and a cart is consumed by at most one
//! order.

use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use farmers_place_core::{
    Cart, CheckoutError, OrderStatus, UserId, lock_order, order_total, plan_stock_adjustments,
};

use crate::db::{RepositoryError, SavedCartRepository, carts, items, orders};
use crate::models::order::Order;
use crate::services::cart::CartStore;

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum CheckoutServiceError {
    /// The order cannot be filled.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CheckoutServiceError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// Places orders from saved carts.
pub struct CheckoutService<'a, C> {
    pool: &'a PgPool,
    carts: C,
}

impl<'a> CheckoutService<'a, SavedCartRepository<'a>> {
    /// Checkout service backed by the database.
    #[must_use]
    pub const fn from_pool(pool: &'a PgPool) -> Self {
        Self::new(pool, SavedCartRepository::new(pool))
    }
}

impl<'a, C> CheckoutService<'a, C>
where
    C: CartStore + Sync,
{
    /// Create a checkout service over the given pool and cart store.
    #[must_use]
    pub const fn new(pool: &'a PgPool, carts: C) -> Self {
        Self { pool, carts }
    }

    /// Place an order for everything in the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` before touching orders or stock if
    /// the cart is empty, including when a concurrent checkout consumed it
    /// first. Returns `CheckoutError::ItemUnavailable` or
    /// `CheckoutError::InsufficientStock` if any line cannot be filled, in
    /// which case nothing is written.
    #[instrument(skip(self))]
    pub async fn place_order(&self, user_id: UserId) -> Result<Order, CheckoutServiceError> {
        let key = Cart::storage_key(user_id);
        if self.carts.load(&key).await?.is_none_or(|cart| cart.is_empty()) {
            return Err(CheckoutError::EmptyCart.into());
        }

        let mut tx = self.pool.begin().await?;

        let cart = carts::lock(&mut *tx, &key).await?.unwrap_or_default();
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart.into());
        }

        let lines = cart.order_lines();
        let total = order_total(&lines);

        let stock = items::lock_stock(&mut *tx, &lock_order(&lines)).await?;
        let adjustments = plan_stock_adjustments(&lines, &stock)?;

        let order =
            orders::insert(&mut *tx, user_id, &lines, total, OrderStatus::Completed).await?;
        for adjustment in adjustments {
            items::apply_adjustment(&mut *tx, adjustment).await?;
        }
        carts::delete(&mut *tx, &key).await?;

        tx.commit().await?;

        tracing::info!(order_id = %order.id, total = %order.total, "Order placed");
        Ok(order)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sqlx::postgres::PgPoolOptions;

    use super::*;
    use crate::services::cart::fakes::FakeStore;

    /// A pool that fails on first use: nowhere listens on port 1.
    fn unreachable_pool() -> PgPool {
        PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy("postgres://localhost:1/farmers_place_test")
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_cart_fails_before_any_transaction() {
        let pool = unreachable_pool();
        let checkout = CheckoutService::new(&pool, FakeStore::default());

        let err = checkout.place_order(UserId::new(7)).await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutServiceError::Checkout(CheckoutError::EmptyCart)
        ));
        assert_eq!(pool.size(), 0);
    }

    #[tokio::test]
    async fn test_stored_but_emptied_cart_is_empty() {
        let pool = unreachable_pool();
        let store = FakeStore::default();
        store.save("cart_7", &Cart::new()).await.unwrap();
        let checkout = CheckoutService::new(&pool, store);

        let err = checkout.place_order(UserId::new(7)).await.unwrap_err();
        assert_eq!(err.to_string(), CheckoutError::EmptyCart.to_string());
        assert_eq!(pool.size(), 0);
    }
}
