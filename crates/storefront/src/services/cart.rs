//! Cart state holder.
//!
//! [`CartService`] applies the rules of [`farmers_place_core::Cart`] against
//! live stock and keeps the persisted copy in step: after every mutation the
//! cart is saved when it has entries and its record deleted when it is empty.
//!
//! Stock and persistence sit behind the [`StockLookup`] and [`CartStore`]
//! traits, implemented by the item and saved-cart repositories.

use std::future::Future;

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use farmers_place_core::{Cart, CartEntry, CartError, ItemId, UserId, format_money};

use crate::db::{ItemRepository, RepositoryError, SavedCartRepository};
use crate::models::item::Item;

/// Read access to catalog stock.
pub trait StockLookup {
    /// The catalog item, `None` if it no longer exists.
    fn find_item(
        &self,
        id: ItemId,
    ) -> impl Future<Output = Result<Option<Item>, RepositoryError>> + Send;

    /// Units currently in stock, `None` if the item no longer exists.
    fn available_quantity(
        &self,
        id: ItemId,
    ) -> impl Future<Output = Result<Option<i32>, RepositoryError>> + Send;
}

/// Persistence for carts, keyed by [`Cart::storage_key`].
pub trait CartStore {
    fn load(&self, key: &str)
    -> impl Future<Output = Result<Option<Cart>, RepositoryError>> + Send;

    fn save(
        &self,
        key: &str,
        cart: &Cart,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartServiceError {
    /// The cart rules rejected the change.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The item to add does not exist.
    #[error("Item not found")]
    ItemNotFound(ItemId),

    /// Stock could not be read for an item being updated.
    #[error("Failed to check inventory")]
    InventoryUnavailable(ItemId),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Cart as returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartEntry>,
    pub total: Decimal,
    pub formatted_total: String,
    pub count: i64,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        let total = cart.total();
        Self {
            items: cart.entries().to_vec(),
            total,
            formatted_total: format_money(total),
            count: cart.count(),
        }
    }
}

/// Cart operations for one user at a time.
pub struct CartService<S, C> {
    stock: S,
    store: C,
}

impl<'a> CartService<ItemRepository<'a>, SavedCartRepository<'a>> {
    /// Cart service backed by the database.
    #[must_use]
    pub const fn from_pool(pool: &'a PgPool) -> Self {
        Self::new(ItemRepository::new(pool), SavedCartRepository::new(pool))
    }
}

impl<S, C> CartService<S, C>
where
    S: StockLookup + Sync,
    C: CartStore + Sync,
{
    /// Create a cart service over the given stock and store.
    #[must_use]
    pub const fn new(stock: S, store: C) -> Self {
        Self { stock, store }
    }

    /// The user's persisted cart, empty if none is stored.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::Repository` if the cart cannot be loaded.
    pub async fn get(&self, user_id: UserId) -> Result<Cart, CartServiceError> {
        let cart = self
            .store
            .load(&Cart::storage_key(user_id))
            .await?
            .unwrap_or_default();
        Ok(cart)
    }

    /// Add `quantity` units of an item.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::ItemNotFound` if the item is gone and
    /// `CartServiceError::Cart` if the quantity or stock check fails.
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        user_id: UserId,
        item_id: ItemId,
        quantity: i32,
    ) -> Result<Cart, CartServiceError> {
        let item = self
            .stock
            .find_item(item_id)
            .await?
            .ok_or(CartServiceError::ItemNotFound(item_id))?;

        let mut cart = self.get(user_id).await?;
        cart.add(item.to_cart_item(), quantity, item.quantity)?;
        self.persist(user_id, &cart).await?;

        tracing::debug!(count = cart.count(), "Item added to cart");
        Ok(cart)
    }

    /// Set the quantity of an item. Zero or less removes it.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::InventoryUnavailable` if the item is gone
    /// and `CartServiceError::Cart` if the new quantity exceeds stock.
    #[instrument(skip(self))]
    pub async fn update_quantity(
        &self,
        user_id: UserId,
        item_id: ItemId,
        quantity: i32,
    ) -> Result<Cart, CartServiceError> {
        let available = self
            .stock
            .available_quantity(item_id)
            .await?
            .ok_or(CartServiceError::InventoryUnavailable(item_id))?;

        let mut cart = self.get(user_id).await?;
        cart.update_quantity(item_id, quantity, available)?;
        self.persist(user_id, &cart).await?;

        Ok(cart)
    }

    /// Remove an item from the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::Repository` if the cart cannot be stored.
    #[instrument(skip(self))]
    pub async fn remove(&self, user_id: UserId, item_id: ItemId) -> Result<Cart, CartServiceError> {
        let mut cart = self.get(user_id).await?;
        cart.remove(item_id);
        self.persist(user_id, &cart).await?;
        Ok(cart)
    }

    /// Empty the cart and delete its persisted record.
    ///
    /// # Errors
    ///
    /// Returns `CartServiceError::Repository` if the record cannot be deleted.
    #[instrument(skip(self))]
    pub async fn clear(&self, user_id: UserId) -> Result<Cart, CartServiceError> {
        self.store.remove(&Cart::storage_key(user_id)).await?;
        Ok(Cart::new())
    }

    async fn persist(&self, user_id: UserId, cart: &Cart) -> Result<(), RepositoryError> {
        let key = Cart::storage_key(user_id);
        if cart.is_empty() {
            self.store.remove(&key).await
        } else {
            self.store.save(&key, cart).await
        }
    }
}
