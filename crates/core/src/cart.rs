//! Shopping cart model.
//!
//! A [`Cart`] is an ordered list of [`CartEntry`] values, one per catalog item.
//! Every mutation that can increase a quantity takes the item's currently
//! available stock as an argument; the caller is responsible for reading it
//! from the catalog immediately before the call. The cart itself is never
//! authoritative for stock - checkout re-validates under a row lock.
//!
//! The JSON form of a cart is a plain array of entries, with the item fields
//! flattened next to the requested quantity:
//!
//! ```json
//! [{"id": 3, "name": "Honey", "description": null, "price": "8.00",
//!   "farmer_id": 1, "image_url": null, "quantity": 2}]
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::checkout::OrderLine;
use crate::types::{ItemId, UserId};

/// Snapshot of the catalog fields a cart entry carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Catalog item ID.
    #[serde(rename = "id")]
    pub item_id: ItemId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub farmer_id: Option<UserId>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A catalog item paired with the quantity the shopper wants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    #[serde(flatten)]
    pub item: CartItem,
    pub quantity: i32,
}

impl CartEntry {
    /// Price of this line (unit price x quantity).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.item.price * Decimal::from(self.quantity)
    }
}

/// Reasons a cart mutation is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// Requested quantity to add was zero or negative.
    #[error("Quantity must be at least 1 (got {0}).")]
    InvalidQuantity(i32),

    /// Not enough stock to satisfy the request.
    #[error("Sorry, only {available} units available.")]
    InsufficientStock { available: i32 },

    /// The item is already in the cart and adding more would exceed stock.
    #[error("Sorry, only {available} units available. You already have {in_cart} in your cart.")]
    ExceedsStockWithCart { available: i32, in_cart: i32 },
}

/// A shopper's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    entries: Vec<CartEntry>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Storage key under which a user's cart is persisted.
    #[must_use]
    pub fn storage_key(user_id: UserId) -> String {
        format!("cart_{user_id}")
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by item.
    #[must_use]
    pub fn get(&self, item_id: ItemId) -> Option<&CartEntry> {
        self.entries.iter().find(|e| e.item.item_id == item_id)
    }

    /// Add `quantity` units of `item`, given `available` units in stock.
    ///
    /// If the item is already in the cart, the quantities are summed and the
    /// item snapshot is refreshed.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InvalidQuantity`] if `quantity` is not positive,
    /// [`CartError::InsufficientStock`] if a new entry would exceed `available`
    /// and [`CartError::ExceedsStockWithCart`] if the summed quantity would.
    pub fn add(&mut self, item: CartItem, quantity: i32, available: i32) -> Result<(), CartError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.item.item_id == item.item_id)
        {
            let current = entry.quantity;
            let insufficient = CartError::ExceedsStockWithCart {
                available,
                in_cart: current,
            };
            let combined = current.checked_add(quantity).ok_or(insufficient.clone())?;
            if combined > available {
                return Err(insufficient);
            }
            entry.item = item;
            entry.quantity = combined;
            return Ok(());
        }

        if quantity > available {
            return Err(CartError::InsufficientStock { available });
        }

        self.entries.push(CartEntry { item, quantity });
        Ok(())
    }

    /// Set the quantity of an item already in the cart.
    ///
    /// A quantity of zero or less removes the entry. Items that are not in the
    /// cart are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InsufficientStock`] if `new_quantity` exceeds
    /// `available`.
    pub fn update_quantity(
        &mut self,
        item_id: ItemId,
        new_quantity: i32,
        available: i32,
    ) -> Result<(), CartError> {
        if new_quantity > available {
            return Err(CartError::InsufficientStock { available });
        }

        if new_quantity <= 0 {
            self.remove(item_id);
        } else if let Some(entry) = self.entries.iter_mut().find(|e| e.item.item_id == item_id) {
            entry.quantity = new_quantity;
        }

        Ok(())
    }

    /// Remove an item. Returns the removed entry, if any.
    pub fn remove(&mut self, item_id: ItemId) -> Option<CartEntry> {
        let index = self.entries.iter().position(|e| e.item.item_id == item_id)?;
        Some(self.entries.remove(index))
    }

    /// Sum of price x quantity over all entries.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.entries.iter().map(CartEntry::line_total).sum()
    }

    /// Sum of quantities over all entries.
    #[must_use]
    pub fn count(&self) -> i64 {
        self.entries.iter().map(|e| i64::from(e.quantity)).sum()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Snapshot of the cart as order lines.
    #[must_use]
    pub fn order_lines(&self) -> Vec<OrderLine> {
        self.entries
            .iter()
            .map(|e| OrderLine {
                product_id: e.item.item_id,
                name: e.item.name.clone(),
                price: e.item.price,
                quantity: e.quantity,
                description: e.item.description.clone().unwrap_or_default(),
            })
            .collect()
    }
}
