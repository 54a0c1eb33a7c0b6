//! Checkout planning.
//!
//! [`plan_stock_adjustments`] decides, from the order lines and the stock read
//! under lock, what must happen to each catalog row. It rejects the whole
//! order if any line cannot be filled, so a caller that applies the plan
//! inside the same transaction can never drive stock below zero.

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ItemId;

/// One line of an order snapshot, stored denormalized on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ItemId,
    pub name: String,
    pub price: Decimal,
    pub quantity: i32,
    #[serde(default)]
    pub description: String,
}

/// What to do with a catalog row once an order is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockAdjustment {
    /// Stock remains; set it to `quantity`.
    SetQuantity { item_id: ItemId, quantity: i32 },
    /// Stock is exhausted; delete the item from the catalog.
    Remove { item_id: ItemId },
}

impl StockAdjustment {
    #[must_use]
    pub const fn item_id(&self) -> ItemId {
        match self {
            Self::SetQuantity { item_id, .. } | Self::Remove { item_id } => *item_id,
        }
    }
}

/// Reasons an order cannot be placed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("No items in cart or user not logged in")]
    EmptyCart,

    #[error("{name} is no longer available.")]
    ItemUnavailable { item_id: ItemId, name: String },

    #[error("Sorry, only {available} units of {name} available (you requested {requested}).")]
    InsufficientStock {
        item_id: ItemId,
        name: String,
        available: i32,
        requested: i32,
    },

    #[error("Quantity for {name} must be at least 1.")]
    InvalidQuantity { item_id: ItemId, name: String },
}

/// Order total: sum of price x quantity.
#[must_use]
pub fn order_total(lines: &[OrderLine]) -> Decimal {
    lines
        .iter()
        .map(|l| l.price * Decimal::from(l.quantity))
        .sum()
}

/// Item IDs of the order in ascending, de-duplicated order.
///
/// Rows must be locked in this order so concurrent checkouts over overlapping
/// items acquire locks consistently.
#[must_use]
pub fn lock_order(lines: &[OrderLine]) -> Vec<ItemId> {
    let mut ids: Vec<ItemId> = lines.iter().map(|l| l.product_id).collect();
    ids.sort_by_key(ItemId::as_i32);
    ids.dedup();
    ids
}

/// Plan the stock adjustments for an order.
///
/// `stock` holds the current quantity of every item that still exists; items
/// absent from the map have been deleted from the catalog. Lines for the same
/// item are combined. Adjustments are returned in [`lock_order`].
///
/// # Errors
///
/// Returns [`CheckoutError::EmptyCart`] for an order without lines, and the
/// first unavailable, understocked, or non-positive line otherwise.
pub fn plan_stock_adjustments(
    lines: &[OrderLine],
    stock: &HashMap<ItemId, i32>,
) -> Result<Vec<StockAdjustment>, CheckoutError> {
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let mut requested: BTreeMap<i32, (&OrderLine, i32)> = BTreeMap::new();
    for line in lines {
        if line.quantity <= 0 {
            return Err(CheckoutError::InvalidQuantity {
                item_id: line.product_id,
                name: line.name.clone(),
            });
        }
        let slot = requested
            .entry(line.product_id.as_i32())
            .or_insert((line, 0));
        slot.1 = slot.1.saturating_add(line.quantity);
    }

    requested
        .into_values()
        .map(|(line, quantity)| {
            let item_id = line.product_id;
            let Some(&available) = stock.get(&item_id) else {
                return Err(CheckoutError::ItemUnavailable {
                    item_id,
                    name: line.name.clone(),
                });
            };

            if available < quantity {
                return Err(CheckoutError::InsufficientStock {
                    item_id,
                    name: line.name.clone(),
                    available,
                    requested: quantity,
                });
            }

            let remaining = available - quantity;
            Ok(if remaining <= 0 {
                StockAdjustment::Remove { item_id }
            } else {
                StockAdjustment::SetQuantity {
                    item_id,
                    quantity: remaining,
                }
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(id: i32, name: &str, price_cents: i64, quantity: i32) -> OrderLine {
        OrderLine {
            product_id: ItemId::new(id),
            name: name.to_string(),
            price: Decimal::new(price_cents, 2),
            quantity,
            description: String::new(),
        }
    }

    #[test]
    fn test_empty_order_is_rejected() {
        assert_eq!(
            plan_stock_adjustments(&[], &HashMap::new()),
            Err(CheckoutError::EmptyCart)
        );
    }

    #[test]
    fn test_partial_stock_is_decremented() {
        let stock = HashMap::from([(ItemId::new(1), 10)]);
        let plan = plan_stock_adjustments(&[line(1, "Kale", 300, 4)], &stock).unwrap();
        assert_eq!(
            plan,
            vec![StockAdjustment::SetQuantity {
                item_id: ItemId::new(1),
                quantity: 6
            }]
        );
    }

    #[test]
    fn test_exhausted_stock_removes_item() {
        let stock = HashMap::from([(ItemId::new(1), 4)]);
        let plan = plan_stock_adjustments(&[line(1, "Kale", 300, 4)], &stock).unwrap();
        assert_eq!(
            plan,
            vec![StockAdjustment::Remove {
                item_id: ItemId::new(1)
            }]
        );
    }

    #[test]
    fn test_oversold_line_rejects_whole_order() {
        let stock = HashMap::from([(ItemId::new(1), 10), (ItemId::new(2), 1)]);
        let err = plan_stock_adjustments(
            &[line(1, "Kale", 300, 2), line(2, "Sourdough", 700, 2)],
            &stock,
        )
        .unwrap_err();

        assert_eq!(
            err,
            CheckoutError::InsufficientStock {
                item_id: ItemId::new(2),
                name: "Sourdough".to_string(),
                available: 1,
                requested: 2,
            }
        );
    }

    #[test]
    fn test_deleted_item_is_unavailable() {
        let err = plan_stock_adjustments(&[line(3, "Strawberries", 500, 1)], &HashMap::new())
            .unwrap_err();
        assert!(matches!(err, CheckoutError::ItemUnavailable { .. }));
        assert_eq!(err.to_string(), "Strawberries is no longer available.");
    }

    #[test]
    fn test_duplicate_lines_are_combined() {
        let stock = HashMap::from([(ItemId::new(1), 5)]);
        let err =
            plan_stock_adjustments(&[line(1, "Kale", 300, 3), line(1, "Kale", 300, 3)], &stock)
                .unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::InsufficientStock { requested: 6, .. }
        ));
    }

    #[test]
    fn test_adjustments_follow_lock_order() {
        let lines = [line(9, "Cheese", 1200, 1), line(2, "Milk", 450, 1)];
        let stock = HashMap::from([(ItemId::new(2), 3), (ItemId::new(9), 3)]);

        let plan = plan_stock_adjustments(&lines, &stock).unwrap();
        let ids: Vec<ItemId> = plan.iter().map(StockAdjustment::item_id).collect();

        assert_eq!(ids, lock_order(&lines));
        assert_eq!(ids, vec![ItemId::new(2), ItemId::new(9)]);
    }

    #[test]
    fn test_order_total() {
        let lines = [line(1, "Kale", 300, 3), line(2, "Milk", 450, 2)];
        assert_eq!(order_total(&lines), Decimal::new(1800, 2));
    }
}
