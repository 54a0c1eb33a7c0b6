//! Catalog item types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use farmers_place_core::{CartItem, ItemId, UserId};

use super::user::FarmerName;

/// A catalog item listed by a farmer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub farmer_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// The fields a cart entry snapshots.
    #[must_use]
    pub fn to_cart_item(&self) -> CartItem {
        CartItem {
            item_id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            farmer_id: Some(self.farmer_id),
            image_url: self.image_url.clone(),
        }
    }
}

/// An item together with the farmer who sells it.
#[derive(Debug, Clone, Serialize)]
pub struct ItemWithFarmer {
    #[serde(flatten)]
    pub item: Item,
    pub farmer: Option<FarmerName>,
}

/// Catalog list filters. Empty fields do not filter.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemFilter {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub min_price: Option<Decimal>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub category: Option<String>,
}

impl ItemFilter {
    /// Trimmed search term, `None` when blank.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        non_blank(self.search.as_deref())
    }

    /// Trimmed category, `None` when blank.
    #[must_use]
    pub fn category_name(&self) -> Option<&str> {
        non_blank(self.category.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Query-string prices: an empty value means no bound.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match non_blank(raw.as_deref()) {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Fields a farmer submits when listing or editing an item.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Prices are stored as `NUMERIC(10,2)`.
const MAX_PRICE_EXCLUSIVE: i64 = 100_000_000;
const PRICE_SCALE: u32 = 2;

impl ItemInput {
    /// Check the listing rules.
    ///
    /// # Errors
    ///
    /// Returns a user-facing message for the first rule that fails.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("Item name is required");
        }
        if self.price.is_sign_negative() {
            return Err("Price cannot be negative");
        }
        if self.price >= Decimal::from(MAX_PRICE_EXCLUSIVE) {
            return Err("Price must be less than 100,000,000");
        }
        if self.price.normalize().scale() > PRICE_SCALE {
            return Err("Price cannot have more than 2 decimal places");
        }
        if self.quantity < 0 {
            return Err("Quantity cannot be negative");
        }
        Ok(())
    }
}
