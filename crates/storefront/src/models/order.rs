//! Order types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use farmers_place_core::{OrderId, OrderLine, OrderStatus, UserId};

/// A placed order with its line snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_date: DateTime<Utc>,
    pub total: Decimal,
    pub status: OrderStatus,
    pub items: Vec<OrderLine>,
}
