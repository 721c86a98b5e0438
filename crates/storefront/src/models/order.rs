//! Order history types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bookstore_core::{Isbn, OrderId, UserId};

/// An order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub ordered_at: DateTime<Utc>,
    /// Sum of all detail lines, rounded once at checkout.
    pub total: Decimal,
}

/// One purchased book within an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderDetail {
    pub order_id: OrderId,
    pub isbn: Isbn,
    pub quantity: i32,
    /// Book price at checkout time.
    pub unit_price: Decimal,
}

/// A detail row to write during checkout, before the order id is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderDetail {
    pub isbn: Isbn,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// An order header with its detail lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderWithDetails {
    pub order: Order,
    pub details: Vec<OrderDetail>,
}

/// Result of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    pub order: Order,
    pub details: Vec<OrderDetail>,
    /// Whether the confirmation email went out. The order stands either way.
    pub confirmation_sent: bool,
}
