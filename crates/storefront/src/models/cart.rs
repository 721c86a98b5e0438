//! Shopping cart types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bookstore_core::{Isbn, UserId, line_total, round_total};

/// A pending purchase of one book by one user.
///
/// `(user_id, isbn)` is unique; adding the same book again bumps `quantity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartLine {
    pub user_id: UserId,
    pub isbn: Isbn,
    pub quantity: i32,
}

/// A cart line joined to the book's current title and price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PricedCartLine {
    pub isbn: Isbn,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl PricedCartLine {
    /// Unrounded `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        line_total(self.unit_price, self.quantity)
    }
}

/// One row of the cart view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartItem {
    pub isbn: Isbn,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

/// The user's cart with a rounded subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSummary {
    pub lines: Vec<CartItem>,
    pub subtotal: Decimal,
}

impl CartSummary {
    /// Build the summary, rounding the subtotal to `decimals` places.
    #[must_use]
    pub fn from_lines(lines: Vec<PricedCartLine>, decimals: u32) -> Self {
        let subtotal = round_total(lines.iter().map(PricedCartLine::line_total), decimals);
        let lines = lines
            .into_iter()
            .map(|line| CartItem {
                line_total: line.line_total(),
                isbn: line.isbn,
                title: line.title,
                unit_price: line.unit_price,
                quantity: line.quantity,
            })
            .collect();
        Self { lines, subtotal }
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(isbn: &str, price: &str, quantity: i32) -> PricedCartLine {
        PricedCartLine {
            isbn: Isbn::parse(isbn).unwrap(),
            title: format!("Book {isbn}"),
            unit_price: price.parse().unwrap(),
            quantity,
        }
    }

    #[test]
    fn test_summary_totals_lines() {
        let summary = CartSummary::from_lines(
            vec![line("0306406152", "10.00", 2), line("9780306406157", "5.25", 1)],
            2,
        );
        assert_eq!(summary.lines.len(), 2);
        assert_eq!(summary.lines[0].line_total, "20.00".parse().unwrap());
        assert_eq!(summary.subtotal, "25.25".parse().unwrap());
    }

    #[test]
    fn test_empty_summary() {
        let summary = CartSummary::from_lines(Vec::new(), 2);
        assert!(summary.is_empty());
        assert_eq!(summary.subtotal, Decimal::ZERO);
    }
}
