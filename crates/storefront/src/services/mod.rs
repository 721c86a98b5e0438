//! Business logic services for the bookstore.
//!
//! # Services
//!
//! - `catalog` - Public and seller-scoped catalog queries
//! - `cart` - Adding to and viewing the cart
//! - `checkout` - The order checkout transaction
//! - `orders` - Order history
//! - `seller` - Seller book management
//! - `auth` - Password login
//! - `email` / `notifier` - Order confirmation delivery
//! - `images` - Cover image storage
//!
//! Services borrow their collaborators from application state and take the
//! caller's identity explicitly on every operation.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod email;
pub mod images;
pub mod locks;
pub mod notifier;
pub mod orders;
pub mod seller;

/// Trim a free-text search term, treating blank input as no filter.
#[must_use]
pub fn normalize_search(term: Option<&str>) -> Option<&str> {
    term.map(str::trim).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_search() {
        assert_eq!(normalize_search(None), None);
        assert_eq!(normalize_search(Some("")), None);
        assert_eq!(normalize_search(Some("   ")), None);
        assert_eq!(normalize_search(Some("  rust ")), Some("rust"));
    }
}
