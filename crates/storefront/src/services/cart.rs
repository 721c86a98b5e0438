//! Cart operations.

use thiserror::Error;

use bookstore_core::{Isbn, UserId};

use crate::db::{RepositoryError, Storage};
use crate::models::{CartLine, CartSummary};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The book does not exist.
    #[error("book not found")]
    NotFound,

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for CartError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

/// A user's cart.
pub struct CartService<'a> {
    storage: &'a dyn Storage,
    total_decimals: u32,
}

impl<'a> CartService<'a> {
    /// `total_decimals` is the rounding precision of the subtotal.
    #[must_use]
    pub const fn new(storage: &'a dyn Storage, total_decimals: u32) -> Self {
        Self {
            storage,
            total_decimals,
        }
    }

    /// Add one copy of `isbn` to the cart.
    ///
    /// The first add creates a line with quantity 1; later adds increment it.
    ///
    /// # Errors
    ///
    /// Returns `CartError::NotFound` if the book does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn add_to_cart(&self, user: UserId, isbn: &Isbn) -> Result<CartLine, CartError> {
        let line = self.storage.add_to_cart(user, isbn).await?;
        tracing::debug!(quantity = line.quantity, "Added to cart");
        Ok(line)
    }

    /// The cart's lines at current prices and their subtotal.
    ///
    /// # Errors
    ///
    /// Returns `CartError::Repository` if the query fails.
    pub async fn view_cart(&self, user: UserId) -> Result<CartSummary, CartError> {
        let lines = self.storage.cart_lines(user).await?;
        Ok(CartSummary::from_lines(lines, self.total_decimals))
    }
}
