//! Order history.

use thiserror::Error;

use bookstore_core::{OrderId, UserId};

use crate::db::{RepositoryError, Storage};
use crate::models::{Order, OrderWithDetails};

/// Errors from order history queries.
#[derive(Debug, Error)]
pub enum OrderError {
    /// No such order for this user.
    #[error("order not found")]
    NotFound,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Read access to a customer's past orders.
pub struct OrderService<'a> {
    storage: &'a dyn Storage,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(storage: &'a dyn Storage) -> Self {
        Self { storage }
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the query fails.
    pub async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, OrderError> {
        Ok(self.storage.list_orders(user).await?)
    }

    /// One of the user's orders with its details.
    ///
    /// Another user's order is reported as not found.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order does not exist or is not
    /// the user's.
    pub async fn order_details(
        &self,
        user: UserId,
        order: OrderId,
    ) -> Result<OrderWithDetails, OrderError> {
        self.storage
            .get_order(user, order)
            .await?
            .ok_or(OrderError::NotFound)
    }
}
