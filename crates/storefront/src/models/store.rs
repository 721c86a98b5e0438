//! Seller stores.

use serde::{Deserialize, Serialize};

use bookstore_core::{StoreId, UserId};

/// A seller's store. Each seller owns at most one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Store {
    pub id: StoreId,
    pub owner_id: UserId,
    pub name: String,
}
