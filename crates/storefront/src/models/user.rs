//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bookstore_core::{Email, Role, UserId};

/// A bookstore account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login email, stored lower-cased.
    pub email: Email,
    /// Customer or seller.
    pub role: Role,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// A user together with their argon2 password hash.
///
/// Only the login path reads this; everything else works with [`User`].
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserWithPassword {
    #[sqlx(flatten)]
    pub user: User,
    pub password_hash: String,
}
