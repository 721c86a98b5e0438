//! Storage port and adapters.
//!
//! Services talk to storage through the traits below, split by concern.
//! [`Storage`] bundles them so application state can hold one
//! `Arc<dyn Storage>`.
//!
//! # Adapters
//!
//! - [`postgres::PgStorage`] - production, `PostgreSQL` via sqlx
//! - `memory::MemoryStorage` - in-process tables with fault injection
//!   (`test-support` feature)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p bookstore-cli -- migrate
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use bookstore_core::{Email, Isbn, OrderId, Page, PageRequest, Role, StoreId, UserId};

use crate::models::{
    Book, BookDetails, CartLine, NewBook, NewOrderDetail, Order, OrderDetail, OrderWithDetails,
    PricedCartLine, Store, User, UserWithPassword,
};

#[cfg(any(test, feature = "test-support"))]
pub mod memory;
pub mod postgres;

#[cfg(any(test, feature = "test-support"))]
pub use memory::{FaultPoint, MemoryStorage};
pub use postgres::PgStorage;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in database is invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// A referenced row does not exist.
    #[error("not found")]
    NotFound,

    /// Uniqueness or referential constraint violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Non-database storage failure (in-memory adapter, injected faults).
    #[error("storage error: {0}")]
    Storage(String),
}

/// Read and write access to the book catalog.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    /// Page through all books ordered by ISBN ascending.
    ///
    /// `search`, when present, matches title, author or category as a
    /// case-insensitive substring.
    async fn list_books(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Book>, RepositoryError>;

    /// Page through one store's books, newest first with ISBN as tie-breaker.
    ///
    /// `title_search`, when present, matches the title only.
    async fn list_store_books(
        &self,
        store_id: StoreId,
        title_search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Book>, RepositoryError>;

    /// Fetch one book.
    async fn get_book(&self, isbn: &Isbn) -> Result<Option<Book>, RepositoryError>;

    /// Insert a book. A duplicate ISBN is a [`RepositoryError::Conflict`].
    async fn insert_book(&self, book: NewBook) -> Result<Book, RepositoryError>;

    /// Overwrite the editable attributes of a book in `store_id`.
    ///
    /// Returns the number of rows changed (0 or 1).
    async fn update_book(
        &self,
        store_id: StoreId,
        isbn: &Isbn,
        details: &BookDetails,
    ) -> Result<u64, RepositoryError>;

    /// Delete a book in `store_id`.
    ///
    /// Returns the number of rows removed (0 or 1). A book referenced by an
    /// order detail is a [`RepositoryError::Conflict`].
    async fn delete_book(&self, store_id: StoreId, isbn: &Isbn) -> Result<u64, RepositoryError>;
}

/// Seller stores.
#[async_trait]
pub trait StoreRepository: Send + Sync {
    /// The store owned by `owner`, if any.
    async fn store_for_owner(&self, owner: UserId) -> Result<Option<Store>, RepositoryError>;

    /// Open a store. A second store for the same owner is a
    /// [`RepositoryError::Conflict`].
    async fn create_store(&self, owner: UserId, name: &str) -> Result<Store, RepositoryError>;
}

/// Cart lines.
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Add one copy of `isbn`, inserting the line or incrementing its quantity
    /// in a single statement. A missing book is [`RepositoryError::NotFound`].
    async fn add_to_cart(&self, user: UserId, isbn: &Isbn) -> Result<CartLine, RepositoryError>;

    /// The user's cart joined to current prices, ordered by ISBN.
    async fn cart_lines(&self, user: UserId) -> Result<Vec<PricedCartLine>, RepositoryError>;
}

/// Order history.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// The user's orders, newest first.
    async fn list_orders(&self, user: UserId) -> Result<Vec<Order>, RepositoryError>;

    /// One order with its details, only if it belongs to `user`.
    async fn get_order(
        &self,
        user: UserId,
        order: OrderId,
    ) -> Result<Option<OrderWithDetails>, RepositoryError>;
}

/// Accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Look up a user and password hash for login.
    async fn get_user_for_login(
        &self,
        email: &Email,
    ) -> Result<Option<UserWithPassword>, RepositoryError>;

    /// Look up a user by email.
    async fn get_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Create an account. A taken email is a [`RepositoryError::Conflict`].
    async fn create_user(
        &self,
        email: &Email,
        role: Role,
        password_hash: &str,
    ) -> Result<User, RepositoryError>;
}

/// Opens checkout transactions.
#[async_trait]
pub trait CheckoutRepository: Send + Sync {
    /// Start a transaction. Dropping it without [`CheckoutTransaction::commit`]
    /// discards every write.
    async fn begin_checkout(&self) -> Result<Box<dyn CheckoutTransaction>, RepositoryError>;
}

/// The writes that make up one checkout, all inside one transaction.
#[async_trait]
pub trait CheckoutTransaction: Send {
    /// Lock and read the user's cart lines with current prices, ordered by ISBN.
    async fn lock_cart(&mut self, user: UserId) -> Result<Vec<PricedCartLine>, RepositoryError>;

    /// Create the order header.
    async fn insert_order(
        &mut self,
        user: UserId,
        ordered_at: DateTime<Utc>,
        total: Decimal,
    ) -> Result<Order, RepositoryError>;

    /// Create one detail row of `order`.
    async fn insert_order_detail(
        &mut self,
        order: OrderId,
        detail: &NewOrderDetail,
    ) -> Result<OrderDetail, RepositoryError>;

    /// Delete every cart line of the user. Returns the number removed.
    async fn clear_cart(&mut self, user: UserId) -> Result<u64, RepositoryError>;

    /// Make every write durable.
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;

    /// Discard every write.
    async fn rollback(self: Box<Self>) -> Result<(), RepositoryError>;
}

/// Everything the application needs from storage.
#[async_trait]
pub trait Storage:
    CatalogRepository
    + StoreRepository
    + CartRepository
    + OrderRepository
    + UserRepository
    + CheckoutRepository
{
    /// Check that the backend is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply pending migrations from `crates/storefront/migrations`.
///
/// # Errors
///
/// Returns `sqlx::migrate::MigrateError` if a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
