//! `PostgreSQL` storage adapter.
//!
//! Queries are built at runtime with `sqlx::query_as` and mapped through
//! `FromRow`, so the crate builds without a live database or an offline
//! query cache.
//!
//! The database tests use `#[sqlx::test]` and are ignored by default. Run
//! them against a scratch server with:
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/bookstore_test \
//!     cargo test -p bookstore-storefront -- --ignored
//! ```

mod cart;
mod catalog;
mod checkout;
mod orders;
mod users;

#[cfg(test)]
mod fixtures;

use async_trait::async_trait;
use sqlx::PgPool;

use super::{RepositoryError, Storage};

/// Storage backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Map a unique violation to [`RepositoryError::Conflict`] with `message`.
fn unique_violation(e: sqlx::Error, message: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(message.to_owned());
    }
    RepositoryError::Database(e)
}

/// Whether `e` is a foreign key violation.
fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}

/// Convert a `COUNT(*)` result.
fn row_count(count: i64) -> Result<u64, RepositoryError> {
    u64::try_from(count)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative row count: {count}")))
}

/// Clamp a pagination value into a `BIGINT` bind parameter.
fn bigint(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Build an `ILIKE ... ESCAPE '\'` pattern matching `term` as a literal substring.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("rust"), "%rust%");
        assert_eq!(contains_pattern("100%"), "%100\\%%");
        assert_eq!(contains_pattern("a_b"), "%a\\_b%");
        assert_eq!(contains_pattern("c:\\"), "%c:\\\\%");
    }

    #[test]
    fn test_row_count_rejects_negative() {
        assert_eq!(row_count(3).ok(), Some(3));
        assert!(matches!(
            row_count(-1),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
