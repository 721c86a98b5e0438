//! Cart line queries.

use async_trait::async_trait;

use bookstore_core::{Isbn, UserId};

use super::{PgStorage, is_foreign_key_violation};
use crate::db::{CartRepository, RepositoryError};
use crate::models::{CartLine, PricedCartLine};

/// Cart lines joined to current book prices for one user.
pub(super) const PRICED_CART_QUERY: &str = r"
    SELECT c.isbn, b.title, b.price AS unit_price, c.quantity
    FROM cart_line c
    JOIN book b ON b.isbn = c.isbn
    WHERE c.user_id = $1
    ORDER BY c.isbn
";

#[async_trait]
impl CartRepository for PgStorage {
    async fn add_to_cart(&self, user: UserId, isbn: &Isbn) -> Result<CartLine, RepositoryError> {
        let line = sqlx::query_as(
            r"
            INSERT INTO cart_line (user_id, isbn, quantity)
            VALUES ($1, $2, 1)
            ON CONFLICT (user_id, isbn)
            DO UPDATE SET quantity = cart_line.quantity + 1
            RETURNING user_id, isbn, quantity
            ",
        )
        .bind(user)
        .bind(isbn)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        Ok(line)
    }

    async fn cart_lines(&self, user: UserId) -> Result<Vec<PricedCartLine>, RepositoryError> {
        let lines = sqlx::query_as(PRICED_CART_QUERY)
            .bind(user)
            .fetch_all(&self.pool)
            .await?;
        Ok(lines)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    use bookstore_core::Role;

    use super::super::fixtures::{at, book, store, user};
    use super::*;

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_add_to_cart_increments_existing_line(pool: PgPool) {
        let storage = PgStorage::new(pool);
        let shelf = store(&storage, "seller@example.com").await;
        let buyer = user(&storage, "buyer@example.com", Role::Customer).await;
        let dune = book(&storage, shelf, "0000000001", "Dune", Decimal::new(999, 2), at(0)).await;

        let first = storage.add_to_cart(buyer.id, &dune.isbn).await.unwrap();
        let second = storage.add_to_cart(buyer.id, &dune.isbn).await.unwrap();
        assert_eq!(first.quantity, 1);
        assert_eq!(second.quantity, 2);

        let lines = storage.cart_lines(buyer.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].unit_price, Decimal::new(999, 2));
        assert_eq!(lines[0].title, "Dune");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_add_unknown_book_is_not_found(pool: PgPool) {
        let storage = PgStorage::new(pool);
        let buyer = user(&storage, "buyer@example.com", Role::Customer).await;
        let missing = Isbn::parse("0000000099").unwrap();

        assert!(matches!(
            storage.add_to_cart(buyer.id, &missing).await,
            Err(RepositoryError::NotFound)
        ));
        assert!(storage.cart_lines(buyer.id).await.unwrap().is_empty());
    }
}
