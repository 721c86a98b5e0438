//! Book catalog queries.

use async_trait::async_trait;

use bookstore_core::{Isbn, Page, PageRequest, StoreId};

use super::{PgStorage, bigint, contains_pattern, is_foreign_key_violation, row_count, unique_violation};
use crate::db::{CatalogRepository, RepositoryError};
use crate::models::{Book, BookDetails, NewBook};

const BOOK_COLUMNS: &str = "isbn, title, author, category, pages, price, description, \
                            image_url, created_at, store_id";

#[async_trait]
impl CatalogRepository for PgStorage {
    async fn list_books(
        &self,
        search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Book>, RepositoryError> {
        let pattern = search.map(contains_pattern);
        let filter = "($1::text IS NULL \
                      OR title ILIKE $1 ESCAPE '\\' \
                      OR category ILIKE $1 ESCAPE '\\' \
                      OR author ILIKE $1 ESCAPE '\\')";

        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM book WHERE {filter}"))
            .bind(pattern.as_deref())
            .fetch_one(&self.pool)
            .await?;

        let books: Vec<Book> = sqlx::query_as(&format!(
            "SELECT {BOOK_COLUMNS} FROM book WHERE {filter} ORDER BY isbn LIMIT $2 OFFSET $3"
        ))
        .bind(pattern.as_deref())
        .bind(bigint(page.limit()))
        .bind(bigint(page.offset()))
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(books, page, row_count(count)?))
    }

    async fn list_store_books(
        &self,
        store_id: StoreId,
        title_search: Option<&str>,
        page: PageRequest,
    ) -> Result<Page<Book>, RepositoryError> {
        let pattern = title_search.map(contains_pattern);
        let filter = "store_id = $1 AND ($2::text IS NULL OR title ILIKE $2 ESCAPE '\\')";

        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM book WHERE {filter}"))
            .bind(store_id)
            .bind(pattern.as_deref())
            .fetch_one(&self.pool)
            .await?;

        let books: Vec<Book> = sqlx::query_as(&format!(
            "SELECT {BOOK_COLUMNS} FROM book WHERE {filter} \
             ORDER BY created_at DESC, isbn ASC LIMIT $3 OFFSET $4"
        ))
        .bind(store_id)
        .bind(pattern.as_deref())
        .bind(bigint(page.limit()))
        .bind(bigint(page.offset()))
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(books, page, row_count(count)?))
    }

    async fn get_book(&self, isbn: &Isbn) -> Result<Option<Book>, RepositoryError> {
        let book = sqlx::query_as(&format!("SELECT {BOOK_COLUMNS} FROM book WHERE isbn = $1"))
            .bind(isbn)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn insert_book(&self, book: NewBook) -> Result<Book, RepositoryError> {
        let row = sqlx::query_as(&format!(
            "INSERT INTO book (isbn, title, author, category, pages, price, description, \
                               image_url, created_at, store_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {BOOK_COLUMNS}"
        ))
        .bind(&book.isbn)
        .bind(&book.details.title)
        .bind(&book.details.author)
        .bind(&book.details.category)
        .bind(book.details.pages)
        .bind(book.details.price)
        .bind(&book.details.description)
        .bind(&book.image_url)
        .bind(book.created_at)
        .bind(book.store_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| unique_violation(e, "a book with this ISBN already exists"))?;

        Ok(row)
    }

    async fn update_book(
        &self,
        store_id: StoreId,
        isbn: &Isbn,
        details: &BookDetails,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE book
            SET title = $3, author = $4, category = $5, pages = $6,
                price = $7, description = $8
            WHERE isbn = $1 AND store_id = $2
            ",
        )
        .bind(isbn)
        .bind(store_id)
        .bind(&details.title)
        .bind(&details.author)
        .bind(&details.category)
        .bind(details.pages)
        .bind(details.price)
        .bind(&details.description)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_book(&self, store_id: StoreId, isbn: &Isbn) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM book WHERE isbn = $1 AND store_id = $2")
            .bind(isbn)
            .bind(store_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    return RepositoryError::Conflict("book is referenced by orders".to_owned());
                }
                RepositoryError::Database(e)
            })?;

        Ok(result.rows_affected())
    }
}
