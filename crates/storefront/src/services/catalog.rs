//! Catalog queries.
//!
//! The public catalog lists every book by ascending ISBN and filters on
//! title, author or category. A seller's catalog lists only their store's
//! books, newest first, and filters on title.

use thiserror::Error;

use bookstore_core::{Isbn, Page, PageRequest, UserId};

use super::normalize_search;
use crate::db::{RepositoryError, Storage};
use crate::models::Book;

/// Errors from catalog queries.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The book does not exist.
    #[error("book not found")]
    NotFound,

    /// The seller has not opened a store.
    #[error("seller has no store")]
    StoreNotFound,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Read-only catalog access.
pub struct CatalogService<'a> {
    storage: &'a dyn Storage,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(storage: &'a dyn Storage) -> Self {
        Self { storage }
    }

    /// One page of the public catalog.
    ///
    /// A blank `search` applies no filter. Pages past the end are empty.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    #[tracing::instrument(skip(self))]
    pub async fn list_catalog(
        &self,
        page: PageRequest,
        search: Option<&str>,
    ) -> Result<Page<Book>, CatalogError> {
        let books = self
            .storage
            .list_books(normalize_search(search), page)
            .await?;
        Ok(books)
    }

    /// One page of the books in `seller`'s store.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::StoreNotFound` if the seller has no store.
    #[tracing::instrument(skip(self))]
    pub async fn list_store_catalog(
        &self,
        seller: UserId,
        page: PageRequest,
        search: Option<&str>,
    ) -> Result<Page<Book>, CatalogError> {
        let store = self
            .storage
            .store_for_owner(seller)
            .await?
            .ok_or(CatalogError::StoreNotFound)?;

        let books = self
            .storage
            .list_store_books(store.id, normalize_search(search), page)
            .await?;
        Ok(books)
    }

    /// A single book.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if no book has this ISBN.
    pub async fn book_details(&self, isbn: &Isbn) -> Result<Book, CatalogError> {
        self.storage
            .get_book(isbn)
            .await?
            .ok_or(CatalogError::NotFound)
    }
}
