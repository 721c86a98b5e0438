//! Seller book management.
//!
//! Every operation resolves the seller's store first and only touches books
//! in that store. Another store's book looks exactly like a missing one.

use chrono::Utc;
use thiserror::Error;

use bookstore_core::{Isbn, UserId};

use super::images::{ImageError, ImageStore};
use crate::db::{RepositoryError, Storage};
use crate::models::{Book, BookDetails, BookDraft, BookValidationError, NewBook, Store};

const DUPLICATE_ISBN: &str = "a book with this ISBN already exists";

/// Errors from seller book management.
#[derive(Debug, Error)]
pub enum SellerError {
    /// The seller has not opened a store.
    #[error("seller has no store")]
    StoreNotFound,

    /// No such book in the seller's store.
    #[error("book not found")]
    NotFound,

    /// Rejected input.
    #[error(transparent)]
    Validation(#[from] BookValidationError),

    /// The uploaded image was rejected.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Duplicate ISBN, or a delete blocked by order history.
    #[error("{0}")]
    Conflict(String),

    /// The book changed underneath an edit.
    #[error("book was modified concurrently")]
    ConcurrencyConflict,

    /// Writing the image failed.
    #[error("image storage failed: {0}")]
    ImageStorage(#[source] ImageError),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for SellerError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::Conflict(message) => Self::Conflict(message),
            other => Self::Repository(other),
        }
    }
}

impl From<ImageError> for SellerError {
    fn from(e: ImageError) -> Self {
        match e {
            ImageError::Empty => Self::Validation(BookValidationError::MissingImage),
            ImageError::UnsupportedType(_) => Self::InvalidImage(e.to_string()),
            ImageError::AlreadyExists(_) => Self::Conflict(DUPLICATE_ISBN.to_owned()),
            ImageError::Io(_) => Self::ImageStorage(e),
        }
    }
}

/// An uploaded cover image.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Book management for the seller who owns a store.
pub struct SellerBookService<'a> {
    storage: &'a dyn Storage,
    images: &'a dyn ImageStore,
}

impl<'a> SellerBookService<'a> {
    #[must_use]
    pub const fn new(storage: &'a dyn Storage, images: &'a dyn ImageStore) -> Self {
        Self { storage, images }
    }

    async fn store(&self, seller: UserId) -> Result<Store, SellerError> {
        self.storage
            .store_for_owner(seller)
            .await?
            .ok_or(SellerError::StoreNotFound)
    }

    /// List a new book in the seller's store.
    ///
    /// A cover image is required. It is saved as `<isbn><ext>` before the
    /// row is inserted and never replaces an existing cover. If the insert
    /// fails the saved cover is removed again.
    ///
    /// # Errors
    ///
    /// Returns `SellerError::Validation` for bad input or a missing image and
    /// `SellerError::Conflict` if the ISBN is taken.
    #[tracing::instrument(skip(self, draft, image), fields(isbn = %draft.isbn))]
    pub async fn create_book(
        &self,
        seller: UserId,
        draft: BookDraft,
        image: Option<ImageUpload>,
    ) -> Result<Book, SellerError> {
        let store = self.store(seller).await?;
        let (isbn, details) = draft.validate()?;

        let image = image
            .filter(|upload| !upload.bytes.is_empty())
            .ok_or(BookValidationError::MissingImage)?;

        // Checked before writing the image so a duplicate cannot replace
        // the existing book's cover.
        if self.storage.get_book(&isbn).await?.is_some() {
            return Err(SellerError::Conflict(DUPLICATE_ISBN.to_owned()));
        }

        let image_url = self
            .images
            .store(&isbn, &image.file_name, &image.bytes)
            .await?;

        let inserted = self
            .storage
            .insert_book(NewBook {
                isbn,
                details,
                image_url: image_url.clone(),
                created_at: Utc::now(),
                store_id: store.id,
            })
            .await;

        match inserted {
            Ok(book) => {
                tracing::info!(store_id = %store.id, "Book created");
                Ok(book)
            }
            Err(e) => {
                self.discard_image(&image_url).await;
                Err(e.into())
            }
        }
    }

    /// Remove a cover no book refers to. Failures are logged.
    async fn discard_image(&self, image_url: &str) {
        if let Err(e) = self.images.remove(image_url).await {
            tracing::warn!(image = %image_url, error = %e, "Failed to remove unused cover image");
        }
    }

    /// Update the editable attributes of one of the seller's books.
    ///
    /// # Errors
    ///
    /// Returns `SellerError::NotFound` if the book is missing or not the
    /// seller's, and `SellerError::ConcurrencyConflict` if it exists but the
    /// update matched no row.
    #[tracing::instrument(skip(self, details))]
    pub async fn edit_book(
        &self,
        seller: UserId,
        isbn: &Isbn,
        details: BookDetails,
    ) -> Result<Book, SellerError> {
        let store = self.store(seller).await?;
        let details = details.validate()?;

        let existing = self
            .storage
            .get_book(isbn)
            .await?
            .filter(|book| book.store_id == store.id)
            .ok_or(SellerError::NotFound)?;

        let updated = self.storage.update_book(store.id, isbn, &details).await?;
        if updated == 0 {
            return match self.storage.get_book(isbn).await? {
                None => Err(SellerError::NotFound),
                Some(_) => {
                    tracing::warn!("Book changed during edit");
                    Err(SellerError::ConcurrencyConflict)
                }
            };
        }

        Ok(Book {
            title: details.title,
            author: details.author,
            category: details.category,
            pages: details.pages,
            price: details.price,
            description: details.description,
            ..existing
        })
    }

    /// Remove one of the seller's books along with its cover.
    ///
    /// # Errors
    ///
    /// Returns `SellerError::NotFound` if the book is missing or not the
    /// seller's, and `SellerError::Conflict` if orders reference it.
    #[tracing::instrument(skip(self))]
    pub async fn delete_book(&self, seller: UserId, isbn: &Isbn) -> Result<(), SellerError> {
        let store = self.store(seller).await?;
        let image_url = self
            .storage
            .get_book(isbn)
            .await?
            .filter(|book| book.store_id == store.id)
            .map(|book| book.image_url);

        let deleted = self.storage.delete_book(store.id, isbn).await?;
        if deleted == 0 {
            return Err(SellerError::NotFound);
        }
        if let Some(image_url) = image_url {
            self.discard_image(&image_url).await;
        }
        tracing::info!(store_id = %store.id, "Book deleted");
        Ok(())
    }

    /// One of the seller's books.
    ///
    /// # Errors
    ///
    /// Returns `SellerError::NotFound` if the book is missing or not the
    /// seller's.
    pub async fn seller_book(&self, seller: UserId, isbn: &Isbn) -> Result<Book, SellerError> {
        let store = self.store(seller).await?;
        self.storage
            .get_book(isbn)
            .await?
            .filter(|book| book.store_id == store.id)
            .ok_or(SellerError::NotFound)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use bookstore_core::{Email, Role};
    use rust_decimal::Decimal;

    use super::*;
    use crate::db::{CatalogRepository, MemoryStorage, StoreRepository, UserRepository};
    use crate::services::images::MemoryImageStore;

    async fn seller(storage: &MemoryStorage, email: &str, with_store: bool) -> UserId {
        let user = storage
            .create_user(&Email::parse(email).unwrap(), Role::Seller, "x")
            .await
            .unwrap();
        if with_store {
            storage.create_store(user.id, "Shelf").await.unwrap();
        }
        user.id
    }

    fn draft(isbn: &str) -> BookDraft {
        BookDraft {
            isbn: isbn.to_owned(),
            details: BookDetails {
                title: "Dune".to_owned(),
                author: "Herbert".to_owned(),
                category: "SF".to_owned(),
                pages: 412,
                price: Decimal::new(999, 2),
                description: String::new(),
            },
        }
    }

    fn cover() -> Option<ImageUpload> {
        Some(ImageUpload {
            file_name: "cover.png".to_owned(),
            bytes: vec![1, 2, 3],
        })
    }

    #[tokio::test]
    async fn test_create_requires_image() {
        let storage = MemoryStorage::new();
        let images = MemoryImageStore::new();
        let id = seller(&storage, "s@example.com", true).await;
        let service = SellerBookService::new(&storage, &images);

        let missing = service.create_book(id, draft("0306406152"), None).await;
        assert!(matches!(
            missing,
            Err(SellerError::Validation(BookValidationError::MissingImage))
        ));

        let empty = service
            .create_book(
                id,
                draft("0306406152"),
                Some(ImageUpload {
                    file_name: "cover.png".to_owned(),
                    bytes: Vec::new(),
                }),
            )
            .await;
        assert!(matches!(
            empty,
            Err(SellerError::Validation(BookValidationError::MissingImage))
        ));
        assert!(images.file_names().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_stores_image_and_book() {
        let storage = MemoryStorage::new();
        let images = MemoryImageStore::new();
        let id = seller(&storage, "s@example.com", true).await;
        let service = SellerBookService::new(&storage, &images);

        let book = service
            .create_book(id, draft("978-0-306-40615-7"), cover())
            .await
            .unwrap();

        assert_eq!(book.image_url, "images/9780306406157.png");
        assert_eq!(images.file_names().await, vec!["9780306406157.png"]);
    }

    #[tokio::test]
    async fn test_duplicate_isbn_conflicts() {
        let storage = MemoryStorage::new();
        let images = MemoryImageStore::new();
        let id = seller(&storage, "s@example.com", true).await;
        let service = SellerBookService::new(&storage, &images);

        service.create_book(id, draft("0306406152"), cover()).await.unwrap();
        let again = service.create_book(id, draft("0306406152"), cover()).await;
        assert!(matches!(again, Err(SellerError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_seller_without_store() {
        let storage = MemoryStorage::new();
        let images = MemoryImageStore::new();
        let id = seller(&storage, "s@example.com", false).await;
        let service = SellerBookService::new(&storage, &images);

        let result = service.create_book(id, draft("0306406152"), cover()).await;
        assert!(matches!(result, Err(SellerError::StoreNotFound)));
    }

    #[tokio::test]
    async fn test_other_sellers_book_is_not_found() {
        let storage = MemoryStorage::new();
        let images = MemoryImageStore::new();
        let owner = seller(&storage, "owner@example.com", true).await;
        let other = seller(&storage, "other@example.com", true).await;
        let service = SellerBookService::new(&storage, &images);
        service.create_book(owner, draft("0306406152"), cover()).await.unwrap();
        let isbn = Isbn::parse("0306406152").unwrap();

        assert!(matches!(
            service.seller_book(other, &isbn).await,
            Err(SellerError::NotFound)
        ));
        assert!(matches!(
            service.edit_book(other, &isbn, draft("0306406152").details).await,
            Err(SellerError::NotFound)
        ));
        assert!(matches!(
            service.delete_book(other, &isbn).await,
            Err(SellerError::NotFound)
        ));
        assert!(service.seller_book(owner, &isbn).await.is_ok());
    }

    #[tokio::test]
    async fn test_edit_keeps_fixed_attributes() {
        let storage = MemoryStorage::new();
        let images = MemoryImageStore::new();
        let id = seller(&storage, "s@example.com", true).await;
        let service = SellerBookService::new(&storage, &images);
        let created = service.create_book(id, draft("0306406152"), cover()).await.unwrap();

        let mut details = draft("0306406152").details;
        details.title = "Dune Messiah".to_owned();
        details.price = Decimal::new(1250, 2);
        let edited = service.edit_book(id, &created.isbn, details).await.unwrap();

        assert_eq!(edited.title, "Dune Messiah");
        assert_eq!(edited.image_url, created.image_url);
        assert_eq!(edited.created_at, created.created_at);
        assert_eq!(
            storage.get_book(&created.isbn).await.unwrap().unwrap(),
            edited
        );
    }

    #[tokio::test]
    async fn test_delete_missing_book() {
        let storage = MemoryStorage::new();
        let images = MemoryImageStore::new();
        let id = seller(&storage, "s@example.com", true).await;
        let service = SellerBookService::new(&storage, &images);
        let isbn = Isbn::parse("0306406152").unwrap();

        assert!(matches!(
            service.delete_book(id, &isbn).await,
            Err(SellerError::NotFound)
        ));
    }
}
