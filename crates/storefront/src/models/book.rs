//! Book catalog types.
//!
//! [`Book`] is the stored row. [`BookDraft`] and [`BookDetails`] are what a
//! seller submits; they are validated and normalized into [`NewBook`] (create)
//! or a checked [`BookDetails`] (edit) before any storage call.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bookstore_core::{Isbn, IsbnError, StoreId};

/// Longest accepted title or author name.
pub const MAX_NAME_LENGTH: usize = 200;

/// Longest accepted category name.
pub const MAX_CATEGORY_LENGTH: usize = 100;

/// Longest accepted description.
pub const MAX_DESCRIPTION_LENGTH: usize = 4000;

/// Decimal places allowed on a book price.
pub const PRICE_DECIMALS: u32 = 2;

/// Highest price the `NUMERIC(12, 2)` price column holds.
pub const MAX_PRICE: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2); // 9_999_999_999.99

/// A book in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    pub isbn: Isbn,
    pub title: String,
    pub author: String,
    pub category: String,
    pub pages: i32,
    pub price: Decimal,
    pub description: String,
    /// Public path of the cover image, e.g. `images/9780306406157.jpg`.
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub store_id: StoreId,
}

/// Rejected seller input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookValidationError {
    #[error("invalid ISBN: {0}")]
    Isbn(#[from] IsbnError),

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("page count must be positive, got {0}")]
    InvalidPages(i32),

    #[error("price must not be negative")]
    NegativePrice,

    #[error("price must have at most 2 decimal places")]
    PricePrecision,

    #[error("price must be at most {}", MAX_PRICE)]
    PriceTooHigh,

    #[error("a cover image is required")]
    MissingImage,
}

/// The editable attributes of a book.
///
/// ISBN, image, store and creation time are fixed once the book exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDetails {
    pub title: String,
    pub author: String,
    pub category: String,
    pub pages: i32,
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
}

impl BookDetails {
    /// Trim text fields and check every attribute.
    ///
    /// # Errors
    ///
    /// Returns the first rule the input breaks.
    pub fn validate(self) -> Result<Self, BookValidationError> {
        let title = required_text("title", &self.title, MAX_NAME_LENGTH)?;
        let author = required_text("author", &self.author, MAX_NAME_LENGTH)?;
        let category = required_text("category", &self.category, MAX_CATEGORY_LENGTH)?;

        let description = self.description.trim().to_owned();
        if description.chars().count() > MAX_DESCRIPTION_LENGTH {
            return Err(BookValidationError::TooLong {
                field: "description",
                max: MAX_DESCRIPTION_LENGTH,
            });
        }

        if self.pages <= 0 {
            return Err(BookValidationError::InvalidPages(self.pages));
        }
        if self.price.is_sign_negative() && !self.price.is_zero() {
            return Err(BookValidationError::NegativePrice);
        }
        if self.price.normalize().scale() > PRICE_DECIMALS {
            return Err(BookValidationError::PricePrecision);
        }
        if self.price > MAX_PRICE {
            return Err(BookValidationError::PriceTooHigh);
        }

        Ok(Self {
            title,
            author,
            category,
            pages: self.pages,
            price: self.price,
            description,
        })
    }
}

fn required_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<String, BookValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BookValidationError::EmptyField(field));
    }
    if trimmed.chars().count() > max {
        return Err(BookValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_owned())
}

/// A seller's request to list a new book, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDraft {
    pub isbn: String,
    #[serde(flatten)]
    pub details: BookDetails,
}

impl BookDraft {
    /// Normalize the ISBN and validate the details.
    ///
    /// # Errors
    ///
    /// Returns [`BookValidationError`] if the ISBN or any detail is invalid.
    pub fn validate(self) -> Result<(Isbn, BookDetails), BookValidationError> {
        let isbn = Isbn::parse(&self.isbn)?;
        let details = self.details.validate()?;
        Ok((isbn, details))
    }
}

/// A fully validated book ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub isbn: Isbn,
    pub details: BookDetails,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub store_id: StoreId,
}

impl NewBook {
    /// The row this insert produces.
    #[must_use]
    pub fn into_book(self) -> Book {
        Book {
            isbn: self.isbn,
            title: self.details.title,
            author: self.details.author,
            category: self.details.category,
            pages: self.details.pages,
            price: self.details.price,
            description: self.details.description,
            image_url: self.image_url,
            created_at: self.created_at,
            store_id: self.store_id,
        }
    }
}
