//! Rows for the `PostgreSQL` adapter tests.

#![allow(clippy::unwrap_used)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;

use bookstore_core::{Email, Isbn, Role, StoreId};

use super::PgStorage;
use crate::db::{CatalogRepository, StoreRepository, UserRepository};
use crate::models::{Book, BookDetails, CurrentUser, NewBook};

/// A fixed point in time plus `minutes`, so ordering tests are exact.
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap() + Duration::minutes(minutes)
}

pub async fn user(storage: &PgStorage, email: &str, role: Role) -> CurrentUser {
    storage
        .create_user(&Email::parse(email).unwrap(), role, "unusable")
        .await
        .unwrap()
        .into()
}

/// A seller with an open store.
pub async fn store(storage: &PgStorage, email: &str) -> StoreId {
    let seller = user(storage, email, Role::Seller).await;
    storage.create_store(seller.id, "Shelf").await.unwrap().id
}

pub async fn book(
    storage: &PgStorage,
    store_id: StoreId,
    isbn: &str,
    title: &str,
    price: Decimal,
    created_at: DateTime<Utc>,
) -> Book {
    storage
        .insert_book(NewBook {
            isbn: Isbn::parse(isbn).unwrap(),
            details: BookDetails {
                title: title.to_owned(),
                author: "Anonymous".to_owned(),
                category: "General".to_owned(),
                pages: 100,
                price,
                description: String::new(),
            },
            image_url: format!("images/{isbn}.png"),
            created_at,
            store_id,
        })
        .await
        .unwrap()
}

/// ISBNs of `books`, in order.
pub fn isbns(books: &[Book]) -> Vec<String> {
    books.iter().map(|b| b.isbn.to_string()).collect()
}
