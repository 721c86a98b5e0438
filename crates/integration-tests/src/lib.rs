//! Integration tests for the bookstore.
//!
//! Tests run the real services and router in-process over the in-memory
//! storage adapter, so no database or server is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bookstore-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `catalog` - Paging and search
//! - `checkout` - Cart, checkout atomicity, confirmation
//! - `seller` - Store-scoped book management
//! - `http` - Status codes, sessions and JSON bodies through the router

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use bookstore_core::{Email, Isbn, Role, StoreId};
use bookstore_storefront::config::StorefrontConfig;
use bookstore_storefront::db::{MemoryStorage, StoreRepository, UserRepository};
use bookstore_storefront::models::{Book, CurrentUser};
use bookstore_storefront::routes;
use bookstore_storefront::services::auth::AuthService;
use bookstore_storefront::services::images::MemoryImageStore;
use bookstore_storefront::services::notifier::{OrderNotifier, RecordingNotifier};
use bookstore_storefront::state::AppState;

/// Password given to accounts created with [`TestContext::register`].
pub const PASSWORD: &str = "correct horse battery";

/// Everything a test needs: in-memory storage, collaborator doubles and the
/// application state wired over them.
pub struct TestContext {
    pub storage: Arc<MemoryStorage>,
    pub notifier: RecordingNotifier,
    pub images: MemoryImageStore,
    pub state: AppState,
}

impl TestContext {
    /// A context whose confirmations land in [`TestContext::notifier`].
    #[must_use]
    pub fn new() -> Self {
        let notifier = RecordingNotifier::new();
        Self::with_notifier(notifier.clone(), Arc::new(notifier))
    }

    /// A context sending confirmations through `sender`.
    #[must_use]
    pub fn with_notifier(notifier: RecordingNotifier, sender: Arc<dyn OrderNotifier>) -> Self {
        let storage = Arc::new(MemoryStorage::new());
        let images = MemoryImageStore::new();
        let state = AppState::new(
            StorefrontConfig::for_testing(),
            storage.clone(),
            sender,
            Arc::new(images.clone()),
        );
        Self {
            storage,
            notifier,
            images,
            state,
        }
    }

    /// The full router with an in-memory session store.
    #[must_use]
    pub fn app(&self) -> Router {
        routes::app(self.state.clone(), MemoryStore::default())
    }

    /// Create an account without hashing a real password. Cannot log in.
    pub async fn user(&self, email: &str, role: Role) -> CurrentUser {
        self.storage
            .create_user(&Email::parse(email).unwrap(), role, "unusable")
            .await
            .unwrap()
            .into()
    }

    /// Create an account that can log in with [`PASSWORD`].
    pub async fn register(&self, email: &str, role: Role) -> CurrentUser {
        AuthService::new(self.storage.as_ref())
            .register(email, role, PASSWORD)
            .await
            .unwrap()
            .into()
    }

    /// Open a store for `seller`.
    pub async fn store(&self, seller: &CurrentUser, name: &str) -> StoreId {
        self.storage.create_store(seller.id, name).await.unwrap().id
    }

    /// Put a book straight into storage.
    pub async fn book(&self, store: StoreId, isbn: &str, title: &str, price: &str) -> Book {
        let book = BookBuilder::new(store, isbn, title).price(price).build();
        self.storage.put_book(book.clone()).await;
        book
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds catalog rows for tests.
pub struct BookBuilder {
    book: Book,
}

impl BookBuilder {
    #[must_use]
    pub fn new(store: StoreId, isbn: &str, title: &str) -> Self {
        Self {
            book: Book {
                isbn: Isbn::parse(isbn).unwrap(),
                title: title.to_owned(),
                author: "Anonymous".to_owned(),
                category: "General".to_owned(),
                pages: 100,
                price: Decimal::new(1000, 2),
                description: String::new(),
                image_url: format!("images/{isbn}.jpg"),
                created_at: at(0),
                store_id: store,
            },
        }
    }

    #[must_use]
    pub fn author(mut self, author: &str) -> Self {
        author.clone_into(&mut self.book.author);
        self
    }

    #[must_use]
    pub fn category(mut self, category: &str) -> Self {
        category.clone_into(&mut self.book.category);
        self
    }

    #[must_use]
    pub fn price(mut self, price: &str) -> Self {
        self.book.price = price.parse().unwrap();
        self
    }

    #[must_use]
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.book.created_at = created_at;
        self
    }

    #[must_use]
    pub fn build(self) -> Book {
        self.book
    }
}

/// A fixed instant `minutes` after 2025-01-01T00:00Z.
#[must_use]
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
}

/// A valid ISBN-13 shaped string for the `n`th generated book. No checksum
/// is enforced, only shape.
#[must_use]
pub fn isbn13(n: u32) -> String {
    format!("978{n:010}")
}

/// Send a request through `app`.
pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

/// Read a response body as JSON.
pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// The `name=value` part of the session cookie set on `response`.
#[must_use]
pub fn session_cookie(response: &Response<Body>) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_owned()
}

/// Log in over HTTP and return the session cookie.
pub async fn login(app: &Router, email: &str) -> String {
    let request = Request::post("/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({ "email": email, "password": PASSWORD }).to_string(),
        ))
        .unwrap();
    let response = send(app, request).await;
    assert!(response.status().is_success(), "login failed: {}", response.status());
    session_cookie(&response)
}
