//! HTTP route handlers for the bookstore.
//!
//! All bodies are JSON except the multipart book upload.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (storage ping)
//!
//! # Auth
//! POST /auth/login             - Login, stores the user in the session
//! POST /auth/logout            - Logout
//!
//! # Catalog (public)
//! GET  /books?page=&q=         - Paged catalog, optional search
//! GET  /books/{isbn}           - Book details
//!
//! # Customer
//! GET  /cart                   - Cart summary
//! POST /cart/{isbn}            - Add one copy
//! POST /checkout               - Place an order from the cart
//! GET  /orders                 - Order history
//! GET  /orders/{id}            - Order with details
//!
//! # Seller
//! GET    /seller/books?page=&q= - Store catalog, title search
//! POST   /seller/books          - Create (multipart: fields + image)
//! GET    /seller/books/{isbn}   - One of the store's books
//! PUT    /seller/books/{isbn}   - Edit (JSON)
//! DELETE /seller/books/{isbn}   - Delete
//!
//! GET  /images/*               - Cover images
//! ```

pub mod auth;
pub mod books;
pub mod cart;
pub mod checkout;
pub mod health;
pub mod orders;
pub mod seller;

use axum::{
    Router,
    extract::{DefaultBodyLimit, Request},
    middleware,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::SessionStore;

use bookstore_core::Isbn;

use crate::error::AppError;
use crate::middleware::{create_session_layer, request_id_middleware};
use crate::state::AppState;

/// URL prefix cover images are served under.
pub const IMAGE_PREFIX: &str = "/images";

/// Upper bound on a book upload request, image included.
const UPLOAD_LIMIT_BYTES: usize = 5 * 1024 * 1024;

/// Parse an ISBN path segment. A malformed ISBN names no book.
pub(crate) fn isbn_param(raw: &str) -> Result<Isbn, AppError> {
    Isbn::parse(raw).map_err(|_| AppError::NotFound("book not found".to_owned()))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the public catalog routes router.
pub fn book_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(books::index))
        .route("/{isbn}", get(books::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/{isbn}", post(cart::add))
}

/// Create the order history routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index))
        .route("/{id}", get(orders::show))
}

/// Create the seller routes router.
pub fn seller_routes() -> Router<AppState> {
    Router::new()
        .route("/books", get(seller::index).post(seller::create))
        .route(
            "/books/{isbn}",
            get(seller::show).put(seller::update).delete(seller::destroy),
        )
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES))
}

/// Create all routes for the bookstore.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/auth", auth_routes())
        .nest("/books", book_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", post(checkout::checkout))
        .nest("/orders", order_routes())
        .nest("/seller", seller_routes())
}

/// Build the complete application: routes, static images, sessions,
/// request IDs, tracing and Sentry.
pub fn app<S>(state: AppState, session_store: S) -> Router
where
    S: SessionStore + Clone,
{
    let session_layer = create_session_layer(session_store, state.config());
    let images = ServeDir::new(&state.config().image_dir);

    Router::new()
        .merge(routes())
        .nest_service(IMAGE_PREFIX, images)
        .layer(session_layer)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
