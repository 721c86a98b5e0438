//! Public catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use bookstore_core::{Page, PageRequest};

use super::isbn_param;
use crate::error::AppError;
use crate::models::Book;
use crate::state::AppState;

/// `?page=&q=` on catalog listings. Pages are zero-based.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogQuery {
    #[serde(default)]
    pub page: u32,
    pub q: Option<String>,
}

impl CatalogQuery {
    pub(crate) const fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page)
    }
}

/// One page of the catalog, optionally filtered by title, author or category.
///
/// # Errors
///
/// Returns 500 if storage fails.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Page<Book>>, AppError> {
    let page = state
        .catalog()
        .list_catalog(query.page_request(), query.q.as_deref())
        .await?;
    Ok(Json(page))
}

/// A single book.
///
/// # Errors
///
/// Returns 404 if no book has this ISBN.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> Result<Json<Book>, AppError> {
    let isbn = isbn_param(&isbn)?;
    let book = state.catalog().book_details(&isbn).await?;
    Ok(Json(book))
}
