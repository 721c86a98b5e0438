//! Cart route handlers. Customers only.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use super::isbn_param;
use crate::error::AppError;
use crate::middleware::RequireCustomer;
use crate::models::{CartLine, CartSummary};
use crate::state::AppState;

/// The customer's cart with current prices and subtotal.
///
/// # Errors
///
/// Returns 500 if storage fails.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    RequireCustomer(user): RequireCustomer,
    State(state): State<AppState>,
) -> Result<Json<CartSummary>, AppError> {
    let summary = state.cart().view_cart(user.id).await?;
    Ok(Json(summary))
}

/// Add one copy of a book. Adding a book already in the cart bumps its
/// quantity.
///
/// # Errors
///
/// Returns 404 if the book does not exist.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn add(
    RequireCustomer(user): RequireCustomer,
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> Result<Json<CartLine>, AppError> {
    let isbn = isbn_param(&isbn)?;
    let line = state.cart().add_to_cart(user.id, &isbn).await?;
    Ok(Json(line))
}
