//! Order history route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use bookstore_core::OrderId;

use crate::error::AppError;
use crate::middleware::RequireCustomer;
use crate::models::{Order, OrderWithDetails};
use crate::state::AppState;

/// The customer's orders, newest first.
///
/// # Errors
///
/// Returns 500 if storage fails.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn index(
    RequireCustomer(user): RequireCustomer,
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = state.orders().list_orders(user.id).await?;
    Ok(Json(orders))
}

/// One of the customer's orders with its lines. Someone else's order is
/// reported as missing.
///
/// # Errors
///
/// Returns 404 if the customer has no such order.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn show(
    RequireCustomer(user): RequireCustomer,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<OrderWithDetails>, AppError> {
    let order = state
        .orders()
        .order_details(user.id, OrderId::new(id))
        .await?;
    Ok(Json(order))
}
