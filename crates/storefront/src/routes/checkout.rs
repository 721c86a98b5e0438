//! Checkout route handler.

use axum::{Json, extract::State, http::StatusCode};
use tracing::instrument;

use crate::error::AppError;
use crate::middleware::RequireCustomer;
use crate::models::Receipt;
use crate::state::AppState;

/// Turn the customer's cart into an order.
///
/// # Errors
///
/// Returns 422 for an empty cart and 503 if the transaction was rolled back.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn checkout(
    RequireCustomer(user): RequireCustomer,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Receipt>), AppError> {
    let receipt = state.checkout().checkout(&user).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
